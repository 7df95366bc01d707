//! Crate-wide error type.

use crate::abi::AbiError;
use crate::address::AddressValidationError;
use crate::contract::ContractError;
use crate::hdnode::HDNodeError;
use crate::keys::KeyError;
use crate::numeric::NumberParseError;
use crate::transaction_builder::TransactionBuilderError;
use crate::transactions::{SigningError, TransactionError};

/// Any error produced by this crate.
///
/// Module functions return their own error types; this enum lets callers
/// combine them with `?`.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Key parsing or signature failure.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Malformed address.
    #[error(transparent)]
    Address(#[from] AddressValidationError),
    /// Mnemonic or derivation failure.
    #[error(transparent)]
    HDNode(#[from] HDNodeError),
    /// ABI encoding, decoding or lookup failure.
    #[error(transparent)]
    Abi(#[from] AbiError),
    /// Rejected transaction request.
    #[error(transparent)]
    Builder(#[from] TransactionBuilderError),
    /// Signing refused.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// Unusable node transaction.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    /// Contract call failure.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// Malformed number.
    #[error(transparent)]
    Number(#[from] NumberParseError),
}

/// Result alias over [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
