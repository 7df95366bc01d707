//! Smart contract ABI support.
//!
//! TRON virtual machine is EVM-compatible, so contract arguments and return
//! values use the Ethereum ABI layout: every parameter owns a 32-byte head
//! slot; static values live in the head directly, dynamic values
//! (`bytes`, `string`, `T[]` and anything containing them) store an offset
//! in the head and their payload in the tail.
//!
//! ```rust
//! use tron_devkit::abi::{decode_parameters, encode_parameters, AbiType, AbiValue};
//! use tron_devkit::U256;
//!
//! let types: Vec<AbiType> = vec!["uint256".parse().unwrap(), "string".parse().unwrap()];
//! let values = vec![AbiValue::Uint(U256::from(7)), AbiValue::String("TRON".into())];
//! let encoded = encode_parameters(&types, &values).unwrap();
//! assert_eq!(encoded.len(), 4 * 32);
//! assert_eq!(decode_parameters(&types, &encoded).unwrap(), values);
//! ```
//!
//! One notable difference from Ethereum tooling: TRON nodes expect the
//! *textual* function signature (`transfer(address,uint256)`) in contract
//! call requests and compute the selector themselves. See
//! [`FunctionDescriptor::signature`].

mod codec;
mod interface;
mod types;
mod value;

pub use codec::{decode_parameters, decode_revert_reason, encode_parameters};
pub use interface::{
    ConstructorDescriptor, ContractAbi, EventDescriptor, EventParam, FunctionDescriptor, Param,
    StateMutability,
};
pub use types::AbiType;
pub use value::AbiValue;

/// Size of a single ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// ABI encoding, decoding and interface errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AbiError {
    /// Type name is not known or malformed.
    #[error("unsupported ABI type: {0:?}")]
    UnsupportedAbiType(String),
    /// Wrong number of values for the declared types.
    #[error("{context}: expected {expected} values, got {got}")]
    ArityMismatch {
        /// What was being encoded (function name, tuple type, ...).
        context: String,
        /// Declared count.
        expected: usize,
        /// Supplied count.
        got: usize,
    },
    /// Function is absent from the interface.
    #[error("function {0:?} not found in contract interface")]
    UnknownFunction(String),
    /// Value cannot be represented as the declared type.
    #[error("value {value} does not match type {ty}")]
    ValueMismatch {
        /// Declared type.
        ty: String,
        /// Offending value.
        value: String,
    },
    /// Encoded bytes are truncated or malformed.
    #[error("invalid ABI data: {0}")]
    InvalidData(String),
    /// JSON interface cannot be interpreted.
    #[error("invalid contract interface: {0}")]
    InvalidInterface(String),
}

impl AbiError {
    pub(crate) fn mismatch(ty: &AbiType, value: impl std::fmt::Debug) -> Self {
        Self::ValueMismatch {
            ty: ty.to_string(),
            value: format!("{value:?}"),
        }
    }
}
