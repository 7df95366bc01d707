//! TRON transactions support.
//!
//! Unsigned transactions are assembled by a node (see
//! [`TransactionBuilder`](crate::transaction_builder::TransactionBuilder)) and
//! returned as JSON together with their protobuf serialization
//! (`raw_data_hex`). The transaction id is the SHA-256 of those bytes, and
//! signing means signing that id. The raw bytes are therefore kept exactly as
//! the node produced them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::{Address, AddressConvertible};
use crate::keys::{recover_public_key, sign_hash, KeyError, PrivateKey, Signature};
use crate::network::{node_error, NodeRequest, RequestKind};
use crate::utils::{encode_hex, keccak, sha256, unhex};

/// Prefix of signed personal messages.
pub const TRON_MESSAGE_PREFIX: &str = "\x19TRON Signed Message:\n";

/// Failures to interpret a node-built transaction.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransactionError {
    /// Required fields are missing or have wrong shape.
    #[error("malformed transaction: {0}")]
    Malformed(String),
    /// `txID` is not the SHA-256 of `raw_data_hex`.
    #[error("transaction id mismatch: declared {declared}, computed {computed}")]
    IdMismatch {
        /// Id sent by the node.
        declared: String,
        /// Hash of the raw bytes.
        computed: String,
    },
    /// The node rejected the request.
    #[error("node error: {0}")]
    NodeError(String),
}

/// Signing failures.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SigningError {
    /// Transaction already carries a signature (by the given signer).
    #[error("transaction is already signed by {0}")]
    AlreadySigned(String),
    /// Signer is not allowed to sign with the permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Private key does not belong to the transaction owner.
    #[error("private key of {signer} does not match transaction owner {owner}")]
    OwnerMismatch {
        /// `owner_address` of the transaction.
        owner: String,
        /// Address of the private key.
        signer: String,
    },
    /// Key or signature failure.
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Represents a single TRON transaction.
#[serde_with::serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "txID")]
    #[serde_as(as = "unhex::Hex")]
    tx_id: [u8; 32],
    raw_data: Value,
    #[serde_as(as = "unhex::Hex")]
    raw_data_hex: Bytes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    signature: Vec<Signature>,
    #[serde(default)]
    visible: bool,
}

impl Transaction {
    pub fn from_node_response(response: Value) -> Result<Self, TransactionError> {
        //! Parse a transaction returned by a node.
        //!
        //! Accepts a bare transaction object as well as the
        //! `{"result": ..., "transaction": ...}` wrapper of contract
        //! endpoints. Node errors are reported as
        //! [`TransactionError::NodeError`]. The id is checked against the
        //! raw bytes.
        if let Some(error) = node_error(&response) {
            return Err(TransactionError::NodeError(error));
        }
        let body = match response {
            Value::Object(mut map) if map.contains_key("transaction") => {
                map.remove("transaction").unwrap_or(Value::Null)
            }
            other => other,
        };
        let transaction: Self = serde_json::from_value(body)
            .map_err(|e| TransactionError::Malformed(e.to_string()))?;
        transaction.check_id()?;
        tracing::debug!(tx_id = %transaction.id_hex(), "parsed transaction");
        Ok(transaction)
    }

    pub fn from_json_str(text: &str) -> Result<Self, TransactionError> {
        //! Parse a transaction from JSON text.
        let value: Value =
            serde_json::from_str(text).map_err(|e| TransactionError::Malformed(e.to_string()))?;
        Self::from_node_response(value)
    }

    fn check_id(&self) -> Result<(), TransactionError> {
        let computed = sha256(&self.raw_data_hex);
        if computed != self.tx_id {
            return Err(TransactionError::IdMismatch {
                declared: encode_hex(self.tx_id),
                computed: encode_hex(computed),
            });
        }
        Ok(())
    }

    pub const fn id(&self) -> [u8; 32] {
        //! Transaction identifier: SHA-256 of the raw data bytes.
        self.tx_id
    }

    pub fn id_hex(&self) -> String {
        //! Transaction id as the node prints it in `txID`.
        encode_hex(self.tx_id)
    }

    pub const fn raw_data(&self) -> &Value {
        //! Decoded `raw_data` object, as returned by the node.
        &self.raw_data
    }

    pub fn raw_data_hex(&self) -> &[u8] {
        //! Serialized raw data: the bytes the id is computed from.
        &self.raw_data_hex
    }

    pub fn signatures(&self) -> &[Signature] {
        //! Attached signatures, in signing order.
        &self.signature
    }

    pub fn is_signed(&self) -> bool {
        //! Is at least one signature attached?
        !self.signature.is_empty()
    }

    pub const fn visible(&self) -> bool {
        //! Whether addresses in `raw_data` are in Base58Check form.
        self.visible
    }

    fn first_contract(&self) -> Option<&Value> {
        self.raw_data.get("contract")?.get(0)
    }

    pub fn owner_address(&self) -> Option<Address> {
        //! `owner_address` of the first contract, if present and valid.
        self.first_contract()?
            .pointer("/parameter/value/owner_address")?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn contract_type(&self) -> Option<&str> {
        //! Contract type name, like `TransferContract`.
        self.first_contract()?.get("type")?.as_str()
    }

    pub fn permission_id(&self) -> u32 {
        //! Permission the transaction is signed under; `0` is the owner.
        self.first_contract()
            .and_then(|c| c.get("Permission_id"))
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(0)
    }

    pub fn expiration(&self) -> Option<u64> {
        //! Expiration timestamp in milliseconds.
        self.raw_data.get("expiration")?.as_u64()
    }

    pub fn sign(self, private_key: &PrivateKey) -> Result<Self, SigningError> {
        //! Sign as the owner. Consumes the unsigned transaction.
        //!
        //! Fails with [`SigningError::AlreadySigned`] if any signature is
        //! present (use [`multi_sign`](crate::multisig::multi_sign) for
        //! additional signatures) and with [`SigningError::OwnerMismatch`]
        //! if the key does not belong to the owner address. The owner check is
        //! skipped for transactions signed under a non-owner permission.
        if let Some(first) = self.signature.first() {
            let signer = self.recover_signer(first)?;
            return Err(SigningError::AlreadySigned(signer.to_base58()));
        }
        let signer = private_key.address();
        if let Some(owner) = self.owner_address().filter(|_| self.permission_id() == 0) {
            if owner != signer {
                return Err(SigningError::OwnerMismatch {
                    owner: owner.to_base58(),
                    signer: signer.to_base58(),
                });
            }
        }
        let signature = sign_hash(self.tx_id, private_key);
        Ok(self.with_signature(signature))
    }

    pub(crate) fn with_signature(mut self, signature: Signature) -> Self {
        self.signature.push(signature);
        tracing::debug!(
            tx_id = %self.id_hex(),
            signatures = self.signature.len(),
            "signature attached"
        );
        self
    }

    fn recover_signer(&self, signature: &Signature) -> Result<Address, KeyError> {
        recover_public_key(self.tx_id, signature).map(|key| key.address())
    }

    pub fn signers(&self) -> Result<Vec<Address>, KeyError> {
        //! Recover addresses of all signers, in signing order.
        self.signature
            .iter()
            .map(|s| self.recover_signer(s))
            .collect()
    }

    pub fn into_broadcast_request(self) -> NodeRequest {
        //! Request publishing the signed transaction.
        let Self {
            tx_id,
            raw_data,
            raw_data_hex,
            signature,
            visible,
        } = self;
        NodeRequest::new("wallet/broadcasttransaction", RequestKind::Write)
            .field("txID", encode_hex(tx_id))
            .field("raw_data", raw_data)
            .field("raw_data_hex", encode_hex(raw_data_hex))
            .field(
                "signature",
                signature.iter().map(Signature::to_hex).collect::<Vec<_>>(),
            )
            .field("visible", visible)
    }
}

pub fn hash_message(message: &[u8]) -> [u8; 32] {
    //! Keccak-256 of `"\x19TRON Signed Message:\n" + len(message) + message`.
    let mut data = format!("{TRON_MESSAGE_PREFIX}{}", message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak(data)
}

pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    //! Sign a personal message.
    sign_hash(hash_message(message), private_key)
}

pub fn recover_message_signer(message: &[u8], signature: &Signature) -> Result<Address, KeyError> {
    //! Recover the address that signed a personal message.
    recover_public_key(hash_message(message), signature).map(|key| key.address())
}

pub fn verify_message(message: &[u8], signature: &Signature, address: &Address) -> bool {
    //! Check that `address` signed `message`.
    recover_message_signer(message, signature).is_ok_and(|signer| &signer == address)
}
