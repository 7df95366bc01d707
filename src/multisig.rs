//! Weighted account permissions and multi-signature flows.
//!
//! An account may authorize transactions through several permissions:
//! the owner permission (id `0`), the witness permission (id `1`) and active
//! permissions (id `2` and up). Each lists keys with weights and a threshold.
//! The node decides whether the accumulated weight is enough; the local check
//! only avoids signing attempts that are certain to be rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::{Address, AddressConvertible};
use crate::keys::{sign_hash, PrivateKey};
use crate::network::{NodeRequest, RequestKind};
use crate::transactions::{SigningError, Transaction};

/// Permission role.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    /// Full control over the account.
    #[default]
    Owner,
    /// Block production (super representatives only).
    Witness,
    /// Restricted set of operations.
    Active,
}

/// A key allowed to sign under a permission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionKey {
    /// Signer address.
    pub address: Address,
    /// Weight added when this key signs.
    pub weight: u64,
}

/// Account permission, in the shape returned by `wallet/getaccount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Role of the permission.
    #[serde(rename = "type", default)]
    pub kind: PermissionKind,
    /// `0` for owner, `1` for witness, `2..` for active permissions.
    #[serde(default)]
    pub id: u32,
    /// Human-readable label chosen by the account holder.
    #[serde(default)]
    pub permission_name: String,
    /// Weight required to authorize a transaction.
    pub threshold: u64,
    /// Keys allowed to sign.
    pub keys: Vec<PermissionKey>,
    /// Hex bitmask of allowed contract types (active permissions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<String>,
}

impl Permission {
    pub fn from_account(account: &Value, id: u32) -> Option<Self> {
        //! Pick permission `id` from an account JSON object.
        let raw = match id {
            0 => account.get("owner_permission")?.clone(),
            1 => account.get("witness_permission")?.clone(),
            _ => account
                .get("active_permission")?
                .as_array()?
                .iter()
                .find(|p| p.get("id").and_then(Value::as_u64) == Some(u64::from(id)))?
                .clone(),
        };
        let mut permission: Self = serde_json::from_value(raw).ok()?;
        // Owner permission objects usually omit their id and type.
        permission.id = id;
        if id == 1 {
            permission.kind = PermissionKind::Witness;
        }
        Some(permission)
    }

    pub fn weight_of(&self, address: &Address) -> Option<u64> {
        //! Weight of `address`, if it is listed.
        self.keys
            .iter()
            .find(|k| &k.address == address)
            .map(|k| k.weight)
    }
}

/// Local view of how far a transaction is from its permission threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignWeight {
    /// Weight the permission requires.
    pub threshold: u64,
    /// Sum of weights of the approved signers.
    pub current_weight: u64,
    /// Weight the signer would add.
    pub signer_weight: u64,
    /// Addresses that already signed, in signing order.
    pub approved: Vec<Address>,
    /// Whether the signer is in `approved`.
    pub already_signed: bool,
}

impl SignWeight {
    pub fn is_satisfied(&self) -> bool {
        //! Does the current weight reach the threshold?
        self.current_weight >= self.threshold
    }

    pub fn weight_after_signing(&self) -> u64 {
        //! Accumulated weight once the signer has signed. Saturates at
        //! [`u64::MAX`].
        if self.already_signed {
            self.current_weight
        } else {
            self.current_weight.saturating_add(self.signer_weight)
        }
    }
}

pub fn sign_weight_from_approved(
    permission: &Permission,
    signer: &Address,
    approved: Vec<Address>,
) -> Result<SignWeight, SigningError> {
    //! Resolve weights against an explicit approved list, e.g. the
    //! `approved_list` of a `wallet/getsignweight` response.
    //!
    //! Weights come straight from account data, so sums saturate instead of
    //! overflowing.
    let signer_weight = permission.weight_of(signer).ok_or_else(|| {
        SigningError::PermissionDenied(format!(
            "{signer} is not a key of permission {} ({:?})",
            permission.id, permission.permission_name
        ))
    })?;
    let mut counted: Vec<&Address> = vec![];
    let mut current_weight = 0u64;
    for address in &approved {
        if counted.contains(&address) {
            continue;
        }
        counted.push(address);
        let weight = permission.weight_of(address).unwrap_or(0);
        current_weight = current_weight.saturating_add(weight);
    }
    let weight = SignWeight {
        threshold: permission.threshold,
        current_weight,
        signer_weight,
        already_signed: approved.contains(signer),
        approved,
    };
    tracing::debug!(
        permission = permission.id,
        threshold = weight.threshold,
        current = weight.current_weight,
        signer = weight.signer_weight,
        "resolved sign weight"
    );
    Ok(weight)
}

pub fn resolve_sign_weight(
    transaction: &Transaction,
    permission: &Permission,
    signer: &Address,
) -> Result<SignWeight, SigningError> {
    //! Resolve weights, recovering approved signers from the signatures
    //! already attached to `transaction`.
    if transaction.permission_id() != permission.id {
        return Err(SigningError::PermissionDenied(format!(
            "transaction requires permission {}, got permission {}",
            transaction.permission_id(),
            permission.id
        )));
    }
    sign_weight_from_approved(permission, signer, transaction.signers()?)
}

pub fn multi_sign(
    transaction: Transaction,
    private_key: &PrivateKey,
    permission: &Permission,
) -> Result<Transaction, SigningError> {
    //! Add a signature under a (possibly multi-key) permission.
    //!
    //! Fails with [`SigningError::PermissionDenied`] if the key is not listed
    //! or the permission id differs from the transaction's, and with
    //! [`SigningError::AlreadySigned`] if this key has already signed.
    let signer = private_key.address();
    let weight = resolve_sign_weight(&transaction, permission, &signer)?;
    if weight.already_signed {
        return Err(SigningError::AlreadySigned(signer.to_base58()));
    }
    let signature = sign_hash(transaction.id(), private_key);
    Ok(transaction.with_signature(signature))
}

pub fn sign_weight_request(transaction: &Transaction) -> NodeRequest {
    //! Ask the node for its view of the accumulated weight.
    let mut request = transaction.clone().into_broadcast_request();
    request.path = "wallet/getsignweight".to_string();
    request.kind = RequestKind::Read;
    request
}

pub fn approved_list_from_response(response: &Value) -> Vec<Address> {
    //! Read `approved_list` from a `wallet/getsignweight` response.
    //! Entries that are not valid addresses are skipped.
    response
        .get("approved_list")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .filter_map(|a| a.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}
