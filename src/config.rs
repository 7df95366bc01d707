//! Protocol parameters enforced during transaction building.

use serde::{Deserialize, Serialize};

/// Limits applied by [`TransactionBuilder`](crate::transaction_builder::TransactionBuilder).
///
/// Networks occasionally change these through governance proposals, so they
/// are data rather than constants. [`Default`] matches TRON mainnet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Maximal fee limit of a contract call or deployment, in sun.
    pub fee_limit_max: u64,
    /// Fee limit used when the caller does not provide one, in sun.
    pub default_fee_limit: u64,
    /// Minimal legacy (V1) freeze duration, in days.
    pub min_freeze_duration_days: u32,
    /// Maximal energy a contract owner may pay for callers.
    pub origin_energy_limit_max: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            fee_limit_max: 1_000_000_000,
            default_fee_limit: 150_000_000,
            min_freeze_duration_days: 3,
            origin_energy_limit_max: 10_000_000,
        }
    }
}

impl ProtocolConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        //! Load from JSON. Missing fields take their default values.
        serde_json::from_str(text)
    }
}
