//! Validated request payloads for transaction-producing node endpoints.
//!
//! TRON nodes assemble unsigned transactions themselves: the client sends
//! the operation parameters to an endpoint like `wallet/createtransaction`
//! and gets back a transaction to sign. [`TransactionBuilder`] validates the
//! parameters and produces the [`NodeRequest`]; the response is then parsed
//! with [`Transaction::from_node_response`](crate::transactions::Transaction::from_node_response).
//!
//! ```rust
//! use tron_devkit::transaction_builder::TransactionBuilder;
//! use tron_devkit::{Address, Amount};
//!
//! let from: Address = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap();
//! let to = Address::from_identifier([7u8; 20]);
//! let request = TransactionBuilder::new()
//!     .send_trx(&to, Amount::from_trx_str("1.5").unwrap(), &from)
//!     .unwrap();
//! assert_eq!(request.path, "wallet/createtransaction");
//! assert_eq!(request.fields["amount"], 1_500_000);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::abi::{AbiError, AbiValue, ContractAbi, FunctionDescriptor};
use crate::address::{Address, AddressValidationError};
use crate::config::ProtocolConfig;
use crate::network::{NodeRequest, RequestKind};
use crate::numeric::Amount;
use crate::utils::encode_hex;

/// Smallest TRC-10 token id.
const MIN_TOKEN_ID: u64 = 1_000_001;
/// Maximal fraction digits of a TRC-10 token.
const MAX_TOKEN_PRECISION: u32 = 6;

/// Transaction creation errors
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransactionBuilderError {
    /// Amount is zero or out of range, or funds would move to their owner.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// Offending amount.
        amount: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Address text could not be parsed.
    #[error(transparent)]
    InvalidAddress(#[from] AddressValidationError),
    /// Fee limit is above the network ceiling.
    #[error("fee limit {fee_limit} exceeds maximum {max}")]
    FeeLimitExceeded {
        /// Requested fee limit, in sun.
        fee_limit: u64,
        /// Configured ceiling, in sun.
        max: u64,
    },
    /// Resource is neither `BANDWIDTH` nor `ENERGY`.
    #[error("invalid resource kind {0:?}, expected BANDWIDTH or ENERGY")]
    InvalidResourceKind(String),
    /// Freeze, lock or sale period is out of range.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    /// Any other parameter is out of range.
    #[error("invalid option {name}: {reason}")]
    InvalidOption {
        /// Parameter name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Attached value does not match constructor payability.
    #[error("payable mismatch: {0}")]
    PayableMismatch(String),
    /// Arguments could not be encoded.
    #[error(transparent)]
    Abi(#[from] AbiError),
}

type Result<T> = std::result::Result<T, TransactionBuilderError>;

fn invalid_option(name: &str, reason: impl Into<String>) -> TransactionBuilderError {
    TransactionBuilderError::InvalidOption {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn invalid_amount(amount: impl fmt::Display, reason: &str) -> TransactionBuilderError {
    TransactionBuilderError::InvalidAmount {
        amount: amount.to_string(),
        reason: reason.to_string(),
    }
}

fn require_positive(amount: Amount) -> Result<u64> {
    if amount.is_zero() {
        return Err(invalid_amount(amount, "must be positive"));
    }
    Ok(amount.sun())
}

fn require_distinct(owner: &Address, other: &Address, what: &str) -> Result<()> {
    if owner == other {
        return Err(invalid_option(what, format!("{other} is the owner address")));
    }
    Ok(())
}

/// Staked resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Pays for transaction size.
    Bandwidth,
    /// Pays for contract execution.
    Energy,
}

impl ResourceKind {
    pub const fn as_str(&self) -> &'static str {
        //! Name used in request bodies.
        match self {
            Self::Bandwidth => "BANDWIDTH",
            Self::Energy => "ENERGY",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = TransactionBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BANDWIDTH" => Ok(Self::Bandwidth),
            "ENERGY" => Ok(Self::Energy),
            _ => Err(TransactionBuilderError::InvalidResourceKind(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a new TRC-10 token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOptions {
    /// Token name.
    pub name: String,
    /// Ticker.
    pub abbreviation: String,
    /// Free-form description.
    pub description: String,
    /// Project URL.
    pub url: String,
    /// Total issued amount, in the smallest token unit.
    pub total_supply: u64,
    /// `trx_ratio` sun buy `token_ratio` token units during the sale.
    pub trx_ratio: u64,
    /// See `trx_ratio`.
    pub token_ratio: u64,
    /// Sale start, unix milliseconds.
    pub sale_start: u64,
    /// Sale end, unix milliseconds.
    pub sale_end: u64,
    /// Bandwidth each holder may spend on token transfers.
    pub free_bandwidth: u64,
    /// Bandwidth all holders together may spend.
    pub free_bandwidth_limit: u64,
    /// Supply frozen for the issuer.
    pub frozen_amount: u64,
    /// Days the frozen supply stays frozen.
    pub frozen_duration: u64,
    /// Fraction digits, `0..=6`.
    pub precision: u32,
}

/// Options of a contract call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Maximal TRX burnt for energy, in sun. Defaults to the configured value.
    pub fee_limit: Option<u64>,
    /// TRX sent with the call.
    pub call_value: Amount,
    /// TRC-10 token sent with the call.
    pub token_id: Option<u64>,
    /// Amount of `token_id` sent with the call.
    pub token_value: Option<u64>,
}

/// Options of a contract deployment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Contract interface as JSON text.
    pub abi: String,
    /// Compiled creation bytecode, without constructor arguments.
    pub bytecode: Vec<u8>,
    /// Contract name shown by explorers.
    pub name: String,
    /// Constructor arguments.
    pub parameters: Vec<AbiValue>,
    /// Maximal TRX burnt for energy, in sun.
    pub fee_limit: Option<u64>,
    /// TRX sent to a payable constructor.
    pub call_value: Amount,
    /// TRC-10 token sent to the constructor.
    pub token_id: Option<u64>,
    /// Amount of `token_id` sent to the constructor.
    pub token_value: Option<u64>,
    /// Share of energy paid by callers, `0..=100`.
    pub user_fee_percentage: u8,
    /// Maximal energy the deployer pays per call.
    pub origin_energy_limit: u64,
}

/// Transaction builder allows to create and validate transaction requests
/// with minimal developers efforts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionBuilder {
    config: ProtocolConfig,
    permission_id: Option<u32>,
}

impl TransactionBuilder {
    #[must_use]
    pub fn new() -> Self {
        //! Create a builder with mainnet limits.
        Self::default()
    }
    #[must_use]
    pub const fn with_config(config: ProtocolConfig) -> Self {
        //! Create a builder with custom limits.
        Self {
            config,
            permission_id: None,
        }
    }
    #[must_use]
    pub const fn permission_id(mut self, permission_id: u32) -> Self {
        //! Sign resulting transactions under a non-owner permission.
        self.permission_id = Some(permission_id);
        self
    }

    pub const fn config(&self) -> &ProtocolConfig {
        //! Limits requests are checked against.
        &self.config
    }

    fn write_request(&self, path: &str, owner: &Address) -> NodeRequest {
        NodeRequest::new(path, RequestKind::Write)
            .field("owner_address", owner.to_hex())
            .optional_field("Permission_id", self.permission_id)
    }

    fn finish(request: NodeRequest) -> Result<NodeRequest> {
        tracing::debug!(path = %request.path, kind = ?request.kind, "built request");
        Ok(request)
    }

    fn fee_limit(&self, requested: Option<u64>) -> Result<u64> {
        let fee_limit = requested.unwrap_or(self.config.default_fee_limit);
        if fee_limit == 0 {
            return Err(invalid_option("fee_limit", "must be positive"));
        }
        if fee_limit > self.config.fee_limit_max {
            return Err(TransactionBuilderError::FeeLimitExceeded {
                fee_limit,
                max: self.config.fee_limit_max,
            });
        }
        Ok(fee_limit)
    }

    fn check_token_call(token_id: Option<u64>, token_value: Option<u64>) -> Result<()> {
        match (token_id, token_value) {
            (None, Some(value)) if value > 0 => {
                Err(invalid_option("token_value", "token value requires a token id"))
            }
            (Some(id), _) if id < MIN_TOKEN_ID => Err(invalid_option(
                "token_id",
                format!("{id} is not a TRC-10 token id"),
            )),
            _ => Ok(()),
        }
    }

    pub fn send_trx(&self, to: &Address, amount: Amount, from: &Address) -> Result<NodeRequest> {
        //! Transfer TRX.
        let sun = require_positive(amount)?;
        if to == from {
            return Err(invalid_amount(amount, "cannot transfer to the sender"));
        }
        Self::finish(
            self.write_request("wallet/createtransaction", from)
                .field("to_address", to.to_hex())
                .field("amount", sun),
        )
    }

    fn check_token_id(token_id: &str) -> Result<()> {
        if token_id.is_empty() || !token_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_option(
                "token_id",
                format!("{token_id:?} is not a TRC-10 token id"),
            ));
        }
        Ok(())
    }

    pub fn send_token(
        &self,
        to: &Address,
        amount: u64,
        token_id: &str,
        from: &Address,
    ) -> Result<NodeRequest> {
        //! Transfer a TRC-10 token.
        if amount == 0 {
            return Err(invalid_amount(amount, "must be positive"));
        }
        if to == from {
            return Err(invalid_amount(amount, "cannot transfer to the sender"));
        }
        Self::check_token_id(token_id)?;
        Self::finish(
            self.write_request("wallet/transferasset", from)
                .field("to_address", to.to_hex())
                .field("asset_name", encode_hex(token_id))
                .field("amount", amount),
        )
    }

    pub fn purchase_token(
        &self,
        issuer: &Address,
        token_id: &str,
        amount: Amount,
        buyer: &Address,
    ) -> Result<NodeRequest> {
        //! Buy a TRC-10 token during its sale, paying `amount` TRX.
        let sun = require_positive(amount)?;
        if issuer == buyer {
            return Err(invalid_amount(amount, "cannot buy from yourself"));
        }
        Self::check_token_id(token_id)?;
        Self::finish(
            self.write_request("wallet/participateassetissue", buyer)
                .field("to_address", issuer.to_hex())
                .field("asset_name", encode_hex(token_id))
                .field("amount", sun),
        )
    }

    pub fn create_token(&self, options: &TokenOptions, issuer: &Address) -> Result<NodeRequest> {
        //! Issue a TRC-10 token.
        for (name, value) in [
            ("name", &options.name),
            ("abbreviation", &options.abbreviation),
            ("url", &options.url),
        ] {
            if value.trim().is_empty() {
                return Err(invalid_option(name, "must not be empty"));
            }
        }
        if options.total_supply == 0 {
            return Err(invalid_amount(options.total_supply, "total supply must be positive"));
        }
        if options.trx_ratio == 0 || options.token_ratio == 0 {
            return Err(invalid_option("ratio", "exchange ratios must be positive"));
        }
        if options.sale_end <= options.sale_start {
            return Err(TransactionBuilderError::InvalidDuration(format!(
                "sale ends at {} before it starts at {}",
                options.sale_end, options.sale_start
            )));
        }
        if options.precision > MAX_TOKEN_PRECISION {
            return Err(invalid_option(
                "precision",
                format!("{} is above {MAX_TOKEN_PRECISION}", options.precision),
            ));
        }
        if options.frozen_amount > options.total_supply {
            return Err(invalid_amount(options.frozen_amount, "frozen supply exceeds total supply"));
        }
        if options.frozen_amount > 0 && options.frozen_duration == 0 {
            return Err(TransactionBuilderError::InvalidDuration(
                "frozen supply needs a positive duration".to_string(),
            ));
        }

        let mut request = self
            .write_request("wallet/createassetissue", issuer)
            .field("name", encode_hex(&options.name))
            .field("abbr", encode_hex(&options.abbreviation))
            .field("description", encode_hex(&options.description))
            .field("url", encode_hex(&options.url))
            .field("total_supply", options.total_supply)
            .field("trx_num", options.trx_ratio)
            .field("num", options.token_ratio)
            .field("start_time", options.sale_start)
            .field("end_time", options.sale_end)
            .field("free_asset_net_limit", options.free_bandwidth)
            .field("public_free_asset_net_limit", options.free_bandwidth_limit)
            .field("precision", options.precision);
        if options.frozen_amount > 0 {
            request = request.field(
                "frozen_supply",
                serde_json::json!({
                    "frozen_amount": options.frozen_amount,
                    "frozen_days": options.frozen_duration,
                }),
            );
        }
        Self::finish(request)
    }

    pub fn freeze_balance(
        &self,
        amount: Amount,
        duration_days: u32,
        resource: ResourceKind,
        owner: &Address,
        receiver: Option<&Address>,
    ) -> Result<NodeRequest> {
        //! Stake TRX for a resource (legacy staking).
        let sun = require_positive(amount)?;
        if duration_days < self.config.min_freeze_duration_days {
            return Err(TransactionBuilderError::InvalidDuration(format!(
                "frozen duration {duration_days} is below minimum of {} days",
                self.config.min_freeze_duration_days
            )));
        }
        Self::finish(
            self.write_request("wallet/freezebalance", owner)
                .field("frozen_balance", sun)
                .field("frozen_duration", duration_days)
                .field("resource", resource.as_str())
                .optional_field(
                    "receiver_address",
                    receiver.filter(|r| *r != owner).map(Address::to_hex),
                ),
        )
    }

    pub fn unfreeze_balance(
        &self,
        resource: ResourceKind,
        owner: &Address,
        receiver: Option<&Address>,
    ) -> Result<NodeRequest> {
        //! Release legacy stake.
        Self::finish(
            self.write_request("wallet/unfreezebalance", owner)
                .field("resource", resource.as_str())
                .optional_field(
                    "receiver_address",
                    receiver.filter(|r| *r != owner).map(Address::to_hex),
                ),
        )
    }

    pub fn freeze_balance_v2(
        &self,
        amount: Amount,
        resource: ResourceKind,
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Stake TRX for a resource.
        let sun = require_positive(amount)?;
        Self::finish(
            self.write_request("wallet/freezebalancev2", owner)
                .field("frozen_balance", sun)
                .field("resource", resource.as_str()),
        )
    }

    pub fn unfreeze_balance_v2(
        &self,
        amount: Amount,
        resource: ResourceKind,
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Start unstaking TRX.
        let sun = require_positive(amount)?;
        Self::finish(
            self.write_request("wallet/unfreezebalancev2", owner)
                .field("unfreeze_balance", sun)
                .field("resource", resource.as_str()),
        )
    }

    pub fn delegate_resource(
        &self,
        amount: Amount,
        receiver: &Address,
        resource: ResourceKind,
        owner: &Address,
        lock: bool,
        lock_period: Option<u64>,
    ) -> Result<NodeRequest> {
        //! Delegate staked resource to another account.
        //!
        //! `lock_period` is measured in blocks and needs `lock`.
        let sun = require_positive(amount)?;
        require_distinct(owner, receiver, "receiver_address")?;
        match lock_period {
            Some(_) if !lock => {
                return Err(TransactionBuilderError::InvalidDuration(
                    "lock period without lock".to_string(),
                ))
            }
            Some(0) => {
                return Err(TransactionBuilderError::InvalidDuration(
                    "lock period must be positive".to_string(),
                ))
            }
            _ => {}
        }
        Self::finish(
            self.write_request("wallet/delegateresource", owner)
                .field("receiver_address", receiver.to_hex())
                .field("balance", sun)
                .field("resource", resource.as_str())
                .field("lock", lock)
                .optional_field("lock_period", lock_period),
        )
    }

    pub fn undelegate_resource(
        &self,
        amount: Amount,
        receiver: &Address,
        resource: ResourceKind,
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Take back a delegated resource.
        let sun = require_positive(amount)?;
        require_distinct(owner, receiver, "receiver_address")?;
        Self::finish(
            self.write_request("wallet/undelegateresource", owner)
                .field("receiver_address", receiver.to_hex())
                .field("balance", sun)
                .field("resource", resource.as_str()),
        )
    }

    pub fn withdraw_expire_unfreeze(&self, owner: &Address) -> Result<NodeRequest> {
        //! Withdraw unstaked TRX whose waiting period has passed.
        Self::finish(self.write_request("wallet/withdrawexpireunfreeze", owner))
    }

    pub fn cancel_unfreeze_balance_v2(&self, owner: &Address) -> Result<NodeRequest> {
        //! Cancel all pending unstakings.
        Self::finish(self.write_request("wallet/cancelallunfreezev2", owner))
    }

    pub fn create_account(&self, account: &Address, payer: &Address) -> Result<NodeRequest> {
        //! Activate a new account, paid by `payer`.
        require_distinct(payer, account, "account_address")?;
        Self::finish(
            self.write_request("wallet/createaccount", payer)
                .field("account_address", account.to_hex()),
        )
    }

    pub fn update_account(&self, name: &str, owner: &Address) -> Result<NodeRequest> {
        //! Set account name.
        if name.trim().is_empty() {
            return Err(invalid_option("account_name", "must not be empty"));
        }
        Self::finish(
            self.write_request("wallet/updateaccount", owner)
                .field("account_name", encode_hex(name)),
        )
    }

    pub fn vote(&self, votes: &[(Address, u64)], voter: &Address) -> Result<NodeRequest> {
        //! Vote for super representatives.
        if votes.is_empty() {
            return Err(invalid_option("votes", "no votes given"));
        }
        let mut entries = Vec::with_capacity(votes.len());
        for (i, (candidate, count)) in votes.iter().enumerate() {
            if *count == 0 {
                return Err(invalid_amount(count, "vote count must be positive"));
            }
            if votes[..i].iter().any(|(seen, _)| seen == candidate) {
                return Err(invalid_option("votes", format!("duplicate vote for {candidate}")));
            }
            entries.push(serde_json::json!({
                "vote_address": candidate.to_hex(),
                "vote_count": count,
            }));
        }
        Self::finish(
            self.write_request("wallet/votewitnessaccount", voter)
                .field("votes", entries),
        )
    }

    pub fn withdraw_block_rewards(&self, owner: &Address) -> Result<NodeRequest> {
        //! Claim voting and block production rewards.
        Self::finish(self.write_request("wallet/withdrawbalance", owner))
    }

    fn encode_call(signature: &str, args: &[AbiValue]) -> Result<(String, String)> {
        let function = FunctionDescriptor::from_signature(signature)?;
        let parameter = function.encode_input(args)?;
        Ok((function.signature(), encode_hex(parameter)))
    }

    pub fn trigger_smart_contract(
        &self,
        contract: &Address,
        signature: &str,
        args: &[AbiValue],
        options: &CallOptions,
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Call a state-changing contract function.
        //!
        //! `signature` is the textual function signature, like
        //! `transfer(address,uint256)`; arguments are encoded against it.
        let fee_limit = self.fee_limit(options.fee_limit)?;
        Self::check_token_call(options.token_id, options.token_value)?;
        let (function_selector, parameter) = Self::encode_call(signature, args)?;
        Self::finish(
            self.write_request("wallet/triggersmartcontract", owner)
                .field("contract_address", contract.to_hex())
                .field("function_selector", function_selector)
                .field("parameter", parameter)
                .field("call_value", options.call_value.sun())
                .field("fee_limit", fee_limit)
                .optional_field("token_id", options.token_id)
                .optional_field("call_token_value", options.token_value),
        )
    }

    pub fn trigger_constant_contract(
        &self,
        contract: &Address,
        signature: &str,
        args: &[AbiValue],
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Execute a contract function locally on the node, without
        //! producing a transaction.
        let (function_selector, parameter) = Self::encode_call(signature, args)?;
        let request = NodeRequest::new("wallet/triggerconstantcontract", RequestKind::Read)
            .field("owner_address", owner.to_hex())
            .field("contract_address", contract.to_hex())
            .field("function_selector", function_selector)
            .field("parameter", parameter);
        Self::finish(request)
    }

    pub fn create_smart_contract(
        &self,
        options: &DeployOptions,
        owner: &Address,
    ) -> Result<NodeRequest> {
        //! Deploy a contract.
        let fee_limit = self.fee_limit(options.fee_limit)?;
        Self::check_token_call(options.token_id, options.token_value)?;
        if options.bytecode.is_empty() {
            return Err(invalid_option("bytecode", "must not be empty"));
        }
        if options.user_fee_percentage > 100 {
            return Err(invalid_option(
                "user_fee_percentage",
                format!("{} is above 100", options.user_fee_percentage),
            ));
        }
        if options.origin_energy_limit == 0
            || options.origin_energy_limit > self.config.origin_energy_limit_max
        {
            return Err(invalid_option(
                "origin_energy_limit",
                format!(
                    "{} is outside 1..={}",
                    options.origin_energy_limit, self.config.origin_energy_limit_max
                ),
            ));
        }

        let abi = ContractAbi::from_json(&options.abi)?;
        let payable = abi.constructor.as_ref().is_some_and(|c| c.is_payable());
        let attached = !options.call_value.is_zero() || options.token_value.unwrap_or(0) > 0;
        match (payable, attached) {
            (true, false) => {
                return Err(TransactionBuilderError::PayableMismatch(
                    "payable constructor requires a call value or a token value".to_string(),
                ))
            }
            (false, true) => {
                return Err(TransactionBuilderError::PayableMismatch(
                    "non-payable constructor does not accept value".to_string(),
                ))
            }
            _ => {}
        }
        let parameter = match &abi.constructor {
            Some(constructor) => constructor.encode_input(&options.parameters)?,
            None if options.parameters.is_empty() => vec![],
            None => {
                return Err(AbiError::ArityMismatch {
                    context: "constructor".to_string(),
                    expected: 0,
                    got: options.parameters.len(),
                }
                .into())
            }
        };

        Self::finish(
            self.write_request("wallet/deploycontract", owner)
                .field("abi", options.abi.clone())
                .field("bytecode", encode_hex(&options.bytecode))
                .field("parameter", encode_hex(parameter))
                .field("name", options.name.clone())
                .field("fee_limit", fee_limit)
                .field("call_value", options.call_value.sun())
                .field("consume_user_resource_percent", options.user_fee_percentage)
                .field("origin_energy_limit", options.origin_energy_limit)
                .optional_field("token_id", options.token_id)
                .optional_field("call_token_value", options.token_value),
        )
    }
}
