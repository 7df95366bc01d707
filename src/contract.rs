//! Calling deployed contracts through their ABI.
//!
//! [`Contract`] pairs an address with a parsed [`ContractAbi`] and routes
//! calls: `view` and `pure` functions are executed on the node with
//! `wallet/triggerconstantcontract` and their outputs decoded, anything else
//! produces an unsigned [`Transaction`].

use serde_json::Value;

use crate::abi::{decode_revert_reason, AbiError, AbiValue, ContractAbi, FunctionDescriptor};
use crate::address::Address;
use crate::network::{node_error, NodeRequest, NodeTransport, RequestKind};
use crate::transaction_builder::{CallOptions, TransactionBuilder, TransactionBuilderError};
use crate::transactions::{Transaction, TransactionError};
use crate::utils::decode_hex;

/// Contract interaction errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ContractError {
    /// Function lookup or argument encoding failed.
    #[error(transparent)]
    Abi(#[from] AbiError),
    /// Request validation failed.
    #[error(transparent)]
    Builder(TransactionBuilderError),
    /// The transport could not deliver the request.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node rejected the request.
    #[error("node error: {0}")]
    Node(String),
    /// Execution reverted, with the decoded reason when available.
    #[error("execution reverted: {0}")]
    Revert(String),
    /// The node returned an unusable transaction.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl From<TransactionBuilderError> for ContractError {
    fn from(err: TransactionBuilderError) -> Self {
        match err {
            TransactionBuilderError::Abi(e) => Self::Abi(e),
            e => Self::Builder(e),
        }
    }
}

/// Result of [`Contract::call`].
#[derive(Clone, Debug, PartialEq)]
pub enum CallResult {
    /// Decoded outputs of a read-only function.
    Constant(Vec<AbiValue>),
    /// Unsigned transaction of a state-changing function.
    Transaction(Transaction),
}

/// A deployed contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contract {
    address: Address,
    abi: ContractAbi,
    builder: TransactionBuilder,
}

impl Contract {
    pub fn new(address: Address, abi: ContractAbi) -> Self {
        //! Bind an interface to a deployed address, with mainnet limits.
        Self {
            address,
            abi,
            builder: TransactionBuilder::new(),
        }
    }

    #[must_use]
    pub fn with_builder(mut self, builder: TransactionBuilder) -> Self {
        //! Use custom protocol limits or a permission id for produced
        //! transactions.
        self.builder = builder;
        self
    }

    pub const fn address(&self) -> &Address {
        //! Contract address.
        &self.address
    }

    pub const fn abi(&self) -> &ContractAbi {
        //! Contract interface.
        &self.abi
    }

    pub fn abi_request(address: &Address) -> NodeRequest {
        //! Request fetching contract metadata from `wallet/getcontract`.
        NodeRequest::new("wallet/getcontract", RequestKind::Read).field("value", address.to_hex())
    }

    pub fn from_node_response(address: Address, response: &Value) -> Result<Self, ContractError> {
        //! Build from a `wallet/getcontract` response.
        if let Some(error) = node_error(response) {
            return Err(ContractError::Node(error));
        }
        let abi = response
            .get("abi")
            .cloned()
            .ok_or_else(|| ContractError::Node(format!("no contract at {address}")))?;
        Ok(Self::new(address, ContractAbi::from_value(abi)?))
    }

    pub fn function(
        &self,
        name_or_signature: &str,
        arg_count: usize,
    ) -> Result<&FunctionDescriptor, ContractError> {
        //! Resolve a function accepting `arg_count` arguments.
        Ok(self.abi.function_for_call(name_or_signature, arg_count)?)
    }

    pub fn args_from_json(
        &self,
        name_or_signature: &str,
        args: &[Value],
    ) -> Result<Vec<AbiValue>, ContractError> {
        //! Convert JSON arguments using the input types of the function.
        let function = self.function(name_or_signature, args.len())?;
        function
            .inputs
            .iter()
            .zip(args)
            .map(|(param, arg)| AbiValue::from_json(&param.ty, arg).map_err(ContractError::from))
            .collect()
    }

    pub fn call<T: NodeTransport + ?Sized>(
        &self,
        transport: &T,
        name_or_signature: &str,
        args: &[AbiValue],
        options: &CallOptions,
        owner: &Address,
    ) -> Result<CallResult, ContractError> {
        //! Call a function, routing by its state mutability.
        //!
        //! `options` only apply to state-changing functions.
        let function = self.function(name_or_signature, args.len())?;
        if function.is_read_only() {
            self.constant_call(transport, function, args, owner)
                .map(CallResult::Constant)
        } else {
            self.transaction_call(transport, function, args, options, owner)
                .map(CallResult::Transaction)
        }
    }

    pub fn call_constant<T: NodeTransport + ?Sized>(
        &self,
        transport: &T,
        name_or_signature: &str,
        args: &[AbiValue],
        owner: &Address,
    ) -> Result<Vec<AbiValue>, ContractError> {
        //! Execute any function on the node without producing a transaction.
        //!
        //! For state-changing functions this is a dry run.
        let function = self.function(name_or_signature, args.len())?;
        self.constant_call(transport, function, args, owner)
    }

    pub fn send<T: NodeTransport + ?Sized>(
        &self,
        transport: &T,
        name_or_signature: &str,
        args: &[AbiValue],
        options: &CallOptions,
        owner: &Address,
    ) -> Result<Transaction, ContractError> {
        //! Build an unsigned transaction calling any function.
        let function = self.function(name_or_signature, args.len())?;
        self.transaction_call(transport, function, args, options, owner)
    }

    fn constant_call<T: NodeTransport + ?Sized>(
        &self,
        transport: &T,
        function: &FunctionDescriptor,
        args: &[AbiValue],
        owner: &Address,
    ) -> Result<Vec<AbiValue>, ContractError> {
        let request = self.builder.trigger_constant_contract(
            &self.address,
            &function.signature(),
            args,
            owner,
        )?;
        let response = request
            .send(transport)
            .map_err(|e| ContractError::Transport(e.to_string()))?;
        let output = constant_output(&response)?;
        let error = node_error(&response);
        if error.is_some() || execution_failed(&response) {
            if let Some(reason) = decode_revert_reason(&output) {
                tracing::debug!(function = %function.name, %reason, "constant call reverted");
                return Err(ContractError::Revert(reason));
            }
            return Err(match error {
                Some(error) => ContractError::Node(error),
                None => ContractError::Revert("execution failed".to_string()),
            });
        }
        Ok(function.decode_output(&output)?)
    }

    fn transaction_call<T: NodeTransport + ?Sized>(
        &self,
        transport: &T,
        function: &FunctionDescriptor,
        args: &[AbiValue],
        options: &CallOptions,
        owner: &Address,
    ) -> Result<Transaction, ContractError> {
        let request = self.builder.trigger_smart_contract(
            &self.address,
            &function.signature(),
            args,
            options,
            owner,
        )?;
        let response = request
            .send(transport)
            .map_err(|e| ContractError::Transport(e.to_string()))?;
        Transaction::from_node_response(response).map_err(|e| match e {
            TransactionError::NodeError(error) => ContractError::Node(error),
            other => other.into(),
        })
    }
}

fn constant_output(response: &Value) -> Result<Vec<u8>, ContractError> {
    match response
        .get("constant_result")
        .and_then(|r| r.get(0))
        .and_then(Value::as_str)
    {
        Some(hex) => decode_hex(hex)
            .map_err(|e| ContractError::Node(format!("invalid constant_result {hex:?}: {e}"))),
        None => Ok(vec![]),
    }
}

fn execution_failed(response: &Value) -> bool {
    response
        .pointer("/transaction/ret/0/ret")
        .and_then(Value::as_str)
        == Some("FAILED")
}
