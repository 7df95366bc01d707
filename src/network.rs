//! Boundary with node HTTP APIs.
//!
//! This crate never performs I/O itself. Builders produce [`NodeRequest`]
//! values; an implementation of [`NodeTransport`] supplied by the caller
//! delivers them to a full node (or a solidity node for reads) and returns
//! the decoded JSON response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::decode_hex;

/// Error produced by a transport implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Generic result of transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// What a request does to chain state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Constant call or query, never produces a transaction to sign.
    Read,
    /// Produces an unsigned transaction or broadcasts a signed one.
    Write,
}

/// A request to a node endpoint: path relative to the node root
/// (`wallet/createtransaction`) and the JSON body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRequest {
    /// Endpoint path without leading slash.
    pub path: String,
    /// JSON body fields.
    pub fields: Map<String, Value>,
    /// Read or write.
    pub kind: RequestKind,
}

impl NodeRequest {
    pub fn new(path: &str, kind: RequestKind) -> Self {
        //! Create a request with an empty body.
        Self {
            path: path.to_string(),
            fields: Map::new(),
            kind,
        }
    }

    #[must_use]
    pub fn field<T: Into<Value>>(mut self, name: &str, value: T) -> Self {
        //! Add a body field.
        self.fields.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn optional_field<T: Into<Value>>(self, name: &str, value: Option<T>) -> Self {
        //! Add a body field if the value is present.
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    pub fn body(&self) -> Value {
        //! JSON body as sent over the wire.
        Value::Object(self.fields.clone())
    }

    pub fn send<T: NodeTransport + ?Sized>(&self, transport: &T) -> TransportResult<Value> {
        //! Deliver through `transport`.
        tracing::debug!(path = %self.path, kind = ?self.kind, "sending node request");
        transport.request(self)
    }
}

/// Delivers requests to a node.
///
/// Implementations own endpoint selection, timeouts and retries.
pub trait NodeTransport {
    /// Send a request and return the decoded JSON response.
    fn request(&self, request: &NodeRequest) -> TransportResult<Value>;
}

impl<T: NodeTransport + ?Sized> NodeTransport for &T {
    fn request(&self, request: &NodeRequest) -> TransportResult<Value> {
        (**self).request(request)
    }
}

pub fn node_error(response: &Value) -> Option<String> {
    //! Extract an error reported in a node response body.
    //!
    //! Nodes report failures either as a top-level `Error` string or as
    //! `result.code` with a hex-encoded `result.message`.
    if let Some(error) = response.get("Error") {
        return Some(match error {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        });
    }
    let result = response.get("result")?;
    if result.get("result").and_then(Value::as_bool) == Some(true) {
        return None;
    }
    let message = result.get("message").and_then(Value::as_str);
    let code = result.get("code").and_then(Value::as_str);
    let message = message.map(|m| {
        decode_hex(m)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_else(|| m.to_string())
    });
    match (code, message) {
        (Some(code), Some(message)) => Some(format!("{code}: {message}")),
        (Some(code), None) => Some(code.to_string()),
        (None, message) => message,
    }
}
