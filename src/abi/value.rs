use serde_json::Value;

use super::{AbiError, AbiType};
use crate::address::Address;
use crate::numeric::I256;
use crate::utils::{decode_hex, encode_hex};
use crate::U256;

/// Runtime value of a contract parameter.
///
/// Fixed-size arrays use [`AbiValue::Array`] too, their length is checked
/// against the declared type on encoding. `trcToken` values are
/// [`AbiValue::Uint`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiValue {
    /// `address`.
    Address(Address),
    /// `bool`.
    Bool(bool),
    /// `uintN` and `trcToken`.
    Uint(U256),
    /// `intN`.
    Int(I256),
    /// `bytesN`; length must equal `N`.
    FixedBytes(Vec<u8>),
    /// `bytes`.
    Bytes(Vec<u8>),
    /// `string`.
    String(String),
    /// `T[]` and `T[k]`.
    Array(Vec<AbiValue>),
    /// `(T1,T2,...)`.
    Tuple(Vec<AbiValue>),
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}
impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}
impl From<I256> for AbiValue {
    fn from(value: I256) -> Self {
        Self::Int(value)
    }
}
impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

fn parse_unsigned(ty: &AbiType, json: &Value) -> Result<U256, AbiError> {
    match json {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16).ok(),
            None => U256::from_dec_str(s).ok(),
        },
        _ => None,
    }
    .ok_or_else(|| AbiError::mismatch(ty, json))
}

fn parse_signed(ty: &AbiType, json: &Value) -> Result<I256, AbiError> {
    match json {
        Value::Number(n) => n.as_i64().map(I256::from),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| AbiError::mismatch(ty, json))
}

fn parse_bytes(ty: &AbiType, json: &Value) -> Result<Vec<u8>, AbiError> {
    json.as_str()
        .and_then(|s| decode_hex(s).ok())
        .ok_or_else(|| AbiError::mismatch(ty, json))
}

impl AbiValue {
    pub fn from_json(ty: &AbiType, json: &Value) -> Result<Self, AbiError> {
        //! Convert a JSON-shaped argument into a typed value.
        //!
        //! Accepted shapes: address text (hex or Base58Check), JSON numbers or
        //! decimal/`0x`-hex strings for integers, `0x`-hex strings for bytes,
        //! JSON arrays for arrays and tuples.
        let mismatch = || AbiError::mismatch(ty, json);
        let value = match ty {
            AbiType::Address => Self::Address(
                json.as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(mismatch)?,
            ),
            AbiType::Bool => match json {
                Value::Bool(b) => Self::Bool(*b),
                Value::String(s) if s == "true" => Self::Bool(true),
                Value::String(s) if s == "false" => Self::Bool(false),
                _ => return Err(mismatch()),
            },
            AbiType::Uint(bits) => {
                let value = parse_unsigned(ty, json)?;
                if value.bits() > *bits {
                    return Err(mismatch());
                }
                Self::Uint(value)
            }
            AbiType::TrcToken => Self::Uint(parse_unsigned(ty, json)?),
            AbiType::Int(bits) => {
                let value = parse_signed(ty, json)?;
                if !value.fits_in_bits(*bits) {
                    return Err(mismatch());
                }
                Self::Int(value)
            }
            AbiType::FixedBytes(size) => {
                let bytes = parse_bytes(ty, json)?;
                if bytes.len() != *size {
                    return Err(mismatch());
                }
                Self::FixedBytes(bytes)
            }
            AbiType::Bytes => Self::Bytes(parse_bytes(ty, json)?),
            AbiType::String => Self::String(json.as_str().ok_or_else(mismatch)?.to_string()),
            AbiType::Array(inner) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                Self::Array(
                    items
                        .iter()
                        .map(|item| Self::from_json(inner, item))
                        .collect::<Result<_, _>>()?,
                )
            }
            AbiType::FixedArray(inner, size) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                if items.len() != *size {
                    return Err(AbiError::ArityMismatch {
                        context: ty.to_string(),
                        expected: *size,
                        got: items.len(),
                    });
                }
                Self::Array(
                    items
                        .iter()
                        .map(|item| Self::from_json(inner, item))
                        .collect::<Result<_, _>>()?,
                )
            }
            AbiType::Tuple(types) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                if items.len() != types.len() {
                    return Err(AbiError::ArityMismatch {
                        context: ty.to_string(),
                        expected: types.len(),
                        got: items.len(),
                    });
                }
                Self::Tuple(
                    types
                        .iter()
                        .zip(items)
                        .map(|(t, item)| Self::from_json(t, item))
                        .collect::<Result<_, _>>()?,
                )
            }
        };
        Ok(value)
    }

    pub fn to_json(&self) -> Value {
        //! Render as JSON: addresses in Base58Check, integers as decimal
        //! strings (they may exceed `f64` precision), bytes as `0x`-hex.
        match self {
            Self::Address(address) => Value::String(address.to_base58()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Uint(v) => Value::String(v.to_string()),
            Self::Int(v) => Value::String(v.to_string()),
            Self::FixedBytes(bytes) | Self::Bytes(bytes) => {
                Value::String(format!("0x{}", encode_hex(bytes)))
            }
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}
