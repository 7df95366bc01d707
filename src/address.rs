//! TRON address operations and verifications.

use crate::keys::{derive_public_key, PrivateKey, PublicKey};
use crate::utils::{decode_hex, double_sha256, encode_hex, keccak};
use ethereum_types::H160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, result::Result, str::FromStr};

/// Network prefix byte of every TRON address.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Address validation errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AddressValidationError {
    /// Wrong number of bytes or characters.
    #[error("invalid address {0:?}: wrong length")]
    InvalidLength(String),
    /// First byte is not `0x41`.
    #[error("invalid address {0:?}: missing 0x41 network prefix")]
    InvalidPrefix(String),
    /// Base58Check checksum does not match.
    #[error("invalid address {0:?}: checksum mismatch")]
    InvalidChecksum(String),
    /// Not hex and not Base58.
    #[error("invalid address {0:?}: not a hex or base58 string")]
    InvalidEncoding(String),
}

/// TRON address: `0x41` prefix followed by a 20-byte identifier.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 21]);

impl Address {
    /// Size of underlying array in bytes.
    pub const WIDTH: usize = 21;
    /// Length of hex representation (without `0x`).
    pub const HEX_LENGTH: usize = 42;
    /// Base58Check-encoded black hole address (all-zero identifier).
    pub const ZERO_BASE58: &'static str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb";

    pub fn from_identifier<T: Into<H160>>(identifier: T) -> Self {
        //! Create from a 20-byte identifier (an EVM-style address).
        let mut raw = [ADDRESS_PREFIX; 21];
        raw[1..].copy_from_slice(identifier.into().as_bytes());
        Self(raw)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressValidationError> {
        //! Create from 21 raw bytes, checking the prefix.
        let raw: [u8; 21] = bytes
            .try_into()
            .map_err(|_| AddressValidationError::InvalidLength(encode_hex(bytes)))?;
        if raw[0] != ADDRESS_PREFIX {
            return Err(AddressValidationError::InvalidPrefix(encode_hex(bytes)));
        }
        Ok(Self(raw))
    }

    pub fn from_hex(hex: &str) -> Result<Self, AddressValidationError> {
        //! Parse a `41`-prefixed hex string (an optional `0x` is tolerated).
        //!
        //! A 40-character EVM hex address is rejected: it lacks the network
        //! prefix and is not silently extended.
        let body = hex.strip_prefix("0x").unwrap_or(hex);
        if body.len() != Self::HEX_LENGTH {
            return Err(AddressValidationError::InvalidLength(hex.to_string()));
        }
        let bytes =
            decode_hex(body).map_err(|_| AddressValidationError::InvalidEncoding(hex.to_string()))?;
        Self::from_bytes(&bytes).map_err(|e| match e {
            AddressValidationError::InvalidPrefix(_) => {
                AddressValidationError::InvalidPrefix(hex.to_string())
            }
            _ => AddressValidationError::InvalidLength(hex.to_string()),
        })
    }

    pub fn from_base58(text: &str) -> Result<Self, AddressValidationError> {
        //! Parse a Base58Check string (`T...`).
        let decoded = bs58::decode(text)
            .into_vec()
            .map_err(|_| AddressValidationError::InvalidEncoding(text.to_string()))?;
        if decoded.len() != Self::WIDTH + 4 {
            return Err(AddressValidationError::InvalidLength(text.to_string()));
        }
        let (payload, checksum) = decoded.split_at(Self::WIDTH);
        if double_sha256(payload)[..4] != *checksum {
            return Err(AddressValidationError::InvalidChecksum(text.to_string()));
        }
        if payload[0] != ADDRESS_PREFIX {
            return Err(AddressValidationError::InvalidPrefix(text.to_string()));
        }
        Ok(Self(payload.try_into().expect("Preset slice length")))
    }

    pub fn to_hex(&self) -> String {
        //! Encode as a hex string starting with `41`, without `0x`.
        //!
        //! This is the form node APIs expect for non-`visible` requests.
        encode_hex(self.0)
    }

    pub fn to_base58(&self) -> String {
        //! Encode as Base58Check: `base58(payload ‖ sha256d(payload)[..4])`.
        let checksum = double_sha256(self.0);
        let mut buf = Vec::with_capacity(Self::WIDTH + 4);
        buf.extend_from_slice(&self.0);
        buf.extend_from_slice(&checksum[..4]);
        bs58::encode(buf).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; 21] {
        //! Raw 21 bytes, prefix included.
        &self.0
    }

    pub fn identifier(&self) -> H160 {
        //! 20-byte identifier, as it appears in ABI words.
        H160::from_slice(&self.0[1..])
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        //! Derive an address from a public key.
        // Drop the 0x04 tag of the uncompressed form.
        let hash = keccak(&public_key.serialize_uncompressed()[1..]);
        // Last 20 bytes of the hash.
        Self::from_identifier(H160::from_slice(&hash[12..]))
    }
}

pub fn is_valid_address(text: &str) -> bool {
    //! Check that `text` is a valid address in hex or Base58Check form.
    text.parse::<Address>().is_ok()
}

impl FromStr for Address {
    type Err = AddressValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        //! Accepts both text forms.
        let body = s.strip_prefix("0x").unwrap_or(s);
        let is_hex = body.chars().all(|c| c.is_ascii_hexdigit());
        if s.starts_with("0x") || (is_hex && body.len() >= 40) {
            Self::from_hex(s)
        } else {
            Self::from_base58(s)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}
impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A trait for objects that can generate an on-chain address.
pub trait AddressConvertible {
    /// Create an address
    fn address(&self) -> Address;
}

impl AddressConvertible for PublicKey {
    fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}
impl AddressConvertible for PrivateKey {
    fn address(&self) -> Address {
        Address::from_public_key(&derive_public_key(self))
    }
}
