//! secp256k1 key management and recoverable ECDSA signatures.
//!
//! All curve arithmetic is delegated to `libsecp256k1` through the
//! [`secp256k1`] crate. Signatures carry their recovery id, so whoever holds
//! a signature and the signed hash can recover the signer's public key and,
//! from it, the signer's address.

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::constants::{CURVE_ORDER, SECRET_KEY_SIZE};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
pub use secp256k1::{PublicKey, SecretKey as PrivateKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::utils::{decode_hex, encode_hex};

/// Offset added to the recovery id in the serialized `v` byte.
pub const RECOVERY_ID_OFFSET: u8 = 27;

/// Key and signature errors.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum KeyError {
    /// Zero or out-of-range scalar, or malformed key bytes.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),
    /// Bytes do not encode a point on the curve.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    /// `r`/`s` out of range, bad recovery id, or unrecoverable signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

pub fn generate_private_key() -> PrivateKey {
    //! Generate a uniformly random private key in `[1, n-1]`.
    //!
    //! Bytes come from the operating system CSPRNG; candidates
    //! outside the valid range are discarded and redrawn.
    let mut candidate = [0u8; SECRET_KEY_SIZE];
    loop {
        OsRng.fill_bytes(&mut candidate);
        if let Ok(key) = PrivateKey::from_slice(&candidate) {
            return key;
        }
    }
}

pub fn private_key_from_bytes(bytes: &[u8]) -> Result<PrivateKey, KeyError> {
    //! Parse a 32-byte big-endian scalar.
    if bytes.len() != SECRET_KEY_SIZE {
        return Err(KeyError::InvalidPrivateKey(format!(
            "expected {SECRET_KEY_SIZE} bytes, got {}",
            bytes.len()
        )));
    }
    PrivateKey::from_slice(bytes)
        .map_err(|_| KeyError::InvalidPrivateKey("scalar is zero or not below curve order".into()))
}

pub fn private_key_from_hex(hex: &str) -> Result<PrivateKey, KeyError> {
    //! Parse a hex-encoded private key (with or without `0x`).
    let bytes = decode_hex(hex).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
    private_key_from_bytes(&bytes)
}

pub fn derive_public_key(private_key: &PrivateKey) -> PublicKey {
    //! Multiply the curve generator by the private scalar.
    private_key.public_key(&Secp256k1::signing_only())
}

pub fn public_key_from_hex(hex: &str) -> Result<PublicKey, KeyError> {
    //! Parse a compressed or uncompressed SEC1 public key.
    //!
    //! A raw 64-byte `x ‖ y` form without the `0x04` tag is accepted too,
    //! as node APIs sometimes return keys that way.
    let mut bytes = decode_hex(hex).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
    if bytes.len() == 64 {
        bytes.insert(0, 0x04);
    }
    PublicKey::from_slice(&bytes).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
}

fn in_scalar_range(value: &[u8; 32]) -> bool {
    // Big-endian arrays of equal length compare like the numbers they encode.
    value.iter().any(|&b| b != 0) && value < &CURVE_ORDER
}

/// Recoverable ECDSA signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// `r` component, big-endian.
    pub r: [u8; 32],
    /// `s` component, big-endian.
    pub s: [u8; 32],
    /// Recovery id, `0` or `1`.
    pub recovery_id: u8,
}

impl Signature {
    /// Length of serialized signature.
    pub const LENGTH: usize = 65;

    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Result<Self, KeyError> {
        //! Create a signature, checking component ranges.
        if !in_scalar_range(&r) {
            return Err(KeyError::InvalidSignature("r is outside [1, n-1]".into()));
        }
        if !in_scalar_range(&s) {
            return Err(KeyError::InvalidSignature("s is outside [1, n-1]".into()));
        }
        if recovery_id > 1 {
            return Err(KeyError::InvalidSignature(format!(
                "recovery id must be 0 or 1, got {recovery_id}"
            )));
        }
        Ok(Self { r, s, recovery_id })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        //! Parse the 65-byte `r ‖ s ‖ v` form.
        //!
        //! `v` may be given either raw (`0`/`1`) or with the `27` offset.
        if bytes.len() != Self::LENGTH {
            return Err(KeyError::InvalidSignature(format!(
                "expected {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }
        let v = bytes[64];
        let recovery_id = if v >= RECOVERY_ID_OFFSET {
            v - RECOVERY_ID_OFFSET
        } else {
            v
        };
        let r = bytes[..32].try_into().expect("Preset slice length");
        let s = bytes[32..64].try_into().expect("Preset slice length");
        Self::new(r, s, recovery_id)
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        //! Serialize as `r ‖ s ‖ (recovery_id + 27)`.
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.recovery_id + RECOVERY_ID_OFFSET;
        out
    }

    pub fn to_hex(&self) -> String {
        //! Hex form as expected in a transaction `signature` list.
        encode_hex(self.to_bytes())
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, KeyError> {
        let recid = RecoveryId::from_i32(i32::from(self.recovery_id))
            .map_err(|e| KeyError::InvalidSignature(e.to_string()))?;
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        RecoverableSignature::from_compact(&compact, recid)
            .map_err(|e| KeyError::InvalidSignature(e.to_string()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(0x{})", self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|e| KeyError::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

pub fn sign_hash(hash: [u8; 32], private_key: &PrivateKey) -> Signature {
    //! Sign a 32-byte hash (RFC6979 deterministic nonce).
    //!
    //! The hash is signed as is: callers pass a transaction id or a message
    //! digest, never raw payload bytes.
    //!
    //! libsecp256k1 reports recovery ids `2` and `3` only when `R.x` exceeds
    //! the curve order, which happens with probability below `2^-127`. Such a
    //! signature would be rejected by [`Signature::new`] and by TRON nodes
    //! alike; it is not produced in practice.
    let secp = Secp256k1::signing_only();
    let message = Message::from_slice(&hash).expect("Preset slice length");
    let (recid, compact) = secp
        .sign_ecdsa_recoverable(&message, private_key)
        .serialize_compact();
    Signature {
        r: compact[..32].try_into().expect("Preset slice length"),
        s: compact[32..].try_into().expect("Preset slice length"),
        recovery_id: u8::try_from(recid.to_i32()).expect("Recovery id is 0..=3"),
    }
}

pub fn recover_public_key(hash: [u8; 32], signature: &Signature) -> Result<PublicKey, KeyError> {
    //! Recover the signer's public key from a hash and a signature.
    let signature = Signature::new(signature.r, signature.s, signature.recovery_id)?;
    let message = Message::from_slice(&hash).expect("Preset slice length");
    Secp256k1::verification_only()
        .recover_ecdsa(&message, &signature.to_recoverable()?)
        .map_err(|e| KeyError::InvalidSignature(e.to_string()))
}
