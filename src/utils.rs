use rustc_hex::{FromHex, FromHexError, ToHex};
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

pub fn keccak<S: AsRef<[u8]>>(bytes: S) -> [u8; 32] {
    //! Compute Keccak-256 hash (not the standardized SHA3-256).
    let mut hasher = Keccak::v256();
    hasher.update(bytes.as_ref());
    let mut hash = [0; 32];
    hasher.finalize(&mut hash);
    hash
}

pub fn sha256<S: AsRef<[u8]>>(bytes: S) -> [u8; 32] {
    //! Compute SHA-256 hash.
    //!
    //! This is how TRON identifies transactions: the id is a hash
    //! of the raw (unsigned) transaction body.
    Sha256::digest(bytes.as_ref()).into()
}

pub fn double_sha256<S: AsRef<[u8]>>(bytes: S) -> [u8; 32] {
    //! Compute `SHA256(SHA256(bytes))`, the Base58Check checksum primitive.
    sha256(sha256(bytes))
}

pub fn decode_hex(hex: &str) -> Result<Vec<u8>, FromHexError> {
    //! Decode a hex string, with or without `0x` prefix.
    hex.strip_prefix("0x").unwrap_or(hex).from_hex()
}

pub fn encode_hex<S: AsRef<[u8]>>(bytes: S) -> String {
    //! Encode bytes as a lowercase hex string without `0x` prefix.
    bytes.as_ref().to_hex()
}

pub fn left_pad<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    //! Prepend zeros up to `N` bytes.
    //!
    //! Returns [`None`] if `bytes` is longer than `N`.
    let start = N.checked_sub(bytes.len())?;
    let mut out = [0; N];
    out[start..].copy_from_slice(bytes);
    Some(out)
}

pub fn lstrip<S: AsRef<[u8]>>(bytes: S) -> Vec<u8> {
    //! Drop leading zero bytes.
    bytes
        .as_ref()
        .iter()
        .skip_while(|&&x| x == 0)
        .copied()
        .collect()
}

pub fn right_pad_to_word(bytes: &[u8]) -> Vec<u8> {
    //! Append zeros up to the next multiple of 32 bytes.
    let mut out = bytes.to_vec();
    out.resize(bytes.len().div_ceil(32) * 32, 0);
    out
}

/// Serde adapters for hex-encoded fields in node payloads.
pub(crate) mod unhex {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_with::{DeserializeAs, SerializeAs};

    /// Byte container as a lowercase hex string. `0x` is accepted on input.
    pub struct Hex;

    impl<T: AsRef<[u8]>> SerializeAs<T> for Hex {
        fn serialize_as<S: Serializer>(source: &T, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&super::encode_hex(source))
        }
    }

    impl<'de, T: TryFrom<Vec<u8>>> DeserializeAs<'de, T> for Hex {
        fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
            let text = String::deserialize(deserializer)?;
            let bytes = super::decode_hex(&text).map_err(serde::de::Error::custom)?;
            let len = bytes.len();
            T::try_from(bytes)
                .map_err(|_| serde::de::Error::invalid_length(len, &"hex string of fixed size"))
        }
    }
}
