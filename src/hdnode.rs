//! TRON-tailored Hierarchically deterministic nodes support
//!
//! `Reference <https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki>`
//!
//! Mnemonics follow BIP39 and accounts follow BIP44 with the registered
//! TRON coin type `195`, so the first account lives at `m/44'/195'/0'/0/0`.

use bip32::{ChainCode, Depth, Error as Bip32Error, KeyFingerprint};
pub use bip32::{
    ChildNumber, DerivationPath, ExtendedKey, ExtendedKeyAttrs, ExtendedPrivateKey,
    ExtendedPublicKey, Prefix,
};
pub use bip39::{Language, Mnemonic, MnemonicType};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::address::{Address, AddressConvertible};
use crate::keys::{PrivateKey, PublicKey};

/// BIP44 coin type registered for TRON.
pub const TRX_COIN_TYPE: u32 = 195;
/// Default HD derivation path for TRON (external chain of the first account).
pub const TRX_EXTERNAL_PATH: &str = "m/44'/195'/0'/0";
/// First hardened child index.
pub const HARDENED_OFFSET: u32 = 1 << 31;

/// Errors of mnemonic handling and key derivation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum HDNodeError {
    /// Unknown word, wrong word count or checksum mismatch.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    /// Path string cannot be parsed.
    #[error("invalid derivation path: {0:?}")]
    InvalidDerivationPath(String),
    /// `IL >= n` or the child key is zero for this index.
    #[error("child key at index {0} is invalid, use another index")]
    InvalidChild(u32),
    /// Hardened derivation requested from a public-only node.
    #[error("cannot derive a hardened child from a public key")]
    WrongChildNumber,
    /// Private key requested from a public-only node.
    #[error("private key is not available for this node")]
    Crypto,
    /// Seed is shorter than 16 or longer than 64 bytes.
    #[error("seed length must be between 16 and 64 bytes, got {0}")]
    SeedLength(usize),
    /// Builder received no or conflicting inputs.
    #[error("cannot build HDNode: {0}")]
    Unbuildable(String),
    /// Other failures reported by BIP32 machinery.
    #[error("bip32 error: {0}")]
    Bip32(String),
}

impl From<Bip32Error> for HDNodeError {
    fn from(err: Bip32Error) -> Self {
        match err {
            Bip32Error::ChildNumber => Self::WrongChildNumber,
            Bip32Error::Crypto => Self::Crypto,
            e => Self::Bip32(e.to_string()),
        }
    }
}

pub fn generate_mnemonic(word_count: usize) -> Result<Mnemonic, HDNodeError> {
    //! Generate a new English mnemonic of 12, 15, 18, 21 or 24 words.
    let mnemonic_type = MnemonicType::for_word_count(word_count)
        .map_err(|e| HDNodeError::InvalidMnemonic(e.to_string()))?;
    let mut entropy = vec![0u8; mnemonic_type.entropy_bits() / 8];
    OsRng.fill_bytes(&mut entropy);
    Mnemonic::from_entropy(&entropy, Language::English)
        .map_err(|e| HDNodeError::InvalidMnemonic(e.to_string()))
}

pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, HDNodeError> {
    //! Parse an English mnemonic, verifying every word and the checksum.
    Mnemonic::from_phrase(phrase, Language::English)
        .map_err(|e| HDNodeError::InvalidMnemonic(e.to_string()))
}

pub fn validate_mnemonic(phrase: &str) -> bool {
    //! Check an English mnemonic without building it.
    Mnemonic::validate(phrase, Language::English).is_ok()
}

pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<[u8; 64], HDNodeError> {
    //! Stretch a mnemonic into a 64-byte seed.
    //!
    //! PBKDF2-HMAC-SHA512 with salt `"mnemonic" + passphrase` and 2048 rounds.
    //! This is deliberately slow.
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(seed_bytes(&mnemonic, passphrase))
}

fn seed_bytes(mnemonic: &Mnemonic, passphrase: &str) -> [u8; 64] {
    bip39::Seed::new(mnemonic, passphrase)
        .as_bytes()
        .try_into()
        .expect("BIP39 seed is 64 bytes")
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum HDNodeVariant {
    Full(ExtendedPrivateKey<PrivateKey>),
    Restricted(ExtendedPublicKey<PublicKey>),
}
use HDNodeVariant::{Full, Restricted};

/// HD Node wrapper.
///
/// A node built from a seed, a mnemonic or an extended private key can derive
/// both hardened and non-hardened children. A node built from an extended
/// public key is *restricted*: it has no private key and can only derive
/// non-hardened children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HDNode(HDNodeVariant);

impl HDNode {
    pub fn build<'a>() -> HDNodeBuilder<'a> {
        //! Create an [`HDNodeBuilder`].
        HDNodeBuilder::default()
    }

    pub fn master_from_seed<S: AsRef<[u8]>>(seed: S) -> Result<Self, HDNodeError> {
        //! Create a depth-0 node: `HMAC-SHA512("Bitcoin seed", seed)`.
        let seed = seed.as_ref();
        if !(16..=64).contains(&seed.len()) {
            return Err(HDNodeError::SeedLength(seed.len()));
        }
        Ok(Self(Full(ExtendedPrivateKey::new(seed)?)))
    }

    pub fn derive(&self, index: u32) -> Result<Self, HDNodeError> {
        //! Derive a child given an index. Indices from `2^31` are hardened.
        //!
        //! If the derived key is invalid for this index, an error is returned:
        //! the next index is not tried automatically.
        let child_number = ChildNumber(index);
        let invalid_child = |e: Bip32Error| match e {
            Bip32Error::Crypto => HDNodeError::InvalidChild(index),
            e => e.into(),
        };
        let child = match &self.0 {
            Full(privkey) => Full(privkey.derive_child(child_number).map_err(invalid_child)?),
            Restricted(pubkey) => {
                if child_number.is_hardened() {
                    return Err(HDNodeError::WrongChildNumber);
                }
                Restricted(pubkey.derive_child(child_number).map_err(invalid_child)?)
            }
        };
        Ok(Self(child))
    }

    pub fn derive_path(&self, path: &str) -> Result<Self, HDNodeError> {
        //! Walk a path like `m/44'/195'/0'/0/0` from this node, one segment
        //! at a time. A trailing `'` marks a hardened segment.
        let parsed: DerivationPath = path
            .parse()
            .map_err(|_| HDNodeError::InvalidDerivationPath(path.to_string()))?;
        self.derive_parsed_path(&parsed)
    }

    fn derive_parsed_path(&self, path: &DerivationPath) -> Result<Self, HDNodeError> {
        path.iter()
            .try_fold(self.clone(), |node, child| node.derive(child.0))
    }

    pub fn derive_account(&self, index: u32) -> Result<Self, HDNodeError> {
        //! Derive the `index`-th address node from an external chain node.
        if index >= HARDENED_OFFSET {
            return Err(HDNodeError::InvalidDerivationPath(format!(
                "account index {index} must not be hardened"
            )));
        }
        self.derive(index)
    }

    pub fn public_key(&self) -> ExtendedPublicKey<PublicKey> {
        //! Get underlying extended public key.
        match &self.0 {
            Full(privkey) => privkey.public_key(),
            Restricted(pubkey) => pubkey.clone(),
        }
    }
    pub fn private_key(&self) -> Result<ExtendedPrivateKey<PrivateKey>, HDNodeError> {
        //! Get underlying extended private key.
        match &self.0 {
            Full(privkey) => Ok(privkey.clone()),
            Restricted(_) => Err(HDNodeError::Crypto),
        }
    }
    pub fn signing_key(&self) -> Result<PrivateKey, HDNodeError> {
        //! Get the plain private key usable for signing.
        self.private_key().map(|k| *k.private_key())
    }
    pub fn chain_code(&self) -> ChainCode {
        //! Get underlying chain code.
        self.attrs().chain_code
    }
    pub fn depth(&self) -> Depth {
        //! Get depth.
        self.attrs().depth
    }
    pub fn child_number(&self) -> ChildNumber {
        //! Get child number.
        self.attrs().child_number
    }
    pub fn parent_fingerprint(&self) -> KeyFingerprint {
        //! Get parent fingerprint.
        self.attrs().parent_fingerprint
    }
    fn attrs(&self) -> &ExtendedKeyAttrs {
        match &self.0 {
            Full(privkey) => privkey.attrs(),
            Restricted(pubkey) => pubkey.attrs(),
        }
    }
    pub fn is_restricted(&self) -> bool {
        //! Is this a public-only node?
        matches!(self.0, Restricted(_))
    }
}

impl AddressConvertible for HDNode {
    fn address(&self) -> Address {
        self.public_key().public_key().address()
    }
}

/// Builder for HD node: use this to construct an [`HDNode`].
///
/// Exactly one key source must be given: a seed, a mnemonic, an extended
/// private or public key. Seeds and mnemonics are walked along `path`,
/// which defaults to [`TRX_EXTERNAL_PATH`]; extended keys are walked along
/// `path` only when one is given explicitly.
#[derive(Clone, Default)]
pub struct HDNodeBuilder<'a> {
    path: Option<DerivationPath>,
    seed: Option<[u8; 64]>,
    mnemonic: Option<Mnemonic>,
    password: Option<&'a str>,
    ext_privkey: Option<ExtendedKey>,
    ext_pubkey: Option<ExtendedKey>,
}

impl<'a> HDNodeBuilder<'a> {
    #[must_use]
    pub fn path(mut self, path: DerivationPath) -> Self {
        //! Set a derivation path to use.
        self.path = Some(path);
        self
    }
    #[must_use]
    pub fn seed(mut self, seed: [u8; 64]) -> Self {
        //! Set a seed to use.
        self.seed = Some(seed);
        self
    }
    #[must_use]
    pub fn mnemonic(mut self, mnemonic: Mnemonic) -> Self {
        //! Set a mnemonic to use. You may optionally provide a password as well.
        self.mnemonic = Some(mnemonic);
        self
    }
    #[must_use]
    pub fn mnemonic_with_password(mut self, mnemonic: Mnemonic, password: &'a str) -> Self {
        //! Set a password-protected mnemonic to use.
        self.mnemonic = Some(mnemonic);
        self.password = Some(password);
        self
    }
    #[must_use]
    pub fn private_key(mut self, ext_key: ExtendedKey) -> Self {
        //! Create an HDNode from extended private key structure.
        self.ext_privkey = Some(ext_key);
        self
    }
    #[must_use]
    pub fn public_key(mut self, ext_key: ExtendedKey) -> Self {
        //! Create an HDNode from extended public key structure.
        self.ext_pubkey = Some(ext_key);
        self
    }
    #[must_use]
    pub fn master_private_key_bytes<T: Into<ChainCode>>(self, key: [u8; 33], chain_code: T) -> Self {
        //! Create an HDNode from private key bytes and chain code.
        //!
        //! Private key bytes carry a leading zero byte, as in the xprv format.
        self.private_key(ExtendedKey {
            prefix: Prefix::XPRV,
            attrs: master_attrs(chain_code.into()),
            key_bytes: key,
        })
    }
    #[must_use]
    pub fn master_public_key_bytes<T: Into<ChainCode>>(self, key: [u8; 33], chain_code: T) -> Self {
        //! Create an HDNode from compressed public key bytes and chain code.
        //!
        //! Beware that this node cannot be used to derive new private keys.
        self.public_key(ExtendedKey {
            prefix: Prefix::XPUB,
            attrs: master_attrs(chain_code.into()),
            key_bytes: key,
        })
    }

    pub fn build(self) -> Result<HDNode, HDNodeError> {
        //! Create an HDNode from given arguments.
        match (self.seed, self.mnemonic, self.ext_privkey, self.ext_pubkey) {
            (Some(seed), None, None, None) => HDNode::master_from_seed(seed)?
                .derive_parsed_path(&self.path.unwrap_or_else(default_path)),
            (None, Some(mnemonic), None, None) => {
                HDNode::master_from_seed(seed_bytes(&mnemonic, self.password.unwrap_or("")))?
                    .derive_parsed_path(&self.path.unwrap_or_else(default_path))
            }
            (None, None, Some(ext_key), None) => {
                let node = HDNode(Full(ext_key.try_into()?));
                match self.path {
                    Some(path) => node.derive_parsed_path(&path),
                    None => Ok(node),
                }
            }
            (None, None, None, Some(ext_key)) => {
                let node = HDNode(Restricted(ext_key.try_into()?));
                match self.path {
                    Some(path) => node.derive_parsed_path(&path),
                    None => Ok(node),
                }
            }
            (None, None, None, None) => Err(HDNodeError::Unbuildable(
                "no parameters provided".to_string(),
            )),
            _ => Err(HDNodeError::Unbuildable(
                "incompatible parameters".to_string(),
            )),
        }
    }
}

fn master_attrs(chain_code: ChainCode) -> ExtendedKeyAttrs {
    ExtendedKeyAttrs {
        depth: 0,
        parent_fingerprint: [0; 4],
        child_number: ChildNumber(0u32),
        chain_code,
    }
}

fn default_path() -> DerivationPath {
    TRX_EXTERNAL_PATH.parse().expect("hardcoded path must be valid")
}
