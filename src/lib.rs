#![doc(html_root_url = "https://docs.rs/tron-devkit/0.1.0-beta.1")]
#![warn(rust_2018_idioms, missing_docs, dead_code, unused_imports, unused_mut)]

//! Rust library to aid coding with TRON: wallets, transactions signing,
//! smart contract ABI interfacing, multisig permissions, etc.
//!
//! This library performs no network I/O. It validates operations, encodes
//! them into node requests, and signs and verifies what nodes return. Plug in
//! any HTTP client by implementing [`network::NodeTransport`].
//!
//! ## Usage
//!
//! One of possible use cases can be a TRX transfer from an HD wallet.
//!
//! Derive the account, build the request for `wallet/createtransaction`,
//! then sign the transaction the node returns.
//!
//! ```rust
//! use tron_devkit::hdnode::{HDNode, Language, Mnemonic};
//! use tron_devkit::transaction_builder::TransactionBuilder;
//! use tron_devkit::{Address, AddressConvertible, Amount};
//!
//! let mnemonic = Mnemonic::from_phrase(
//!     "ignore empty bird silly journey junior ripple have guard waste between tenant",
//!     Language::English,
//! )
//! .expect("Must be correct");
//! let wallet = HDNode::build()
//!     .mnemonic(mnemonic)
//!     .build()
//!     .expect("Builds")
//!     .derive_account(0)
//!     .expect("Derives");
//! let sender = wallet.address();
//!
//! let to: Address = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap();
//! let request = TransactionBuilder::new()
//!     .send_trx(&to, Amount::from_trx(10).unwrap(), &sender)
//!     .expect("Valid transfer");
//! assert_eq!(request.fields["owner_address"], sender.to_hex());
//! // Send `request.body()` to the node, then:
//! // let tx = Transaction::from_node_response(response)?.sign(&private_key)?;
//! ```
//!
//! ## Modules
//!
//! - [`keys`] and [`address`]: secp256k1 keys, signatures and TRON addresses.
//! - [`hdnode`]: BIP32/BIP39/BIP44 wallets on the `m/44'/195'` path.
//! - [`abi`]: contract ABI types, values and codec.
//! - [`transaction_builder`]: validated requests for node endpoints.
//! - [`transactions`] and [`multisig`]: parsing, signing and weighted
//!   permissions.
//! - [`contract`]: calling contracts through their ABI.
//!
//! ### MSRV
//!
//! Currently it requires rust `1.74.0` or higher to build.

pub mod abi;
pub mod address;
pub mod config;
pub mod contract;
pub mod error;
pub mod hdnode;
pub mod keys;
pub mod multisig;
pub mod network;
pub mod numeric;
pub mod transaction_builder;
pub mod transactions;
mod utils;

pub use address::{Address, AddressConvertible, AddressValidationError};
pub use error::{Error, Result};
pub use ethereum_types::U256;
pub use keys::{PrivateKey, PublicKey};
pub use numeric::{Amount, I256};
pub use utils::{decode_hex, double_sha256, encode_hex, keccak, left_pad, lstrip, sha256};
