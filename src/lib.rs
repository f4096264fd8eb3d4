//! XRPL Remote Signer Library
//!
//! Produces signed ledger transactions for an account whose private key is
//! held by a remote threshold signing service.
//!
//! # Architecture
//!
//! This crate provides:
//! - **codec**: Canonical binary encoding of transactions and signing payloads
//! - **crypto**: Domain-separated SHA-512-half hashing and DER signature encoding
//! - **tx**: Canonicalization and schema validation before signing
//! - **signing**: Pre-image construction, the remote signer seam, signature compilation
//! - **wallet**: The signing orchestrator and address codecs
//! - **utils**: Configuration, decimal normalization, logging
//!
//! # Security
//!
//! The key never enters this process. Only the 32-byte signing digest leaves
//! it, and only `(r, s)` comes back. Logged addresses and digests are redacted.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xrpl_remote_signer::{RemoteXrplWallet, Transaction};
//!
//! let wallet = RemoteXrplWallet::new(public_key_hex, Arc::new(my_signer))?;
//! let tx = Transaction::from_json(r#"{"TransactionType": "Payment", ...}"#)?;
//! let signed = wallet.sign(&tx, false, None).await?;
//! println!("{} {}", signed.hash, signed.tx_blob);
//! ```

pub mod codec;
pub mod crypto;
pub mod error;
pub mod signing;
pub mod tx;
pub mod types;
pub mod utils;
pub mod wallet;

pub use codec::{BinaryCodec, CodecError, Definitions, XrplBinaryCodec};
pub use crypto::{hash_signed_tx, DerStrategy, HashPrefix, RawSignature, ScalarFormat};
pub use error::{BackendError, ErrorCode, SignerError, SignerResult};
pub use signing::{LocalKeySigner, RemoteSignature, RemoteSigner};
pub use tx::{canonicalize, Canonicalizer};
pub use types::{Amount, IssuedCurrencyAmount, SignedTransaction, Signer, SignerWrapper, Transaction};
pub use utils::{init_logging, SignerConfig};
pub use wallet::{MultisignSelector, RemoteXrplWallet};
