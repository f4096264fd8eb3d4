//! Domain-separated ledger hashing
//!
//! Every hash in this crate is SHA-512 truncated to its first 32 bytes
//! ("SHA-512 half"), computed over a 4-byte big-endian domain prefix
//! followed by the payload.

use sha2::{Digest, Sha512};

use crate::codec::BinaryCodec;
use crate::error::{SignerError, SignerResult};
use crate::types::Transaction;

/// Size of every ledger hash in bytes
pub const HASH_BYTES: usize = 32;

/// 4-byte hash domains. A prefix must never be reused for another purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HashPrefix {
    /// Signed transaction blob -> transaction ID ('TXN')
    TransactionId = 0x5458_4E00,
    /// Transaction plus metadata ('SND')
    TransactionNode = 0x534E_4400,
    /// Inner node in a SHAMap ('MIN')
    InnerNode = 0x4D49_4E00,
    /// Leaf node in a SHAMap ('MLN')
    LeafNode = 0x4D4C_4E00,
    /// Single-signer signing blob ('STX')
    TransactionSign = 0x5354_5800,
    /// Single-signer signing blob on the old test network ('stx')
    TransactionSignTestnet = 0x7374_7800,
    /// Per-signer multisigning blob ('SMT')
    TransactionMultisign = 0x534D_5400,
    /// Ledger header ('LWR')
    Ledger = 0x4C57_5200,
}

impl HashPrefix {
    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.value().to_be_bytes()
    }
}

/// SHA-512 over `data`, first 32 bytes.
pub fn sha512_half(data: &[u8]) -> [u8; HASH_BYTES] {
    let digest = Sha512::digest(data);
    let mut out = [0u8; HASH_BYTES];
    out.copy_from_slice(&digest[..HASH_BYTES]);
    out
}

/// SHA-512 half of `prefix || payload`.
pub fn compute_hash(prefix: HashPrefix, payload: &[u8]) -> [u8; HASH_BYTES] {
    let mut hasher = Sha512::new();
    hasher.update(prefix.to_bytes());
    hasher.update(payload);
    let digest = hasher.finalize();
    let mut out = [0u8; HASH_BYTES];
    out.copy_from_slice(&digest[..HASH_BYTES]);
    out
}

/// Pluggable hash strategy used by the signing pipeline.
pub trait HashingEngine: Send + Sync {
    /// 32-byte digest of `data`.
    fn half_digest(&self, data: &[u8]) -> [u8; HASH_BYTES];

    /// 32-byte digest of `prefix || data`.
    fn prefixed_digest(&self, prefix: HashPrefix, data: &[u8]) -> [u8; HASH_BYTES] {
        let mut buf = Vec::with_capacity(4 + data.len());
        buf.extend_from_slice(&prefix.to_bytes());
        buf.extend_from_slice(data);
        self.half_digest(&buf)
    }
}

/// Default engine backed by `sha2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512HalfEngine;

impl HashingEngine for Sha512HalfEngine {
    fn half_digest(&self, data: &[u8]) -> [u8; HASH_BYTES] {
        sha512_half(data)
    }

    fn prefixed_digest(&self, prefix: HashPrefix, data: &[u8]) -> [u8; HASH_BYTES] {
        compute_hash(prefix, data)
    }
}

/// Input accepted by [`hash_signed_tx`]: a transaction or its hex blob.
#[derive(Debug, Clone, Copy)]
pub enum SignedTxInput<'a> {
    Transaction(&'a Transaction),
    Blob(&'a str),
}

impl<'a> From<&'a Transaction> for SignedTxInput<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self::Transaction(tx)
    }
}

impl<'a> From<&'a str> for SignedTxInput<'a> {
    fn from(blob: &'a str) -> Self {
        Self::Blob(blob)
    }
}

impl<'a> From<&'a String> for SignedTxInput<'a> {
    fn from(blob: &'a String) -> Self {
        Self::Blob(blob.as_str())
    }
}

/// Hash a signed transaction the way the ledger does.
///
/// Fails with a validation error if the transaction carries none of
/// `TxnSignature`, `Signers` or `SigningPubKey`.
pub fn hash_signed_tx<'a>(
    codec: &dyn BinaryCodec,
    tx: impl Into<SignedTxInput<'a>>,
) -> SignerResult<String> {
    hash_signed_tx_with(&Sha512HalfEngine, codec, tx)
}

/// [`hash_signed_tx`] with an explicit hashing engine.
pub fn hash_signed_tx_with<'a>(
    engine: &dyn HashingEngine,
    codec: &dyn BinaryCodec,
    tx: impl Into<SignedTxInput<'a>>,
) -> SignerResult<String> {
    let blob = match tx.into() {
        SignedTxInput::Blob(blob) => {
            let decoded = codec.decode(blob)?;
            ensure_signed(&decoded)?;
            blob.trim().to_string()
        }
        SignedTxInput::Transaction(tx) => {
            ensure_signed(tx)?;
            codec.encode(tx)?
        }
    };

    transaction_id(engine, &blob)
}

/// Transaction ID of an already-encoded blob: `TXN\0` digest as uppercase hex.
///
/// No signing check is made; callers that accept arbitrary input use
/// [`hash_signed_tx`].
pub fn transaction_id(engine: &dyn HashingEngine, blob_hex: &str) -> SignerResult<String> {
    let bytes = hex::decode(blob_hex)?;
    let hash = engine.prefixed_digest(HashPrefix::TransactionId, &bytes);
    Ok(hex::encode_upper(hash))
}

pub(crate) fn ensure_signed(tx: &Transaction) -> SignerResult<()> {
    if tx.has_signing_fields() {
        Ok(())
    } else {
        Err(SignerError::validation("The transaction must be signed to hash it."))
    }
}
