//! Cryptographic primitives for the signer
//!
//! - Domain-separated SHA-512-half hashing (transaction IDs, signing digests)
//! - ECDSA `(r, s)` handling and DER encoding strategies

pub mod der;
pub mod hashes;

pub use der::{
    decode_der, decode_der_hex, parse_scalar, DerEncoder, DerStrategy, ManualDer, RawSignature,
    ScalarFormat, Secp256k1Der,
};
pub use hashes::{
    compute_hash, hash_signed_tx, hash_signed_tx_with, sha512_half, HashPrefix, HashingEngine,
    Sha512HalfEngine, SignedTxInput, transaction_id, HASH_BYTES,
};
