//! Signing Pre-Image Generation
//!
//! Builds the bytes a signer commits to and the 32-byte digest sent to the
//! remote signer.

use serde::{Deserialize, Serialize};

use crate::codec::{BinaryCodec, Definitions};
use crate::crypto::hashes::{HashPrefix, HashingEngine, HASH_BYTES};
use crate::error::SignerResult;
use crate::types::Transaction;

/// Single signature or one contribution to a multisignature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningMode {
    Single,
    /// `account` is the classic address the signature is bound to.
    Multisign { account: String },
}

impl SigningMode {
    pub fn is_multisign(&self) -> bool {
        matches!(self, Self::Multisign { .. })
    }

    pub fn signer_account(&self) -> Option<&str> {
        match self {
            Self::Single => None,
            Self::Multisign { account } => Some(account),
        }
    }

    /// Domain prefix the payload starts with.
    pub fn prefix(&self) -> HashPrefix {
        match self {
            Self::Single => HashPrefix::TransactionSign,
            Self::Multisign { .. } => HashPrefix::TransactionMultisign,
        }
    }
}

/// A signing payload together with its digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPreimage {
    /// Prefix followed by the signing fields (and signer AccountID when multisigning)
    pub payload: Vec<u8>,
    /// SHA-512 half of `payload`
    pub digest: [u8; HASH_BYTES],
    pub mode: SigningMode,
}

impl SigningPreimage {
    /// Encode `tx` for the given mode and hash it.
    ///
    /// The codec output already begins with the domain prefix, so the digest
    /// is a plain half digest of the payload.
    pub fn build(
        codec: &dyn BinaryCodec,
        hasher: &dyn HashingEngine,
        tx: &Transaction,
        mode: SigningMode,
        definitions: Option<&Definitions>,
    ) -> SignerResult<Self> {
        let payload = match &mode {
            SigningMode::Single => codec.encode_for_signing(tx, definitions)?,
            SigningMode::Multisign { account } => {
                codec.encode_for_multisigning(tx, account, definitions)?
            }
        };
        let digest = hasher.half_digest(&payload);

        Ok(Self {
            payload,
            digest,
            mode,
        })
    }

    pub fn prefix(&self) -> HashPrefix {
        self.mode.prefix()
    }

    /// Digest as uppercase hex
    pub fn digest_hex(&self) -> String {
        hex::encode_upper(self.digest)
    }
}
