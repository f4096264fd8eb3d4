//! Remote Signer Capability
//!
//! The private key never lives in this crate. A [`RemoteSigner`] receives the
//! 32-byte signing digest and answers with the raw `(r, s)` pair as strings,
//! in whatever radix its transport uses.

use std::fmt;

use async_trait::async_trait;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

use crate::crypto::der::{RawSignature, ScalarFormat};
use crate::crypto::hashes::HASH_BYTES;
use crate::error::{BackendError, SignerError, SignerResult};
use crate::utils::logging::redact_value;

/// Threshold or custodial signing backend.
///
/// Errors are passed through to the caller untouched and the call is never
/// retried.
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn sign_digest(&self, digest: &[u8; HASH_BYTES]) -> Result<RemoteSignature, BackendError>;
}

/// Signature components as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSignature {
    pub r: String,
    pub s: String,
}

impl RemoteSignature {
    pub fn new(r: impl Into<String>, s: impl Into<String>) -> Self {
        Self {
            r: r.into(),
            s: s.into(),
        }
    }

    /// Normalize both components into integers.
    pub fn to_raw(&self, format: ScalarFormat) -> SignerResult<RawSignature> {
        RawSignature::parse(&self.r, &self.s, format)
    }
}

// MARK: - Local key

/// In-process secp256k1 key behind the [`RemoteSigner`] interface.
///
/// Meant for development and tests.
pub struct LocalKeySigner {
    secret: SecretKey,
    public: PublicKey,
    secp: Secp256k1<secp256k1::All>,
}

impl fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("secret", &redact_value(&hex::encode(self.secret.secret_bytes())))
            .field("public", &self.public_key_hex())
            .finish()
    }
}

impl LocalKeySigner {
    pub fn from_secret_bytes(bytes: &[u8]) -> SignerResult<Self> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| SignerError::validation(format!("invalid secret key: {}", e)))?;
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self { secret, public, secp })
    }

    pub fn from_secret_hex(secret_hex: &str) -> SignerResult<Self> {
        let bytes = hex::decode(secret_hex.trim().trim_start_matches("0x"))?;
        Self::from_secret_bytes(&bytes)
    }

    /// Fresh key from the thread RNG.
    pub fn random() -> Self {
        let secp = Secp256k1::new();
        let (secret, public) = secp.generate_keypair(&mut secp256k1::rand::thread_rng());
        Self { secret, public, secp }
    }

    /// Compressed public key, 66 uppercase hex chars.
    pub fn public_key_hex(&self) -> String {
        hex::encode_upper(self.public.serialize())
    }

    fn sign(&self, digest: &[u8; HASH_BYTES]) -> Signature {
        let message = Message::from_digest(*digest);
        self.secp.sign_ecdsa(&message, &self.secret)
    }
}

#[async_trait]
impl RemoteSigner for LocalKeySigner {
    async fn sign_digest(&self, digest: &[u8; HASH_BYTES]) -> Result<RemoteSignature, BackendError> {
        let compact = self.sign(digest).serialize_compact();
        Ok(RemoteSignature::new(
            hex::encode(&compact[..32]),
            hex::encode(&compact[32..]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::der::{DerEncoder, Secp256k1Der};
    use ethers_core::types::U256;

    const SECRET: &str = "1ACAAEDECE405B2A958212629E16F2EB46B153EEE94CDD350FDEFF52795525B7";

    #[test]
    fn test_remote_signature_formats() {
        let hex_sig = RemoteSignature::new("0x0a", "ff");
        let raw = hex_sig.to_raw(ScalarFormat::Auto).unwrap();
        assert_eq!(raw.r, U256::from(10u8));
        assert_eq!(raw.s, U256::from(255u8));

        let dec_sig = RemoteSignature::new("10", "255");
        assert_eq!(dec_sig.to_raw(ScalarFormat::Decimal).unwrap(), raw);

        let bad = RemoteSignature::new("", "1");
        assert!(matches!(bad.to_raw(ScalarFormat::Auto), Err(SignerError::SigningService(_))));
    }

    #[test]
    fn test_remote_signature_json() {
        let sig: RemoteSignature = serde_json::from_str(r#"{"r": "01", "s": "02"}"#).unwrap();
        assert_eq!(sig, RemoteSignature::new("01", "02"));
    }

    #[test]
    fn test_local_key_from_hex() {
        let signer = LocalKeySigner::from_secret_hex(SECRET).unwrap();
        let pk = signer.public_key_hex();
        assert_eq!(pk.len(), 66);
        assert!(pk.starts_with("02") || pk.starts_with("03"));
        assert!(!format!("{:?}", signer).contains(SECRET));

        assert!(LocalKeySigner::from_secret_hex("00").is_err());
        assert!(LocalKeySigner::from_secret_bytes(&[0u8; 32]).is_err());
    }

    #[tokio::test]
    async fn test_local_key_signs_low_s() {
        let signer = LocalKeySigner::random();
        let digest = [7u8; HASH_BYTES];
        let sig = signer.sign_digest(&digest).await.unwrap();

        let raw = sig.to_raw(ScalarFormat::Hex).unwrap();
        let der = Secp256k1Der.encode(&raw).unwrap();

        let secp = Secp256k1::verification_only();
        let parsed = Signature::from_der(&der).unwrap();
        let message = Message::from_digest(digest);
        assert!(secp.verify_ecdsa(&message, &parsed, &signer.public).is_ok());

        let mut normalized = parsed;
        normalized.normalize_s();
        assert_eq!(normalized, parsed);
    }
}
