//! Unified error types for the signer
//!
//! Every failure surfaced by the signing pipeline is one of three kinds:
//! validation of the caller's input, encoding (codec or DER), or a failure
//! reported by the remote signing service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::CodecError;

/// Boxed error produced by a remote signing backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all signer operations
#[derive(Debug, Error)]
pub enum SignerError {
    /// Malformed or already-signed input, or an unsigned transaction passed to hashing.
    #[error("validation error: {0}")]
    Validation(String),

    /// Codec or DER encoding failure on otherwise valid-looking data.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Any failure reported by the remote signer, kept as the original source.
    #[error("signing service error: {0}")]
    SigningService(#[source] BackendError),
}

impl SignerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn signing_service(err: impl Into<BackendError>) -> Self {
        Self::SigningService(err.into())
    }

    /// Stable category for callers that report errors as data.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Encoding(_) => ErrorCode::EncodingError,
            Self::SigningService(_) => ErrorCode::SigningServiceError,
        }
    }

    /// Serializable view of the error.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    EncodingError,
    SigningServiceError,
}

/// Flattened error suitable for JSON responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

/// Result type alias for signer operations
pub type SignerResult<T> = Result<T, SignerError>;

impl From<CodecError> for SignerError {
    fn from(e: CodecError) -> Self {
        SignerError::Encoding(e.to_string())
    }
}

impl From<hex::FromHexError> for SignerError {
    fn from(e: hex::FromHexError) -> Self {
        SignerError::Validation(format!("invalid hex: {}", e))
    }
}

impl From<serde_json::Error> for SignerError {
    fn from(e: serde_json::Error) -> Self {
        SignerError::Validation(format!("malformed transaction: {}", e))
    }
}
