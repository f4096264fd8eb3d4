//! Ledger binary codec
//!
//! Canonical serialization is delegated to `xrpl::core::binarycodec`, which
//! carries the full published field definitions. This module adapts it to
//! the signer's [`Transaction`] type: X-addresses are reduced to classic
//! form first, hex payloads come back as bytes, and the library's errors
//! become [`CodecError`]s.
//!
//! Outputs:
//! - the full signed blob
//! - the single-signer signing payload (`STX\0` prefix, signing fields only)
//! - the per-signer multisigning payload (`SMT\0` prefix, signing fields,
//!   then the signer's AccountID)

pub mod definitions;

use std::sync::Arc;

use serde_json::{json, Map, Value};
use thiserror::Error;
use xrpl::core::binarycodec;

use crate::types::Transaction;
use crate::wallet::address::{is_valid_x_address, resolve_classic_address, x_address_to_classic_address};

pub use definitions::{Definitions, FieldInfo};

/// Codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown transaction type {0:?}")]
    UnknownTransactionType(String),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("ledger codec: {0}")]
    Ledger(String),

    #[error("invalid hex blob: {0}")]
    InvalidHex(String),

    #[error("invalid definitions: {0}")]
    Definitions(String),

    #[error("transaction is not representable as JSON: {0}")]
    Json(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

fn ledger_error(err: impl std::fmt::Display) -> CodecError {
    CodecError::Ledger(err.to_string())
}

/// Binary encoding seam used by the signing pipeline.
///
/// Every method takes optional definitions restricting what may be encoded.
pub trait BinaryCodec: Send + Sync {
    /// Full canonical encoding as uppercase hex.
    fn encode_with(&self, tx: &Transaction, definitions: Option<&Definitions>) -> CodecResult<String>;

    fn decode_with(&self, blob: &str, definitions: Option<&Definitions>) -> CodecResult<Transaction>;

    /// `STX\0` followed by the signing fields.
    fn encode_for_signing(&self, tx: &Transaction, definitions: Option<&Definitions>) -> CodecResult<Vec<u8>>;

    /// `SMT\0`, the signing fields, then the signer's 20-byte AccountID.
    ///
    /// `SigningPubKey` must be present and empty.
    fn encode_for_multisigning(
        &self,
        tx: &Transaction,
        signer_account: &str,
        definitions: Option<&Definitions>,
    ) -> CodecResult<Vec<u8>>;

    fn encode(&self, tx: &Transaction) -> CodecResult<String> {
        self.encode_with(tx, None)
    }

    fn decode(&self, blob: &str) -> CodecResult<Transaction> {
        self.decode_with(blob, None)
    }
}

/// Whether the ledger codec can serialize transactions of this type.
pub fn is_known_transaction_type(name: &str) -> bool {
    binarycodec::encode(&json!({ "TransactionType": name })).is_ok()
}

/// Codec backed by the ledger's published definitions.
///
/// Definitions given to [`XrplBinaryCodec::new`] apply to every call that
/// does not pass its own.
#[derive(Debug, Clone, Default)]
pub struct XrplBinaryCodec {
    definitions: Option<Arc<Definitions>>,
}

impl XrplBinaryCodec {
    pub fn new(definitions: Definitions) -> Self {
        Self {
            definitions: Some(Arc::new(definitions)),
        }
    }

    pub fn definitions(&self) -> Option<&Definitions> {
        self.definitions.as_deref()
    }

    /// JSON object handed to the ledger codec.
    fn prepare(&self, tx: &Transaction, definitions: Option<&Definitions>) -> CodecResult<Value> {
        let object = tx.to_json_map().map_err(|e| CodecError::Json(e.to_string()))?;
        let object = resolve_x_addresses(object)?;

        if let Some(definitions) = definitions.or(self.definitions.as_deref()) {
            definitions.check_object(&object)?;
        } else if !is_known_transaction_type(&tx.transaction_type) {
            return Err(CodecError::UnknownTransactionType(tx.transaction_type.clone()));
        }
        Ok(Value::Object(object))
    }
}

/// Replace X-addresses in `Account` and `Destination` with classic ones,
/// moving their tags into `SourceTag` and `DestinationTag`.
fn resolve_x_addresses(object: Map<String, Value>) -> CodecResult<Map<String, Value>> {
    let mut resolved = object.clone();
    for (field, tag_field) in [("Account", "SourceTag"), ("Destination", "DestinationTag")] {
        let Some(Value::String(address)) = object.get(field) else {
            continue;
        };
        if !is_valid_x_address(address) {
            continue;
        }
        let decoded = x_address_to_classic_address(address).map_err(|e| CodecError::InvalidField {
            field: field.to_string(),
            reason: e.to_string(),
        })?;
        resolved.insert(field.to_string(), Value::String(decoded.classic_address));
        if let Some(tag) = decoded.tag {
            if object.contains_key(tag_field) {
                return Err(CodecError::InvalidField {
                    field: tag_field.to_string(),
                    reason: format!("cannot combine {} with a tagged {} X-address", tag_field, field),
                });
            }
            resolved.insert(tag_field.to_string(), Value::from(tag));
        }
    }
    Ok(resolved)
}

fn hex_bytes(encoded: &str) -> CodecResult<Vec<u8>> {
    hex::decode(encoded).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

impl BinaryCodec for XrplBinaryCodec {
    fn encode_with(&self, tx: &Transaction, definitions: Option<&Definitions>) -> CodecResult<String> {
        let object = self.prepare(tx, definitions)?;
        let blob = binarycodec::encode(&object).map_err(ledger_error)?;
        Ok(blob.to_ascii_uppercase())
    }

    fn decode_with(&self, blob: &str, definitions: Option<&Definitions>) -> CodecResult<Transaction> {
        let blob = blob.trim();
        hex_bytes(blob)?;

        let decoded = binarycodec::decode(blob).map_err(ledger_error)?;
        let value = serde_json::to_value(decoded).map_err(|e| CodecError::Json(e.to_string()))?;
        let object = match value {
            Value::Object(object) => object,
            other => return Err(CodecError::Json(format!("expected an object, got {}", other))),
        };

        if let Some(definitions) = definitions.or(self.definitions.as_deref()) {
            definitions.check_object(&object)?;
        }
        Transaction::from_json_map(object).map_err(|e| CodecError::Json(e.to_string()))
    }

    fn encode_for_signing(&self, tx: &Transaction, definitions: Option<&Definitions>) -> CodecResult<Vec<u8>> {
        let object = self.prepare(tx, definitions)?;
        hex_bytes(&binarycodec::encode_for_signing(&object).map_err(ledger_error)?)
    }

    fn encode_for_multisigning(
        &self,
        tx: &Transaction,
        signer_account: &str,
        definitions: Option<&Definitions>,
    ) -> CodecResult<Vec<u8>> {
        if tx.signing_pub_key.as_deref() != Some("") {
            return Err(CodecError::InvalidField {
                field: "SigningPubKey".into(),
                reason: "must be empty when multisigning".into(),
            });
        }
        let signer = resolve_classic_address(signer_account).map_err(|e| CodecError::InvalidField {
            field: "Account".into(),
            reason: e.to_string(),
        })?;

        let object = self.prepare(tx, definitions)?;
        let payload = binarycodec::encode_for_multisigning(&object, signer.as_str().into()).map_err(ledger_error)?;
        hex_bytes(&payload)
    }
}
