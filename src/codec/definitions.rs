//! Definitions overrides
//!
//! The ledger codec ships with the full published `definitions.json`. A
//! caller can load another copy of that document to restrict what gets
//! signed: transaction types and fields missing from it are refused before
//! any bytes are produced.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CodecError, CodecResult};

/// One field entry of a definitions document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub nth: i32,
    #[serde(rename = "type")]
    pub type_name: String,
    pub is_serialized: bool,
    pub is_signing_field: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawDefinitions {
    fields: Vec<(String, FieldInfo)>,
    transaction_types: HashMap<String, i32>,
}

/// Field and transaction-type names allowed in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definitions {
    fields: HashMap<String, FieldInfo>,
    transaction_types: HashMap<String, u16>,
}

impl Definitions {
    /// Parse a `definitions.json` document.
    ///
    /// Negative transaction type codes (`Invalid`) are left out.
    pub fn from_json(json: &str) -> CodecResult<Self> {
        let raw: RawDefinitions =
            serde_json::from_str(json).map_err(|e| CodecError::Definitions(e.to_string()))?;

        let transaction_types = raw
            .transaction_types
            .into_iter()
            .filter_map(|(name, code)| u16::try_from(code).ok().map(|code| (name, code)))
            .collect();

        Ok(Self {
            fields: raw.fields.into_iter().collect(),
            transaction_types,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> CodecResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CodecError::Definitions(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn transaction_type_code(&self, name: &str) -> Option<u16> {
        self.transaction_types.get(name).copied()
    }

    /// Refuse a transaction object that uses a type or top-level field this
    /// document does not define as serialized.
    pub fn check_object(&self, object: &Map<String, Value>) -> CodecResult<()> {
        let transaction_type = object
            .get("TransactionType")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::InvalidField {
                field: "TransactionType".into(),
                reason: "missing".into(),
            })?;
        if self.transaction_type_code(transaction_type).is_none() {
            return Err(CodecError::UnknownTransactionType(transaction_type.to_string()));
        }

        for name in object.keys() {
            match self.fields.get(name) {
                Some(info) if info.is_serialized => {}
                _ => {
                    return Err(CodecError::InvalidField {
                        field: name.clone(),
                        reason: "not a serialized field in the configured definitions".into(),
                    })
                }
            }
        }
        Ok(())
    }
}
