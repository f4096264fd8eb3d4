//! Shared types for the signer
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{SignerError, SignerResult};

// =============================================================================
// Amounts
// =============================================================================

/// A ledger amount: native drops or an issued-currency triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// Native currency as an integer string of drops.
    Drops(String),
    /// Issued currency.
    Issued(IssuedCurrencyAmount),
}

impl Amount {
    pub fn drops(value: impl Into<String>) -> Self {
        Self::Drops(value.into())
    }

    pub fn issued(
        currency: impl Into<String>,
        issuer: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Issued(IssuedCurrencyAmount {
            currency: currency.into(),
            issuer: issuer.into(),
            value: value.into(),
        })
    }
}

/// Non-native amount; `value` is a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCurrencyAmount {
    pub currency: String,
    pub issuer: String,
    pub value: String,
}

// =============================================================================
// Signers
// =============================================================================

/// One multisignature contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "SigningPubKey")]
    pub signing_pub_key: String,
    #[serde(rename = "TxnSignature")]
    pub txn_signature: String,
}

/// `{"Signer": {...}}` entry of the `Signers` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerWrapper {
    #[serde(rename = "Signer")]
    pub signer: Signer,
}

// =============================================================================
// Transactions
// =============================================================================

/// A ledger transaction.
///
/// The fields the signing pipeline reasons about are typed; everything else
/// lives in `fields`. The JSON view keeps the caller's key order across all
/// fields, typed or not. Key order does not take part in equality.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub transaction_type: String,
    pub account: String,
    pub amount: Option<Amount>,
    pub signing_pub_key: Option<String>,
    pub txn_signature: Option<String>,
    pub signers: Option<Vec<SignerWrapper>>,

    /// Remaining fields, in input order.
    pub fields: Map<String, Value>,

    key_order: Vec<String>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.transaction_type == other.transaction_type
            && self.account == other.account
            && self.amount == other.amount
            && self.signing_pub_key == other.signing_pub_key
            && self.txn_signature == other.txn_signature
            && self.signers == other.signers
            && self.fields == other.fields
    }
}

/// Remove a typed key; null counts as absent.
fn take_typed<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Result<Option<T>, serde_json::Error> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some),
    }
}

impl TryFrom<Map<String, Value>> for Transaction {
    type Error = serde_json::Error;

    fn try_from(mut map: Map<String, Value>) -> Result<Self, Self::Error> {
        let key_order = map.keys().cloned().collect();
        let missing = <serde_json::Error as serde::de::Error>::missing_field;
        let transaction_type = take_typed(&mut map, "TransactionType")?.ok_or_else(|| missing("TransactionType"))?;
        let account = take_typed(&mut map, "Account")?.ok_or_else(|| missing("Account"))?;

        Ok(Self {
            transaction_type,
            account,
            amount: take_typed(&mut map, "Amount")?,
            signing_pub_key: take_typed(&mut map, "SigningPubKey")?,
            txn_signature: take_typed(&mut map, "TxnSignature")?,
            signers: take_typed(&mut map, "Signers")?,
            fields: map,
            key_order,
        })
    }
}

impl<'de> Deserialize<'de> for Transaction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Self::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_map()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl Transaction {
    pub fn new(transaction_type: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            transaction_type: transaction_type.into(),
            account: account.into(),
            amount: None,
            signing_pub_key: None,
            txn_signature: None,
            signers: None,
            fields: Map::new(),
            key_order: Vec::new(),
        }
    }

    /// Parse a transaction from its JSON form.
    pub fn from_json(json: &str) -> SignerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a transaction from a JSON object, routing well-known keys to typed fields.
    pub fn from_json_map(map: Map<String, Value>) -> SignerResult<Self> {
        Ok(Self::try_from(map)?)
    }

    /// Flatten into a JSON object.
    ///
    /// Keys seen on input come first, in input order. Keys set later follow,
    /// typed fields before the extension map.
    pub fn to_json_map(&self) -> SignerResult<Map<String, Value>> {
        let mut natural = Map::new();
        natural.insert("TransactionType".into(), Value::String(self.transaction_type.clone()));
        natural.insert("Account".into(), Value::String(self.account.clone()));
        if let Some(amount) = &self.amount {
            natural.insert("Amount".into(), serde_json::to_value(amount)?);
        }
        if let Some(key) = &self.signing_pub_key {
            natural.insert("SigningPubKey".into(), Value::String(key.clone()));
        }
        if let Some(signature) = &self.txn_signature {
            natural.insert("TxnSignature".into(), Value::String(signature.clone()));
        }
        if let Some(signers) = &self.signers {
            natural.insert("Signers".into(), serde_json::to_value(signers)?);
        }
        for (key, value) in &self.fields {
            if natural.contains_key(key) {
                return Err(SignerError::validation(format!("field {} is set twice", key)));
            }
            natural.insert(key.clone(), value.clone());
        }

        if self.key_order.is_empty() {
            return Ok(natural);
        }
        let mut ordered = Map::new();
        for key in &self.key_order {
            if let Some(value) = natural.remove(key) {
                ordered.insert(key.clone(), value);
            }
        }
        ordered.extend(natural);
        Ok(ordered)
    }

    /// Builder-style field setter; see [`Transaction::set_field`].
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> SignerResult<Self> {
        self.set_field(key, value)?;
        Ok(self)
    }

    /// Set any field by its ledger name. Well-known names land in their typed slot.
    pub fn set_field(&mut self, key: &str, value: impl Into<Value>) -> SignerResult<()> {
        let mut map = self.to_json_map()?;
        map.insert(key.to_string(), value.into());
        *self = Self::from_json_map(map)?;
        Ok(())
    }

    /// Look up an extension field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// True when any of the fields that give a transaction a stable ID is present.
    pub fn has_signing_fields(&self) -> bool {
        self.txn_signature.is_some() || self.signers.is_some() || self.signing_pub_key.is_some()
    }

    pub fn is_multisigned(&self) -> bool {
        self.signers.as_ref().map(|s| !s.is_empty()).unwrap_or(false)
    }
}

/// Output of a signing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Hex of the fully-signed binary transaction.
    pub tx_blob: String,
    /// Transaction ID, 64 uppercase hex chars.
    pub hash: String,
}
