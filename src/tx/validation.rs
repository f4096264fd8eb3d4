//! Field-level transaction validation
//!
//! Checks the shape of common fields and the required fields of the
//! transaction types with dedicated rules before anything is serialized or
//! signed. Every other type the ledger codec knows gets the common checks.

use serde_json::{Map, Value};

use crate::codec::{is_known_transaction_type, Definitions};
use crate::error::{SignerError, SignerResult};
use crate::types::Transaction;
use crate::utils::decimal::parse_decimal;
use crate::wallet::address::{is_valid_classic_address, is_valid_x_address};

/// `tfPartialPayment`
pub const PARTIAL_PAYMENT_FLAG: u64 = 0x0002_0000;
pub const MAX_TICKET_COUNT: u64 = 250;
pub const MAX_SIGNER_ENTRIES: usize = 32;

/// Validation seam consulted before signing.
pub trait TransactionValidator: Send + Sync {
    fn validate(&self, tx: &Transaction) -> SignerResult<()>;
}

/// Accepts everything. Useful when the caller validates upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl TransactionValidator for NoopValidator {
    fn validate(&self, _tx: &Transaction) -> SignerResult<()> {
        Ok(())
    }
}

/// Built-in schema checks.
///
/// Transaction types are resolved against the ledger codec, or against a
/// definitions document when one is given.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    definitions: Option<Definitions>,
}

impl SchemaValidator {
    pub fn new(definitions: Definitions) -> Self {
        Self {
            definitions: Some(definitions),
        }
    }

    fn knows(&self, transaction_type: &str) -> bool {
        match &self.definitions {
            Some(definitions) => definitions.transaction_type_code(transaction_type).is_some(),
            None => is_known_transaction_type(transaction_type),
        }
    }
}

impl TransactionValidator for SchemaValidator {
    fn validate(&self, tx: &Transaction) -> SignerResult<()> {
        let map = tx.to_json_map()?;
        let fields = Fields {
            tx_type: &tx.transaction_type,
            map: &map,
        };

        if !self.knows(&tx.transaction_type) {
            return Err(SignerError::validation(format!(
                "Invalid field TransactionType: {}",
                tx.transaction_type
            )));
        }

        validate_common(&fields)?;

        match tx.transaction_type.as_str() {
            "Payment" => validate_payment(&fields),
            "TrustSet" => validate_trust_set(&fields),
            "OfferCreate" => validate_offer_create(&fields),
            "OfferCancel" => fields.require("OfferSequence", is_u32).map(|_| ()),
            "AccountSet" => validate_account_set(&fields),
            "SetRegularKey" => fields.optional("RegularKey", is_address),
            "AccountDelete" => {
                fields.require("Destination", is_address)?;
                fields.optional("DestinationTag", is_u32)
            }
            "EscrowCreate" => validate_escrow_create(&fields),
            "EscrowFinish" => {
                validate_escrow_reference(&fields)?;
                fields.optional("Condition", is_hex)?;
                fields.optional("Fulfillment", is_hex)
            }
            "EscrowCancel" => validate_escrow_reference(&fields),
            "TicketCreate" => {
                let count = fields.require("TicketCount", is_u32)?;
                match count.as_u64() {
                    Some(1..=MAX_TICKET_COUNT) => Ok(()),
                    _ => Err(fields.invalid("TicketCount")),
                }
            }
            "SignerListSet" => validate_signer_list_set(&fields),
            _ => Ok(()),
        }
    }
}

struct Fields<'a> {
    tx_type: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn missing(&self, key: &str) -> SignerError {
        SignerError::validation(format!("{}: missing field {}", self.tx_type, key))
    }

    fn invalid(&self, key: &str) -> SignerError {
        SignerError::validation(format!("{}: invalid field {}", self.tx_type, key))
    }

    fn require(&self, key: &str, check: fn(&Value) -> bool) -> SignerResult<&'a Value> {
        let value = self.get(key).ok_or_else(|| self.missing(key))?;
        if check(value) {
            Ok(value)
        } else {
            Err(self.invalid(key))
        }
    }

    fn optional(&self, key: &str, check: fn(&Value) -> bool) -> SignerResult<()> {
        match self.get(key) {
            Some(value) if !check(value) => Err(self.invalid(key)),
            _ => Ok(()),
        }
    }
}

// MARK: - Value checks

fn is_u32(value: &Value) -> bool {
    value.as_u64().map_or(false, |n| n <= u64::from(u32::MAX))
}

fn is_drops(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
}

fn is_issued_amount(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let text = |key: &str| obj.get(key).and_then(Value::as_str);
    matches!(
        (text("currency"), text("issuer"), text("value")),
        (Some(currency), Some(issuer), Some(amount))
            if !currency.is_empty()
                && is_valid_classic_address(issuer)
                && parse_decimal(amount).is_ok()
    )
}

fn is_amount(value: &Value) -> bool {
    is_drops(value) || is_issued_amount(value)
}

fn is_address(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| is_valid_classic_address(s) || is_valid_x_address(s))
}

fn is_hex(value: &Value) -> bool {
    value
        .as_str()
        .map_or(false, |s| s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit()))
}

fn is_hash256(value: &Value) -> bool {
    is_hex(value) && value.as_str().map_or(false, |s| s.len() == 64)
}

fn is_memo(value: &Value) -> bool {
    let Some(memo) = value.get("Memo").and_then(Value::as_object) else {
        return false;
    };
    value.as_object().map_or(false, |o| o.len() == 1)
        && memo.keys().all(|k| matches!(k.as_str(), "MemoType" | "MemoData" | "MemoFormat"))
        && memo.values().all(is_hex)
}

fn is_signer_entry(value: &Value) -> bool {
    let Some(entry) = value.get("SignerEntry").and_then(Value::as_object) else {
        return false;
    };
    entry.get("Account").map_or(false, is_address)
        && entry
            .get("SignerWeight")
            .and_then(Value::as_u64)
            .map_or(false, |w| w <= u64::from(u16::MAX))
}

// MARK: - Rules

fn validate_common(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("Account", is_address)?;
    fields.optional("Fee", is_drops)?;
    for key in ["Sequence", "Flags", "LastLedgerSequence", "SourceTag", "TicketSequence", "NetworkID"] {
        fields.optional(key, is_u32)?;
    }
    fields.optional("AccountTxnID", is_hash256)?;
    fields.optional("SigningPubKey", is_hex)?;
    fields.optional("Memos", |v| v.as_array().map_or(false, |memos| memos.iter().all(is_memo)))
}

fn validate_payment(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("Amount", is_amount)?;
    fields.require("Destination", is_address)?;
    fields.optional("DestinationTag", is_u32)?;
    fields.optional("SendMax", is_amount)?;
    fields.optional("InvoiceID", is_hash256)?;
    fields.optional("Paths", Value::is_array)?;

    if fields.get("DeliverMin").is_some() {
        fields.require("DeliverMin", is_amount)?;
        let flags = fields.get("Flags").and_then(Value::as_u64).unwrap_or(0);
        if flags & PARTIAL_PAYMENT_FLAG == 0 {
            return Err(SignerError::validation(
                "Payment: tfPartialPayment flag required with DeliverMin",
            ));
        }
    }
    Ok(())
}

fn validate_trust_set(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("LimitAmount", is_issued_amount)?;
    fields.optional("QualityIn", is_u32)?;
    fields.optional("QualityOut", is_u32)
}

fn validate_offer_create(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("TakerGets", is_amount)?;
    fields.require("TakerPays", is_amount)?;
    fields.optional("Expiration", is_u32)?;
    fields.optional("OfferSequence", is_u32)
}

fn validate_account_set(fields: &Fields<'_>) -> SignerResult<()> {
    fields.optional("SetFlag", is_u32)?;
    fields.optional("ClearFlag", is_u32)?;
    fields.optional("Domain", is_hex)?;
    fields.optional("TransferRate", |v| {
        v.as_u64()
            .map_or(false, |rate| rate == 0 || (1_000_000_000..=2_000_000_000).contains(&rate))
    })
}

fn validate_escrow_create(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("Amount", is_drops)?;
    fields.require("Destination", is_address)?;
    fields.optional("DestinationTag", is_u32)?;
    fields.optional("CancelAfter", is_u32)?;
    fields.optional("FinishAfter", is_u32)?;
    fields.optional("Condition", is_hex)?;

    if fields.get("CancelAfter").is_none() && fields.get("FinishAfter").is_none() {
        return Err(SignerError::validation(
            "EscrowCreate: Either CancelAfter or FinishAfter must be specified",
        ));
    }
    if fields.get("FinishAfter").is_none() && fields.get("Condition").is_none() {
        return Err(SignerError::validation(
            "EscrowCreate: Either Condition or FinishAfter must be specified",
        ));
    }
    Ok(())
}

fn validate_escrow_reference(fields: &Fields<'_>) -> SignerResult<()> {
    fields.require("Owner", is_address)?;
    fields.require("OfferSequence", is_u32).map(|_| ())
}

fn validate_signer_list_set(fields: &Fields<'_>) -> SignerResult<()> {
    let quorum = fields.require("SignerQuorum", is_u32)?;
    let entries = fields.get("SignerEntries");

    if quorum.as_u64() == Some(0) {
        return match entries {
            None => Ok(()),
            Some(_) => Err(SignerError::validation(
                "SignerListSet: SignerEntries must be empty when SignerQuorum is 0",
            )),
        };
    }

    let entries = fields.require("SignerEntries", Value::is_array)?;
    match entries.as_array() {
        Some(list) if !list.is_empty() && list.len() <= MAX_SIGNER_ENTRIES && list.iter().all(is_signer_entry) => {
            Ok(())
        }
        _ => Err(fields.invalid("SignerEntries")),
    }
}
