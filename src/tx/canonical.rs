//! Transaction canonicalization
//!
//! Produces the cleaned copy every signing call works from. The caller's
//! transaction is never touched.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::validation::{SchemaValidator, TransactionValidator};
use crate::error::{SignerError, SignerResult};
use crate::types::{Amount, Transaction};
use crate::utils::decimal::DecimalNormalizer;

#[derive(Clone)]
pub struct Canonicalizer {
    normalizer: DecimalNormalizer,
    validator: Arc<dyn TransactionValidator>,
}

impl fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(DecimalNormalizer::default(), Arc::new(SchemaValidator::default()))
    }
}

impl Canonicalizer {
    pub fn new(normalizer: DecimalNormalizer, validator: Arc<dyn TransactionValidator>) -> Self {
        Self {
            normalizer,
            validator,
        }
    }

    pub fn with_normalizer(mut self, normalizer: DecimalNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn TransactionValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn normalizer(&self) -> &DecimalNormalizer {
        &self.normalizer
    }

    /// Clean, check and validate a transaction.
    ///
    /// 1. top-level null fields are dropped, remaining keys keep their order
    /// 2. transactions already carrying `TxnSignature` or `Signers` are rejected
    /// 3. a Payment's issued `Amount.value` loses insignificant trailing zeros
    /// 4. the validator runs on the result
    pub fn canonicalize(&self, tx: &Transaction) -> SignerResult<Transaction> {
        let mut map = tx.to_json_map()?;
        map.retain(|_, value| !value.is_null());

        if map.contains_key("TxnSignature") || map.contains_key("Signers") {
            return Err(SignerError::validation(
                "txJSON must not contain \"TxnSignature\" or \"Signers\" properties",
            ));
        }

        let mut clean = Transaction::from_json_map(map)?;
        self.strip_trailing_zeros(&mut clean)?;
        self.validator.validate(&clean)?;

        debug!(tx_type = %clean.transaction_type, "transaction canonicalized");
        Ok(clean)
    }

    fn strip_trailing_zeros(&self, tx: &mut Transaction) -> SignerResult<()> {
        if tx.transaction_type != "Payment" {
            return Ok(());
        }
        if let Some(Amount::Issued(amount)) = tx.amount.as_mut() {
            if amount.value.contains('.') && amount.value.ends_with('0') {
                amount.value = self
                    .normalizer
                    .normalize(&amount.value)
                    .map_err(|e| SignerError::validation(format!("Payment: invalid field Amount: {}", e)))?;
            }
        }
        Ok(())
    }
}

/// [`Canonicalizer::canonicalize`] with default settings.
pub fn canonicalize(tx: &Transaction) -> SignerResult<Transaction> {
    Canonicalizer::default().canonicalize(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::validation::NoopValidator;
    use serde_json::json;

    const ACCOUNT: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";
    const DESTINATION: &str = "rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe";

    fn issued_payment(value: &str) -> Transaction {
        serde_json::from_value(json!({
            "TransactionType": "Payment",
            "Account": ACCOUNT,
            "Destination": DESTINATION,
            "Amount": {"currency": "USD", "issuer": DESTINATION, "value": value},
            "Fee": "12",
            "Sequence": 1
        }))
        .unwrap()
    }

    fn amount_value(tx: &Transaction) -> &str {
        match &tx.amount {
            Some(Amount::Issued(a)) => &a.value,
            other => panic!("unexpected amount {:?}", other),
        }
    }

    #[test]
    fn test_trailing_zero_law() {
        for (input, expected) in [("123.4000", "123.4"), ("100.000", "100"), ("0.0", "0"), ("1.5", "1.5"), ("1000", "1000")] {
            let clean = canonicalize(&issued_payment(input)).unwrap();
            assert_eq!(amount_value(&clean), expected, "{input}");
        }
    }

    #[test]
    fn test_input_is_not_mutated() {
        let tx = issued_payment("5.50");
        let clean = canonicalize(&tx).unwrap();
        assert_eq!(amount_value(&tx), "5.50");
        assert_eq!(amount_value(&clean), "5.5");
    }

    #[test]
    fn test_nulls_are_dropped_in_order() {
        let tx: Transaction = serde_json::from_value(json!({
            "TransactionType": "Payment",
            "Account": ACCOUNT,
            "Memos": null,
            "Destination": DESTINATION,
            "InvoiceID": null,
            "Amount": "10",
            "Sequence": 4,
            "Fee": "10"
        }))
        .unwrap();

        let clean = canonicalize(&tx).unwrap();
        let keys: Vec<&str> = clean.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Destination", "Sequence", "Fee"]);
    }

    #[test]
    fn test_input_key_order_is_kept() {
        let tx = Transaction::from_json(&format!(
            r#"{{"Destination":"{DESTINATION}","Fee":"12","Memos":null,"Amount":"10",
                "TransactionType":"Payment","Account":"{ACCOUNT}"}}"#
        ))
        .unwrap();

        let clean = canonicalize(&tx).unwrap();
        let map = clean.to_json_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Destination", "Fee", "Amount", "TransactionType", "Account"]);
    }

    #[test]
    fn test_signed_input_rejected() {
        let mut tx = issued_payment("1");
        tx.txn_signature = Some("3045".into());
        assert!(matches!(canonicalize(&tx), Err(SignerError::Validation(_))));

        let mut tx = issued_payment("1");
        tx.signers = Some(Vec::new());
        assert!(matches!(canonicalize(&tx), Err(SignerError::Validation(_))));
    }

    #[test]
    fn test_only_payments_are_normalized() {
        let tx: Transaction = serde_json::from_value(json!({
            "TransactionType": "OfferCreate",
            "Account": ACCOUNT,
            "Amount": {"currency": "USD", "issuer": DESTINATION, "value": "2.50"}
        }))
        .unwrap();
        let canonicalizer = Canonicalizer::default().with_validator(Arc::new(NoopValidator));
        let clean = canonicalizer.canonicalize(&tx).unwrap();
        assert_eq!(amount_value(&clean), "2.50");
    }

    #[test]
    fn test_validation_failure_is_fatal() {
        let tx = Transaction::new("Payment", ACCOUNT);
        assert!(matches!(canonicalize(&tx), Err(SignerError::Validation(_))));
    }

    #[test]
    fn test_idempotent() {
        let once = canonicalize(&issued_payment("42.4200")).unwrap();
        assert_eq!(canonicalize(&once).unwrap(), once);
    }
}
