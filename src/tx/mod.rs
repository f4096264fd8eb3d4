//! Transaction Module
//!
//! Canonicalization and schema validation of transactions before signing.

pub mod canonical;
pub mod validation;

pub use canonical::{canonicalize, Canonicalizer};
pub use validation::{NoopValidator, SchemaValidator, TransactionValidator};
