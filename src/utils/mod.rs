//! Utilities Module
//!
//! Configuration, decimal handling and logging shared across the crate.

pub mod config;
pub mod decimal;
pub mod logging;

pub use config::{Network, SignerConfig};
pub use decimal::{parse_decimal, DecimalError, DecimalNormalizer, RoundingMode};
pub use logging::{init_logging, redact_address, redact_hash, redact_value};
