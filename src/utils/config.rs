//! Signer Configuration
//!
//! Centralized settings for the signing pipeline:
//! - Presets (standard, testnet)
//! - Loading from JSON or `XRPL_SIGNER_*` environment variables
//! - Validation of settings before a wallet is built from them

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::crypto::der::{DerStrategy, ScalarFormat};
use crate::error::{SignerError, SignerResult};
use crate::utils::decimal::{DecimalNormalizer, RoundingMode};

pub const ENV_NETWORK: &str = "XRPL_SIGNER_NETWORK";
pub const ENV_DER: &str = "XRPL_SIGNER_DER";
pub const ENV_SCALAR_FORMAT: &str = "XRPL_SIGNER_SCALAR_FORMAT";
pub const ENV_DEFINITIONS: &str = "XRPL_SIGNER_DEFINITIONS";
pub const ENV_LOG: &str = "XRPL_SIGNER_LOG";
pub const ENV_JSON_LOGS: &str = "XRPL_SIGNER_JSON_LOGS";
pub const ENV_MAX_DIGITS: &str = "XRPL_SIGNER_MAX_DIGITS";
pub const ENV_ROUNDING: &str = "XRPL_SIGNER_ROUNDING";

/// Network an address is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn is_test(self) -> bool {
        self == Network::Testnet
    }
}

/// Signer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Network flag used for X-addresses
    pub network: Network,
    /// How `(r, s)` becomes DER
    pub der_strategy: DerStrategy,
    /// How the remote signer renders `r` and `s`
    pub scalar_format: ScalarFormat,
    /// Issued-amount normalization
    pub normalizer: DecimalNormalizer,
    /// Optional `definitions.json` restricting accepted types and fields
    pub definitions_path: Option<PathBuf>,
    /// `EnvFilter` directive
    pub log_filter: String,
    pub json_logs: bool,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl SignerConfig {
    /// Mainnet preset
    pub fn standard() -> Self {
        Self {
            network: Network::Mainnet,
            der_strategy: DerStrategy::Secp256k1,
            scalar_format: ScalarFormat::Auto,
            normalizer: DecimalNormalizer::default(),
            definitions_path: None,
            log_filter: "info".to_string(),
            json_logs: false,
        }
    }

    /// Testnet preset with verbose logging
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            log_filter: "debug".to_string(),
            ..Self::standard()
        }
    }

    pub fn from_json_str(json: &str) -> SignerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SignerError::validation(format!("invalid signer config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SignerResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SignerError::validation(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Standard preset overridden by `XRPL_SIGNER_*` variables.
    pub fn from_env() -> SignerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Standard preset overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SignerResult<Self> {
        let mut config = Self::standard();

        if let Some(value) = lookup(ENV_NETWORK) {
            config.network = parse_named(ENV_NETWORK, &value)?;
        }
        if let Some(value) = lookup(ENV_DER) {
            config.der_strategy = parse_named(ENV_DER, &value)?;
        }
        if let Some(value) = lookup(ENV_SCALAR_FORMAT) {
            config.scalar_format = parse_named(ENV_SCALAR_FORMAT, &value)?;
        }
        if let Some(value) = lookup(ENV_ROUNDING) {
            config.normalizer.rounding = parse_named::<RoundingMode>(ENV_ROUNDING, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_DIGITS) {
            let digits = value
                .trim()
                .parse::<usize>()
                .map_err(|_| SignerError::validation(format!("{} must be a positive integer", ENV_MAX_DIGITS)))?;
            config.normalizer.max_significant_digits = Some(digits);
        }
        if let Some(value) = lookup(ENV_DEFINITIONS) {
            config.definitions_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.log_filter = value;
        }
        if let Some(value) = lookup(ENV_JSON_LOGS) {
            config.json_logs = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings a wallet cannot be built from.
    pub fn validate(&self) -> SignerResult<()> {
        if self.normalizer.max_significant_digits == Some(0) {
            return Err(SignerError::validation("max_significant_digits must be at least 1"));
        }
        if self.normalizer.exponential_below >= self.normalizer.exponential_above {
            return Err(SignerError::validation(
                "exponential_below must be smaller than exponential_above",
            ));
        }
        if let Some(path) = &self.definitions_path {
            if !path.is_file() {
                return Err(SignerError::validation(format!(
                    "definitions file {} does not exist",
                    path.display()
                )));
            }
        }
        EnvFilter::try_new(&self.log_filter)
            .map_err(|e| SignerError::validation(format!("invalid log filter {:?}: {}", self.log_filter, e)))?;
        Ok(())
    }
}

fn parse_named<T: DeserializeOwned>(key: &str, value: &str) -> SignerResult<T> {
    serde_json::from_value(Value::String(value.trim().to_ascii_lowercase()))
        .map_err(|_| SignerError::validation(format!("unsupported value {:?} for {}", value, key)))
}
