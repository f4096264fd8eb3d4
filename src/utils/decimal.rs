//! Decimal strings for issued-currency values
//!
//! Arithmetic and rounding are done by `bigdecimal`, which covers the whole
//! range of ledger amounts (exponents -96 to 80). This module only checks
//! the accepted grammar and renders values the way ledger tooling prints
//! numbers.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest exponent accepted, in digits.
const MAX_EXPONENT_DIGITS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("invalid decimal string {0:?}")]
    Invalid(String),
}

/// How digits beyond the precision limit are folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Truncate toward zero
    Down,
    /// Half away from zero
    #[default]
    HalfUp,
    /// Half to even (banker's rounding)
    HalfEven,
}

impl From<RoundingMode> for bigdecimal::RoundingMode {
    fn from(mode: RoundingMode) -> Self {
        match mode {
            RoundingMode::Down => bigdecimal::RoundingMode::Down,
            RoundingMode::HalfUp => bigdecimal::RoundingMode::HalfUp,
            RoundingMode::HalfEven => bigdecimal::RoundingMode::HalfEven,
        }
    }
}

/// Parse `[+-]digits[.digits][e[+-]digits]`.
///
/// Either side of the point may be empty, not both. The exponent takes at
/// most one sign.
pub fn parse_decimal(input: &str) -> Result<BigDecimal, DecimalError> {
    let invalid = || DecimalError::Invalid(input.to_string());
    let trimmed = input.trim();

    let (sign, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };

    let (mantissa, exp_part) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };

    let exponent: i64 = match exp_part {
        Some(raw) => {
            let digits = raw.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(raw);
            if digits.is_empty()
                || digits.len() > MAX_EXPONENT_DIGITS
                || !digits.chars().all(|c| c.is_ascii_digit())
            {
                return Err(invalid());
            }
            raw.parse().map_err(|_| invalid())?
        }
        None => 0,
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let scaled = exponent - frac_part.len() as i64;
    BigDecimal::from_str(&format!("{}{}{}e{}", sign, int_part, frac_part, scaled)).map_err(|_| invalid())
}

/// Re-renders decimal strings without insignificant zeros.
///
/// Precision and rounding are explicit; with `max_significant_digits: None`
/// no digit is ever discarded. Values whose leading-digit exponent falls
/// outside `(exponential_below, exponential_above)` print in scientific form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimalNormalizer {
    pub max_significant_digits: Option<usize>,
    pub rounding: RoundingMode,
    pub exponential_below: i64,
    pub exponential_above: i64,
}

impl Default for DecimalNormalizer {
    fn default() -> Self {
        Self {
            max_significant_digits: None,
            rounding: RoundingMode::HalfUp,
            exponential_below: -7,
            exponential_above: 21,
        }
    }
}

impl DecimalNormalizer {
    pub fn normalize(&self, value: &str) -> Result<String, DecimalError> {
        Ok(self.render(&parse_decimal(value)?))
    }

    /// Drop trailing zeros, then apply the precision limit.
    pub fn round(&self, value: &BigDecimal) -> BigDecimal {
        let value = value.normalized();
        let Some(max) = self.max_significant_digits.filter(|max| *max > 0) else {
            return value;
        };

        let digits = value.digits();
        if digits <= max as u64 {
            return value;
        }
        let (_, scale) = value.as_bigint_and_exponent();
        let excess = (digits - max as u64) as i64;
        value.with_scale_round(scale - excess, self.rounding.into()).normalized()
    }

    pub fn render(&self, value: &BigDecimal) -> String {
        let (coefficient, scale) = self.round(value).as_bigint_and_exponent();
        let text = coefficient.to_string();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, text.as_str()),
        };
        if digits.bytes().all(|b| b == b'0') {
            return "0".to_string();
        }

        let exponent = digits.len() as i64 - 1 - scale;
        let body = if exponent <= self.exponential_below || exponent >= self.exponential_above {
            exponential(digits, exponent)
        } else {
            plain(digits, exponent)
        };
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }
}

/// `123.4`, `0.005`, `1200`
fn plain(digits: &str, exponent: i64) -> String {
    let len = digits.len() as i64;
    if exponent < 0 {
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), digits)
    } else if len <= exponent + 1 {
        format!("{}{}", digits, "0".repeat((exponent + 1 - len) as usize))
    } else {
        let (int, frac) = digits.split_at((exponent + 1) as usize);
        format!("{}.{}", int, frac)
    }
}

/// `1.5e+21`, `1e-7`
fn exponential(digits: &str, exponent: i64) -> String {
    let (lead, rest) = digits.split_at(1);
    let sign = if exponent < 0 { '-' } else { '+' };
    if rest.is_empty() {
        format!("{}e{}{}", lead, sign, exponent.abs())
    } else {
        format!("{}.{}e{}{}", lead, rest, sign, exponent.abs())
    }
}
