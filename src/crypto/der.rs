//! ECDSA signature scalars and their DER encoding
//!
//! The remote signer hands back `(r, s)` as strings; the ledger only accepts
//! a canonical DER `SEQUENCE { INTEGER r, INTEGER s }` in `TxnSignature`.

use std::sync::Arc;

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{SignerError, SignerResult};

/// secp256k1 group order n
pub const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// Raw `(r, s)` pair as produced by the remote signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature {
    pub r: U256,
    pub s: U256,
}

impl RawSignature {
    pub fn new(r: U256, s: U256) -> Self {
        Self { r, s }
    }

    /// Parse both components using the given scalar format.
    pub fn parse(r: &str, s: &str, format: ScalarFormat) -> SignerResult<Self> {
        Ok(Self {
            r: parse_scalar(r, format)?,
            s: parse_scalar(s, format)?,
        })
    }

    /// 64-byte `r || s`.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        self.r.to_big_endian(&mut out[..32]);
        self.s.to_big_endian(&mut out[32..]);
        out
    }

    /// Both scalars must lie in `[1, n - 1]`.
    pub fn validate(&self) -> SignerResult<()> {
        let order = U256::from_big_endian(&SECP256K1_ORDER);
        for (name, value) in [("r", &self.r), ("s", &self.s)] {
            if value.is_zero() {
                return Err(SignerError::encoding(format!("signature component {} is zero", name)));
            }
            if *value >= order {
                return Err(SignerError::encoding(format!(
                    "signature component {} exceeds the curve order",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// How the signer transport renders `r` and `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarFormat {
    /// `0x` prefix or any hex letter means hex; a bare 64-digit string is
    /// fixed-width hex; any other all-digit string is decimal.
    #[default]
    Auto,
    /// Hex with or without `0x`.
    Hex,
    /// Base-10 digits.
    Decimal,
}

/// Parse one signature component.
///
/// A component that cannot be read is a malformed signer response, so the
/// error is reported as a signing-service failure.
pub fn parse_scalar(value: &str, format: ScalarFormat) -> SignerResult<U256> {
    let trimmed = value.trim();
    let (digits, is_hex) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(rest) => (rest, true),
        None => {
            let is_hex = match format {
                ScalarFormat::Hex => true,
                ScalarFormat::Decimal => false,
                ScalarFormat::Auto => {
                    trimmed.chars().any(|c| c.is_ascii_hexdigit() && !c.is_ascii_digit())
                        || trimmed.len() == 64
                }
            };
            (trimmed, is_hex)
        }
    };

    if digits.is_empty() {
        return Err(malformed(value, "empty"));
    }

    if is_hex {
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(malformed(value, "not hex"));
        }
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(U256::zero());
        }
        let padded = if significant.len() % 2 == 1 {
            format!("0{}", significant)
        } else {
            significant.to_string()
        };
        U256::from_str_radix(&padded, 16).map_err(|_| malformed(value, "wider than 256 bits"))
    } else {
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed(value, "not decimal"));
        }
        U256::from_dec_str(digits).map_err(|_| malformed(value, "wider than 256 bits"))
    }
}

fn malformed(value: &str, why: &str) -> SignerError {
    SignerError::signing_service(format!(
        "malformed signature component {:?}: {}",
        value, why
    ))
}

// MARK: - Encoders

/// Converts a raw signature to DER.
pub trait DerEncoder: Send + Sync {
    fn encode(&self, signature: &RawSignature) -> SignerResult<Vec<u8>>;

    /// Uppercase hex, the form stored in `TxnSignature`.
    fn encode_hex(&self, signature: &RawSignature) -> SignerResult<String> {
        Ok(hex::encode_upper(self.encode(signature)?))
    }
}

/// DER via `secp256k1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Der;

impl DerEncoder for Secp256k1Der {
    fn encode(&self, signature: &RawSignature) -> SignerResult<Vec<u8>> {
        signature.validate()?;
        let sig = secp256k1::ecdsa::Signature::from_compact(&signature.to_compact())
            .map_err(|e| SignerError::encoding(format!("invalid signature scalars: {}", e)))?;
        Ok(sig.serialize_der().to_vec())
    }
}

/// Hand-written DER writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualDer;

impl DerEncoder for ManualDer {
    fn encode(&self, signature: &RawSignature) -> SignerResult<Vec<u8>> {
        signature.validate()?;

        let r = der_integer(&signature.r);
        let s = der_integer(&signature.s);

        let mut out = Vec::with_capacity(2 + r.len() + s.len());
        out.push(DER_SEQUENCE);
        push_length(&mut out, r.len() + s.len());
        out.extend_from_slice(&r);
        out.extend_from_slice(&s);
        Ok(out)
    }
}

/// Selectable DER strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerStrategy {
    #[default]
    Secp256k1,
    Manual,
}

impl DerStrategy {
    pub fn encoder(self) -> Arc<dyn DerEncoder> {
        match self {
            Self::Secp256k1 => Arc::new(Secp256k1Der),
            Self::Manual => Arc::new(ManualDer),
        }
    }
}

fn der_integer(value: &U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    let first = buf.iter().position(|b| *b != 0).unwrap_or(31);

    let mut body = Vec::with_capacity(33);
    // keep the integer non-negative
    if buf[first] & 0x80 != 0 {
        body.push(0x00);
    }
    body.extend_from_slice(&buf[first..]);

    let mut out = Vec::with_capacity(2 + body.len());
    out.push(DER_INTEGER);
    push_length(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

fn push_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    out.push(0x80 | (bytes.len() - first) as u8);
    out.extend_from_slice(&bytes[first..]);
}

// MARK: - Decoding

/// Parse a strict DER ECDSA signature back into `(r, s)`.
pub fn decode_der(bytes: &[u8]) -> SignerResult<RawSignature> {
    let mut pos = 0usize;

    if bytes.first() != Some(&DER_SEQUENCE) {
        return Err(SignerError::encoding("DER signature must start with a SEQUENCE"));
    }
    pos += 1;
    let seq_len = read_length(bytes, &mut pos)?;
    if pos + seq_len != bytes.len() {
        return Err(SignerError::encoding("DER sequence length does not match input"));
    }

    let r = read_integer(bytes, &mut pos)?;
    let s = read_integer(bytes, &mut pos)?;
    if pos != bytes.len() {
        return Err(SignerError::encoding("trailing bytes after DER signature"));
    }

    Ok(RawSignature { r, s })
}

/// [`decode_der`] over a hex string.
pub fn decode_der_hex(hex_sig: &str) -> SignerResult<RawSignature> {
    let bytes = hex::decode(hex_sig)
        .map_err(|e| SignerError::encoding(format!("invalid DER hex: {}", e)))?;
    decode_der(&bytes)
}

fn read_length(bytes: &[u8], pos: &mut usize) -> SignerResult<usize> {
    let first = *bytes
        .get(*pos)
        .ok_or_else(|| SignerError::encoding("truncated DER length"))?;
    *pos += 1;
    if first & 0x80 == 0 {
        return Ok(first as usize);
    }

    let count = (first & 0x7F) as usize;
    if count == 0 || count > 2 {
        return Err(SignerError::encoding("unsupported DER length form"));
    }
    let mut len = 0usize;
    for _ in 0..count {
        let b = *bytes
            .get(*pos)
            .ok_or_else(|| SignerError::encoding("truncated DER length"))?;
        *pos += 1;
        len = (len << 8) | b as usize;
    }
    if len < 0x80 {
        return Err(SignerError::encoding("non-minimal DER length"));
    }
    Ok(len)
}

fn read_integer(bytes: &[u8], pos: &mut usize) -> SignerResult<U256> {
    if bytes.get(*pos) != Some(&DER_INTEGER) {
        return Err(SignerError::encoding("expected DER INTEGER"));
    }
    *pos += 1;
    let len = read_length(bytes, pos)?;
    let body = bytes
        .get(*pos..*pos + len)
        .ok_or_else(|| SignerError::encoding("truncated DER INTEGER"))?;
    *pos += len;

    if body.is_empty() {
        return Err(SignerError::encoding("empty DER INTEGER"));
    }
    if body[0] & 0x80 != 0 {
        return Err(SignerError::encoding("negative DER INTEGER"));
    }
    if body.len() > 1 && body[0] == 0 && body[1] & 0x80 == 0 {
        return Err(SignerError::encoding("non-minimal DER INTEGER"));
    }

    let magnitude = if body[0] == 0 { &body[1..] } else { body };
    if magnitude.len() > 32 {
        return Err(SignerError::encoding("DER INTEGER wider than 256 bits"));
    }
    Ok(U256::from_big_endian(magnitude))
}
