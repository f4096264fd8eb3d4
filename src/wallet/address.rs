//! XRPL address codec
//!
//! Base58check and X-address packing come from `xrpl::core::addresscodec`.
//! This module adds AccountID derivation, RIPEMD-160(SHA-256(public key)),
//! and maps the library's errors into validation errors.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use xrpl::core::addresscodec;

use crate::error::{SignerError, SignerResult};

/// AccountID length in bytes
pub const ACCOUNT_ID_BYTES: usize = 20;

fn invalid(address: &str, reason: impl std::fmt::Display) -> SignerError {
    SignerError::validation(format!("invalid address {:?}: {}", address, reason))
}

// MARK: - Classic addresses

/// AccountID of a public key.
pub fn account_id_from_public_key(public_key: &[u8]) -> [u8; ACCOUNT_ID_BYTES] {
    let sha = Sha256::digest(public_key);
    Ripemd160::digest(sha).into()
}

/// Classic `r...` address for a hex public key (secp256k1 compressed or `ED`-prefixed).
pub fn derive_classic_address(public_key_hex: &str) -> SignerResult<String> {
    let public_key = decode_public_key(public_key_hex)?;
    encode_account_id(&account_id_from_public_key(&public_key))
}

/// Validate and decode a 33-byte public key from hex (optionally `0x`-prefixed).
pub fn decode_public_key(public_key_hex: &str) -> SignerResult<Vec<u8>> {
    let trimmed = public_key_hex.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(trimmed)?;
    match (bytes.len(), bytes.first().copied()) {
        (33, Some(0x02 | 0x03 | 0xED)) => Ok(bytes),
        _ => Err(SignerError::validation(format!(
            "public key must be 33 bytes (secp256k1 compressed or ed25519), got {} bytes",
            bytes.len()
        ))),
    }
}

pub fn encode_account_id(account_id: &[u8; ACCOUNT_ID_BYTES]) -> SignerResult<String> {
    addresscodec::encode_classic_address(account_id)
        .map_err(|e| SignerError::validation(format!("cannot encode account id: {}", e)))
}

/// AccountID of a classic address.
pub fn decode_classic_address(address: &str) -> SignerResult<[u8; ACCOUNT_ID_BYTES]> {
    let trimmed = address.trim();
    let bytes = addresscodec::decode_classic_address(trimmed).map_err(|e| invalid(address, e))?;
    <[u8; ACCOUNT_ID_BYTES]>::try_from(bytes.as_slice())
        .map_err(|_| invalid(address, format!("expected {} account id bytes", ACCOUNT_ID_BYTES)))
}

pub fn is_valid_classic_address(address: &str) -> bool {
    addresscodec::is_valid_classic_address(address.trim())
}

// MARK: - X-addresses

/// Decoded X-address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XAddress {
    pub classic_address: String,
    pub tag: Option<u32>,
    pub test: bool,
}

pub fn classic_address_to_x_address(
    classic_address: &str,
    tag: Option<u32>,
    test: bool,
) -> SignerResult<String> {
    addresscodec::classic_address_to_xaddress(classic_address.trim(), tag.map(Into::into), test)
        .map_err(|e| invalid(classic_address, e))
}

pub fn x_address_to_classic_address(x_address: &str) -> SignerResult<XAddress> {
    let (classic_address, tag, test) =
        addresscodec::xaddress_to_classic_address(x_address.trim()).map_err(|e| invalid(x_address, e))?;

    // Destination and source tags are UInt32 on the ledger
    let tag = tag
        .map(|tag| u32::try_from(tag).map_err(|_| invalid(x_address, "tag does not fit in 32 bits")))
        .transpose()?;

    Ok(XAddress {
        classic_address,
        tag,
        test,
    })
}

pub fn is_valid_x_address(x_address: &str) -> bool {
    addresscodec::is_valid_xaddress(x_address.trim())
}

/// Accept either form and return the classic address.
pub fn resolve_classic_address(address: &str) -> SignerResult<String> {
    let trimmed = address.trim();
    if is_valid_x_address(trimmed) {
        return Ok(x_address_to_classic_address(trimmed)?.classic_address);
    }
    decode_classic_address(trimmed)?;
    Ok(trimmed.to_string())
}
