//! Field element encoding helpers.
//!
//! StarkNet typed data carries every value as a felt. Strings are packed as
//! short strings (ASCII, big-endian, at most 31 bytes) unless they already
//! look like numbers, in which case they are parsed.

use crate::error::{SignerError, SignerResult};
use alloy::primitives::{keccak256, U256};
use starknet_crypto::pedersen_hash;
use starknet_types_core::felt::Felt;
use std::str::FromStr;

/// Maximum length of a StarkNet short string.
pub const MAX_SHORT_STRING_LEN: usize = 31;

/// Pack an ASCII string (≤ 31 bytes) into a felt.
pub fn encode_short_string(value: &str) -> SignerResult<Felt> {
    if !value.is_ascii() {
        return Err(SignerError::NonAsciiShortString(value.to_string()));
    }
    if value.len() > MAX_SHORT_STRING_LEN {
        return Err(SignerError::ShortStringTooLong {
            value: value.to_string(),
            len: value.len(),
        });
    }
    let mut bytes = [0u8; 32];
    bytes[32 - value.len()..].copy_from_slice(value.as_bytes());
    Ok(Felt::from_bytes_be(&bytes))
}

/// Encode a string field value the way the typed-data reference does:
/// `0x…` is hex, all-digit strings are decimal, anything else is a short string.
pub fn felt_from_str(value: &str) -> SignerResult<Felt> {
    let numeric = value.starts_with("0x") || (!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()));
    if numeric {
        let parsed =
            U256::from_str(value).map_err(|_| SignerError::InvalidFelt(value.to_string()))?;
        return Ok(felt_from_u256(parsed));
    }
    encode_short_string(value)
}

/// Keccak-256 masked to 250 bits.
pub fn starknet_keccak(data: &[u8]) -> Felt {
    let mut bytes = keccak256(data).0;
    bytes[0] &= 0x03;
    Felt::from_bytes_be(&bytes)
}

/// Entry-point selector for a function name.
pub fn selector_from_name(name: &str) -> Felt {
    starknet_keccak(name.as_bytes())
}

/// Pedersen chain over `elements`, finalised with the element count.
pub fn pedersen_array(elements: &[Felt]) -> Felt {
    let folded = elements
        .iter()
        .fold(Felt::ZERO, |acc, e| pedersen_hash(&acc, e));
    pedersen_hash(&folded, &Felt::from(elements.len() as u64))
}

pub fn felt_from_u256(value: U256) -> Felt {
    Felt::from_bytes_be(&value.to_be_bytes::<32>())
}

pub fn felt_to_u256(value: &Felt) -> U256 {
    U256::from_be_bytes(value.to_bytes_be())
}

/// Decimal rendering, as used in serialized signatures.
pub fn felt_to_decimal(value: &Felt) -> String {
    felt_to_u256(value).to_string()
}

/// `0x`-prefixed lowercase hex without leading zeros.
pub fn felt_to_hex(value: &Felt) -> String {
    let encoded = hex::encode(value.to_bytes_be());
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}
