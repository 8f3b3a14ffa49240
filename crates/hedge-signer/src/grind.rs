//! Key grinding: unbiased reduction of a 256-bit seed into a curve order.
//!
//! Reference: StarkEx key derivation (`grind_key`). The output must match
//! the reference byte-for-byte, otherwise the derived account address and
//! every signature differ from what the exchange expects.

use alloy::primitives::{uint, U256};
use sha2::{Digest, Sha256};

/// Order of the STARK curve generator.
pub const STARK_CURVE_ORDER: U256 =
    uint!(0x0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f_U256);

/// Deterministically map `seed` into `[0, limit)`.
///
/// Hashes `seed || index` with SHA-256 for `index = 0, 1, ...` and accepts the
/// first digest below the largest multiple of `limit` that fits in 2^256, then
/// reduces it modulo `limit`. Terminates with overwhelming probability; the
/// loop is intentionally unbounded.
///
/// # Panics
/// Panics if `limit` is zero.
pub fn grind_key(seed: U256, limit: U256) -> U256 {
    assert!(!limit.is_zero(), "grind limit must be non-zero");

    // 2^256 mod limit, computed without overflowing U256.
    let wrap = (U256::MAX % limit + U256::from(1u8)) % limit;
    // None means every 256-bit digest is acceptable (limit divides 2^256).
    let max_allowed = if wrap.is_zero() {
        None
    } else {
        Some(U256::MAX - wrap + U256::from(1u8))
    };

    let mut index: u64 = 0;
    loop {
        let digest = indexed_sha256(seed, U256::from(index));
        match max_allowed {
            Some(max) if digest >= max => index += 1,
            _ => return digest % limit,
        }
    }
}

/// SHA-256 over the concatenated even-length hex encodings of `seed` and `index`.
fn indexed_sha256(seed: U256, index: U256) -> U256 {
    let mut hasher = Sha256::new();
    hasher.update(minimal_be_bytes(seed));
    hasher.update(minimal_be_bytes(index));
    U256::from_be_bytes::<32>(hasher.finalize().into())
}

/// Bytes of the even-length hex rendering of `value` (no leading zero bytes,
/// at least one byte).
fn minimal_be_bytes(value: U256) -> Vec<u8> {
    let bytes = value.to_be_bytes::<32>();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(31);
    bytes[first..].to_vec()
}

/// Lowercase hex without prefix, zero-padded to an even number of digits.
pub fn pad_even_hex(value: U256) -> String {
    hex::encode(minimal_be_bytes(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn u(s: &str) -> U256 {
        U256::from_str(s).unwrap()
    }

    #[test]
    fn test_pad_even_hex() {
        assert_eq!(pad_even_hex(U256::ZERO), "00");
        assert_eq!(pad_even_hex(U256::from(0xabcu64)), "0abc");
        assert_eq!(pad_even_hex(U256::from(0xabu64)), "ab");
    }

    /// StarkEx reference vector.
    #[test]
    fn test_grind_key_reference_vector() {
        let seed = u("0x86F3E7293141F20A8BAFF320E8EE4ACCB9D4A4BF2B4D295E8CEE784DB46E0519");
        let expected = u("0x5c8c8683596c732541a59e03007b2d30dbbbb873556fe65b5fb63c16688f941");
        assert_eq!(grind_key(seed, STARK_CURVE_ORDER), expected);
    }

    #[test]
    fn test_grind_key_small_seeds() {
        assert_eq!(
            grind_key(U256::from(1u8), STARK_CURVE_ORDER),
            u("0x7dc540c94ceb67ca23875c11273e16df4b0150c96474d002bec214912e388dc")
        );
        assert_eq!(
            grind_key(U256::from(0xabcu64), STARK_CURVE_ORDER),
            u("0x5fe775158c41e99ecc67b2ebf8d33da7cd3666e6b50a7b5ae761dd5abf993a2")
        );
    }

    /// Seed 26 produces a first digest above the acceptance bound.
    #[test]
    fn test_grind_key_rejects_and_retries() {
        let first = indexed_sha256(U256::from(26u8), U256::ZERO);
        let wrap = (U256::MAX % STARK_CURVE_ORDER + U256::from(1u8)) % STARK_CURVE_ORDER;
        let max_allowed = U256::MAX - wrap + U256::from(1u8);
        assert!(first >= max_allowed);

        assert_eq!(
            grind_key(U256::from(26u8), STARK_CURVE_ORDER),
            u("0x5018a81b2c2caae35b254bc08592e1a7688c8628731a5fd39a03809f1b18e72")
        );
    }

    #[test]
    fn test_grind_key_deterministic_and_in_range() {
        for seed in [0u64, 1, 2, 26, 1_000_003, u64::MAX] {
            let a = grind_key(U256::from(seed), STARK_CURVE_ORDER);
            let b = grind_key(U256::from(seed), STARK_CURVE_ORDER);
            assert_eq!(a, b);
            assert!(a < STARK_CURVE_ORDER);
        }
    }

    #[test]
    fn test_grind_key_other_moduli() {
        assert_eq!(grind_key(U256::from(0x1234u64), U256::from(1000u64)), U256::from(90u64));
        let limit = (U256::from(1u8) << 255) + U256::from(19u8);
        assert_eq!(
            grind_key(U256::from(0x1234u64), limit),
            u("15107819243731649517601473906154964931764158859793606775676057569214328766637")
        );
    }

    #[test]
    fn test_grind_key_power_of_two_limit_accepts_everything() {
        let limit = U256::from(1u8) << 128;
        assert!(grind_key(U256::from(7u8), limit) < limit);
    }
}
