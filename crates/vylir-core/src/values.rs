use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

/// Value ranges of the numeric base types.
pub struct SizeLimits;

impl SizeLimits {
    pub fn bounds(type_name: &str) -> Option<(BigInt, BigInt)> {
        let two = BigInt::from(2u8);
        let bounds = match type_name {
            "int128" => (-two.pow(127u32), two.pow(127u32) - 1),
            "int256" => (-two.pow(255u32), two.pow(255u32) - 1),
            "uint256" | "bytes32" => (BigInt::zero(), two.pow(256u32) - 1),
            "address" => (BigInt::zero(), two.pow(160u32) - 1),
            "bool" => (BigInt::zero(), BigInt::one()),
            _ => return None,
        };
        Some(bounds)
    }

    pub fn in_bounds(type_name: &str, value: &BigInt) -> bool {
        match Self::bounds(type_name) {
            Some((min, max)) => *value >= min && *value <= max,
            None => false,
        }
    }
}

/// Big-endian interpretation of a byte string.
pub fn bytes_to_int(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

/// Splits a byte string into 32-byte big-endian words, right-padding the last one with zeros.
pub fn bytes_to_words(bytes: &[u8]) -> Vec<BigUint> {
    bytes
        .chunks(32)
        .map(|chunk| {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            BigUint::from_bytes_be(&word)
        })
        .collect()
}

pub fn ceil32(n: usize) -> usize {
    (n + 31) / 32 * 32
}
