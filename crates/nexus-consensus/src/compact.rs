//! Compact target encoding for the stake and hash channels.
//!
//! nBits format: 0x[size][word]
//! - size: 1 byte, byte length of the target
//! - word: 3 bytes, the most significant bytes of the target
//!
//! Bit 0x00800000 of the word is a sign bit. A target whose leading byte has
//! its high bit set is stored with one extra size byte and the mantissa shifted
//! right by 8, so the sign bit stays clear.

use crate::params::TARGET_BITS;
use crate::{ConsensusError, ConsensusResult};
use num_bigint::BigUint;
use num_traits::Zero;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Largest representable target (2^1024 - 1).
pub fn max_target() -> BigUint {
    (BigUint::from(1u32) << TARGET_BITS) - BigUint::from(1u32)
}

/// Decode compact bits into a target.
///
/// Zero, negative and wider-than-1024-bit targets are rejected: a stored
/// target is always a valid, positive encoding.
pub fn decode_compact(bits: u32) -> ConsensusResult<BigUint> {
    let size = (bits >> 24) as usize;
    let word = bits & MANTISSA_MASK;

    let target = if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3))
    };

    if target.is_zero() {
        return Err(ConsensusError::InvalidCompactTarget {
            bits,
            reason: "zero target",
        });
    }

    if bits & SIGN_BIT != 0 {
        return Err(ConsensusError::InvalidCompactTarget {
            bits,
            reason: "negative target",
        });
    }

    if target.bits() > u64::from(TARGET_BITS) {
        return Err(ConsensusError::InvalidCompactTarget {
            bits,
            reason: "target wider than 1024 bits",
        });
    }

    Ok(target)
}

/// Encode a target as compact bits, truncating to the 3-byte mantissa.
///
/// # Panics
///
/// Panics if the target needs more than 255 bytes. Such a target cannot be
/// represented and must never be rounded into a different one.
pub fn encode_compact(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let bytes = target.to_bytes_be();
    let mut size = bytes.len();

    let mut word = if size <= 3 {
        bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
            << (8 * (3 - size))
    } else {
        (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
    };

    if word & SIGN_BIT != 0 {
        word >>= 8;
        size += 1;
    }

    assert!(
        size <= 0xff,
        "compact target overflow: {} byte target cannot be encoded",
        size
    );

    ((size as u32) << 24) | word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_canonical_bits() {
        let cases = [0x1d00ffffu32, 0x1b0404cb, 0x17034d4b, 0x7c00ffff, 0x03123456];

        for bits in cases {
            let target = decode_compact(bits).unwrap();
            assert_eq!(encode_compact(&target), bits, "roundtrip failed for {:#x}", bits);
        }
    }

    #[test]
    fn test_encode_truncates_mantissa() {
        let value = BigUint::from(0x12345678u32);
        let bits = encode_compact(&value);
        assert_eq!(bits, 0x04123456);
        assert_eq!(decode_compact(bits).unwrap(), BigUint::from(0x12345600u32));
    }

    #[test]
    fn test_encode_sign_byte_shift() {
        let value = BigUint::from(0x801234u32);
        let bits = encode_compact(&value);

        assert_eq!((bits >> 24) & 0xff, 4);
        assert_eq!(bits & SIGN_BIT, 0);
        assert_eq!(decode_compact(bits).unwrap(), BigUint::from(0x801200u32));
    }

    #[test]
    fn test_small_values() {
        assert_eq!(encode_compact(&BigUint::from(1u32)), 0x01010000);
        assert_eq!(decode_compact(0x01010000).unwrap(), BigUint::from(1u32));
        assert_eq!(encode_compact(&BigUint::from(0x7fu32)), 0x017f0000);
        assert_eq!(encode_compact(&BigUint::from(0x80u32)), 0x02008000);
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert!(matches!(
            decode_compact(0),
            Err(ConsensusError::InvalidCompactTarget { reason: "zero target", .. })
        ));
        assert!(matches!(
            decode_compact(0x04923456),
            Err(ConsensusError::InvalidCompactTarget { reason: "negative target", .. })
        ));
        assert!(matches!(
            decode_compact(0xff00ffff),
            Err(ConsensusError::InvalidCompactTarget { .. })
        ));
    }

    #[test]
    fn test_max_target_encoding() {
        let limit = max_target() >> 5u32;
        let bits = encode_compact(&limit);
        let decoded = decode_compact(bits).unwrap();

        assert!(decoded <= limit);
        // 128 byte target: only the 125 bytes below the mantissa are dropped.
        assert!(&limit - &decoded < (BigUint::from(1u32) << 1000u32));
    }

    #[test]
    #[should_panic(expected = "compact target overflow")]
    fn test_encode_overflow_panics() {
        let huge = BigUint::from(1u32) << 2100u32;
        encode_compact(&huge);
    }
}
