//! Difficulty scores.
//!
//! The prime channel stores its target as integer bits equal to the cluster
//! size times 10^7; its score is the cluster size itself. Stake and hash store
//! compact targets; their score is only used for display.

use crate::compact::decode_compact;
use crate::params::PRIME_BITS_SCALE;
use crate::{Channel, RetargetParams};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Prime bits to cluster-size score.
pub fn bits_to_score(bits: u32) -> f64 {
    f64::from(bits) / PRIME_BITS_SCALE
}

/// Prime bits describe more than a single cluster.
///
/// Prime step sizes divide by `score - 1`, so one cluster or less can never
/// be a stored target.
pub fn is_valid_prime_bits(bits: u32) -> bool {
    bits_to_score(bits) > 1.0
}

/// Cluster-size score to prime bits, truncating toward zero.
///
/// Scores beyond the `u32` range saturate.
pub fn score_to_bits(score: f64) -> u32 {
    (PRIME_BITS_SCALE * score) as u32
}

/// Ratio of the ease ceiling to the decoded target.
///
/// Returns 0.0 for bits that do not decode.
pub fn compact_difficulty(bits: u32, ceiling: &BigUint) -> f64 {
    let Ok(target) = decode_compact(bits) else {
        return 0.0;
    };

    let scaled = (ceiling << 32u32) / target;
    scaled.to_f64().unwrap_or(f64::INFINITY) / 4_294_967_296.0
}

/// Difficulty of `bits` on `channel`, for diagnostics.
pub fn difficulty(bits: u32, channel: Channel, params: &RetargetParams) -> f64 {
    match channel {
        Channel::Prime => bits_to_score(bits),
        Channel::Stake => compact_difficulty(bits, &params.stake.limit),
        Channel::Hash => compact_difficulty(bits, &params.hash.limit),
    }
}
