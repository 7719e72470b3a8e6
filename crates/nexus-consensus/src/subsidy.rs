//! Emission schedule.
//!
//! Each emission stream pays a per-minute reward that decays exponentially
//! with chain age: `((a * e^(b * minutes)) + c) * COIN / 2`, truncated to base
//! units. Retargeting compares a short window of expected emission on the
//! miner stream against the reserve a block has actually released.
//!
//! `exp` comes from `libm`, a pure Rust implementation, so every platform
//! computes the same bits.

use crate::params::COIN;
use serde::{Deserialize, Serialize};

/// Independent emission streams. Stream 0 funds the mining reserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsidyStream {
    /// Mining reserve.
    Miner,
    /// Ambassador reserve.
    Ambassador,
    /// Developer reserve.
    Developer,
}

impl SubsidyStream {
    /// Index into per-stream arrays.
    pub fn index(self) -> usize {
        match self {
            SubsidyStream::Miner => 0,
            SubsidyStream::Ambassador => 1,
            SubsidyStream::Developer => 2,
        }
    }

    /// Decay coefficients `[a, b, c]`.
    fn decay(self) -> [f64; 3] {
        match self {
            SubsidyStream::Miner => [25.0, -0.000_001_100_83, 1.0],
            SubsidyStream::Ambassador => [7.0, -0.000_000_551_06, 1.0],
            SubsidyStream::Developer => [3.0, -0.000_001_106_83, 1.0],
        }
    }
}

/// Reward paid by `stream` during minute `minutes` of chain age, in base units.
pub fn subsidy(minutes: u64, stream: SubsidyStream) -> u64 {
    let [a, b, c] = stream.decay();
    let per_minute = (a * libm::exp(b * minutes as f64)) + c;
    (per_minute * (COIN as f64 / 2.0)) as u64
}

/// Emission expected from `stream` over `decay_rate` minutes starting at
/// chain age `minutes`.
///
/// The whole minutes are summed at full reward; the fractional remainder
/// takes the same share of the following minute.
pub fn expected_subsidy(minutes: u64, stream: SubsidyStream, decay_rate: f64) -> f64 {
    let whole = decay_rate.max(0.0).floor();
    let remainder = decay_rate.max(0.0) - whole;
    let whole = whole as u64;

    let full: u64 = (0..whole).map(|m| subsidy(minutes + m, stream)).sum();
    full as f64 + subsidy(minutes + whole, stream) as f64 * remainder
}
