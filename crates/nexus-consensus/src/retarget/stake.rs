//! Stake channel retarget.
//!
//! The stake channel ignores protocol versions entirely: it always uses the
//! weighted time statistic against the fixed stake spacing.

use super::{scale_target, CandidateBlock, ChannelHistory, RetargetEngine, RetargetTrace};
use crate::chain::ChainHistoryView;
use crate::compact::{decode_compact, encode_compact};
use crate::difficulty::difficulty;
use crate::numeric::{bounded_adjustment, scale_time, AdjustmentRates};
use crate::{Channel, ConsensusResult};
use tracing::debug;

const STAKE_RATES: AdjustmentRates = AdjustmentRates::new(0.15, 0.075);

/// Upper and lower bound for a stake retarget.
///
/// The new target is `previous * upper / lower`.
pub fn stake_bounds(observed: i64, spacing: i64) -> (i64, i64) {
    let ratio = bounded_adjustment(observed, spacing, STAKE_RATES);
    (spacing, scale_time(spacing, ratio).max(1))
}

impl<V> RetargetEngine<'_, V>
where
    V: ChainHistoryView + ?Sized,
{
    /// Next stake target for `candidate`.
    pub fn retarget_stake(
        &self,
        candidate: &CandidateBlock<'_>,
        verbose: bool,
    ) -> ConsensusResult<u32> {
        let Some(history) = self.history(candidate, Channel::Stake) else {
            debug!(height = candidate.parent.height, "Stake channel bootstrap");
            return Ok(self.params.stake.start_bits());
        };

        let observed = self
            .view
            .weighted_time(history.first, self.params.weighted_samples);
        let (upper, lower) = stake_bounds(observed, self.params.stake_spacing);

        let previous = decode_compact(history.first.bits)?;
        let next = scale_target(&previous, upper, lower, &self.params.stake.limit);
        let bits = encode_compact(&next);

        debug!(
            observed,
            upper,
            lower,
            old_bits = format!("{:08x}", history.first.bits),
            new_bits = format!("{:08x}", bits),
            "Stake retarget"
        );

        if verbose {
            self.trace_stake(&history, observed, upper, lower, bits);
        }

        Ok(bits)
    }

    fn trace_stake(
        &self,
        history: &ChannelHistory<'_>,
        observed: i64,
        upper: i64,
        lower: i64,
        bits: u32,
    ) {
        RetargetTrace {
            channel: Channel::Stake,
            history,
            observed,
            target: self.params.stake_spacing,
            adjustment: (100.0 * lower as f64) / upper as f64,
            chain_mod: None,
            old_difficulty: difficulty(history.first.bits, Channel::Stake, self.params),
            new_difficulty: difficulty(bits, Channel::Stake, self.params),
        }
        .emit(self.params.genesis_timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_chain::*;
    use super::*;
    use crate::{ProtocolVersion, RetargetParams};
    use num_bigint::BigUint;

    const BITS: u32 = 0x1d00ffff;

    fn retarget(gap: i64) -> u32 {
        let arena = uniform(Channel::Stake, 8, gap, BITS);
        let params = RetargetParams::mainnet();
        let engine = RetargetEngine::new(&arena, &params);
        let candidate = CandidateBlock::new(arena.tip().unwrap(), ProtocolVersion::V4);
        engine.retarget_stake(&candidate, false).unwrap()
    }

    #[test]
    fn test_stake_bounds() {
        assert_eq!(stake_bounds(150, 150), (150, 150));
        // Saturated slow: 150 * 0.85 truncates to 127.
        assert_eq!(stake_bounds(450, 150), (150, 127));
        // Half-way fast: 150 * 1.0375 = 155.625.
        assert_eq!(stake_bounds(75, 150), (150, 155));
    }

    #[test]
    fn test_bootstrap_returns_start() {
        let arena = uniform(Channel::Stake, 1, 150, BITS);
        let params = RetargetParams::mainnet();
        let candidate = CandidateBlock::new(arena.tip().unwrap(), ProtocolVersion::V4);

        let bits = crate::retarget_stake(&arena, &params, &candidate, false).unwrap();
        assert_eq!(bits, params.stake.start_bits());
    }

    #[test]
    fn test_on_target_keeps_bits() {
        assert_eq!(retarget(150), BITS);
    }

    #[test]
    fn test_slow_blocks_ease_target() {
        let previous = decode_compact(BITS).unwrap();
        let next = decode_compact(retarget(600)).unwrap();

        assert!(next > previous);
        let expected = &previous * BigUint::from(150u32) / BigUint::from(127u32);
        assert_eq!(encode_compact(&expected), retarget(600));
    }

    #[test]
    fn test_fast_blocks_harden_target() {
        let previous = decode_compact(BITS).unwrap();
        let next = decode_compact(retarget(30)).unwrap();
        assert!(next < previous);
    }

    #[test]
    fn test_ignores_candidate_version() {
        let arena = uniform(Channel::Stake, 8, 400, BITS);
        let params = RetargetParams::mainnet();
        let engine = RetargetEngine::new(&arena, &params);
        let tip = arena.tip().unwrap();

        let v1 = engine
            .retarget_stake(&CandidateBlock::new(tip, ProtocolVersion::V1), false)
            .unwrap();
        let v4 = engine
            .retarget_stake(&CandidateBlock::new(tip, ProtocolVersion::V4), true)
            .unwrap();
        assert_eq!(v1, v4);
    }

    #[test]
    fn test_clamps_to_limit() {
        let params = RetargetParams::mainnet();
        let arena = uniform(Channel::Stake, 8, 10_000, params.stake.limit_bits());
        let engine = RetargetEngine::new(&arena, &params);
        let candidate = CandidateBlock::new(arena.tip().unwrap(), ProtocolVersion::V4);

        let bits = engine.retarget_stake(&candidate, false).unwrap();
        assert_eq!(bits, params.stake.limit_bits());
    }
}
