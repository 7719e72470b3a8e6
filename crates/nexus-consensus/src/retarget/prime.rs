//! Prime channel retarget.
//!
//! Prime targets are cluster sizes, not thresholds, so the ratio multiplies
//! the difficulty score directly. Step sizes shrink as the cluster size grows
//! because each extra prime in the cluster is far harder to find.

use super::{CandidateBlock, ChannelHistory, RetargetEngine, RetargetTrace};
use crate::chain::ChainHistoryView;
use crate::difficulty::{bits_to_score, is_valid_prime_bits, score_to_bits};
use crate::numeric::{bounded_adjustment, clamp_ratio, clamped_block_ratio, AdjustmentRates};
use crate::{Channel, ConsensusError, ConsensusResult, ProtocolVersion};
use tracing::debug;

/// Ratio applied to the prime difficulty score.
///
/// `difficulty` must exceed 1.0 and `target` must be positive.
pub fn prime_ratio(
    version: ProtocolVersion,
    difficulty: f64,
    observed: i64,
    target: i64,
    chain_mod: f64,
) -> f64 {
    let excess = difficulty - 1.0;

    if version.uses_bounded_adjustment() {
        let rates = AdjustmentRates::new(0.5 / (excess * 5.0), 0.125 / (excess * 10.0));
        return bounded_adjustment(observed, target, rates);
    }

    let down_scale = if version == ProtocolVersion::V1 {
        10.0
    } else {
        25.0
    };
    let max_down = 1.0 - 0.5 / (excess * down_scale);
    let max_up = 0.125 / (excess * 50.0) + 1.0;

    let mut ratio = clamped_block_ratio(target, observed, 0.5, 1.125);
    if version.applies_chain_mod_to_ratio() {
        ratio *= chain_mod;
    }
    clamp_ratio(ratio, max_down, max_up)
}

impl<V> RetargetEngine<'_, V>
where
    V: ChainHistoryView + ?Sized,
{
    /// Next prime bits for `candidate`.
    ///
    /// Fails only when the stored prime bits of the channel's last block
    /// describe a single cluster or less.
    pub fn retarget_prime(
        &self,
        candidate: &CandidateBlock<'_>,
        verbose: bool,
    ) -> ConsensusResult<u32> {
        let Some(history) = self.history(candidate, Channel::Prime) else {
            debug!(height = candidate.parent.height, "Prime channel bootstrap");
            return Ok(self.params.prime.start_bits);
        };

        let previous_bits = history.first.bits;
        if !is_valid_prime_bits(previous_bits) {
            return Err(ConsensusError::InvalidPrimeBits(previous_bits));
        }

        let version = candidate.version;
        let observed = self.observed_time(&history, version);
        let chain_mod = self.chain_mod(&history, version);
        let target = self.target_timespan(version, chain_mod);

        let difficulty = bits_to_score(previous_bits);
        let ratio = prime_ratio(version, difficulty, observed, target, chain_mod);
        let bits = score_to_bits(difficulty * ratio).max(self.params.prime.min_bits);

        debug!(
            %version,
            observed,
            target,
            chain_mod,
            ratio,
            old_bits = previous_bits,
            new_bits = bits,
            "Prime retarget"
        );

        if verbose {
            self.trace_prime(&history, observed, target, ratio, chain_mod, bits);
        }

        Ok(bits)
    }

    fn trace_prime(
        &self,
        history: &ChannelHistory<'_>,
        observed: i64,
        target: i64,
        ratio: f64,
        chain_mod: f64,
        bits: u32,
    ) {
        RetargetTrace {
            channel: Channel::Prime,
            history,
            observed,
            target,
            adjustment: ratio * 100.0,
            chain_mod: Some(chain_mod),
            old_difficulty: bits_to_score(history.first.bits),
            new_difficulty: bits_to_score(bits),
        }
        .emit(self.params.genesis_timestamp);
    }
}
