//! Hash channel retarget.

use super::{scale_target, CandidateBlock, RetargetEngine, RetargetTrace};
use crate::chain::ChainHistoryView;
use crate::compact::{decode_compact, encode_compact};
use crate::difficulty::difficulty;
use crate::numeric::{bounded_adjustment, clamped_block_ratio, scale_time, AdjustmentRates};
use crate::{Channel, ConsensusResult, ProtocolVersion};
use tracing::debug;

const HASH_INCREASE_RATE: f64 = 0.075;

/// Largest relative decrease of the hash ratio under bounded adjustment.
pub fn hash_decrease_rate(version: ProtocolVersion) -> f64 {
    if version >= ProtocolVersion::V4 {
        0.15
    } else {
        0.75
    }
}

/// Upper and lower bound for a hash retarget.
///
/// The new target is `previous * upper / lower`. `target` must be positive.
pub fn hash_bounds(
    version: ProtocolVersion,
    observed: i64,
    target: i64,
    chain_mod: f64,
) -> (i64, i64) {
    let upper = target;

    let lower = if version.uses_bounded_adjustment() {
        let rates = AdjustmentRates::new(hash_decrease_rate(version), HASH_INCREASE_RATE);
        scale_time(target, bounded_adjustment(observed, target, rates))
    } else {
        let block_ratio = clamped_block_ratio(target, observed, 0.75, 1.125);
        let mut lower = scale_time(target, block_ratio);
        if version.applies_chain_mod_to_ratio() {
            lower = scale_time(lower, chain_mod);
        }
        lower.min(upper + upper / 8).max(3 * upper / 4)
    };

    (upper, lower.max(1))
}

impl<V> RetargetEngine<'_, V>
where
    V: ChainHistoryView + ?Sized,
{
    /// Next hash target for `candidate`.
    pub fn retarget_hash(
        &self,
        candidate: &CandidateBlock<'_>,
        verbose: bool,
    ) -> ConsensusResult<u32> {
        let Some(history) = self.history(candidate, Channel::Hash) else {
            debug!(height = candidate.parent.height, "Hash channel bootstrap");
            return Ok(self.params.hash.start_bits());
        };

        let version = candidate.version;
        let observed = self.observed_time(&history, version);
        let chain_mod = self.chain_mod(&history, version);
        let target = self.target_timespan(version, chain_mod);
        let (upper, lower) = hash_bounds(version, observed, target, chain_mod);

        let previous = decode_compact(history.first.bits)?;
        let next = scale_target(&previous, upper, lower, &self.params.hash.limit);
        let bits = encode_compact(&next);

        debug!(
            %version,
            observed,
            chain_mod,
            upper,
            lower,
            old_bits = format!("{:08x}", history.first.bits),
            new_bits = format!("{:08x}", bits),
            "Hash retarget"
        );

        if verbose {
            RetargetTrace {
                channel: Channel::Hash,
                history: &history,
                observed,
                target,
                adjustment: (100.0 * lower as f64) / upper as f64,
                chain_mod: Some(chain_mod),
                old_difficulty: difficulty(history.first.bits, Channel::Hash, self.params),
                new_difficulty: difficulty(bits, Channel::Hash, self.params),
            }
            .emit(self.params.genesis_timestamp);
        }

        Ok(bits)
    }
}
