//! Per-channel difficulty retargeting.
//!
//! Each channel locates its two most recent blocks behind the candidate,
//! measures how fast it has been producing, and scales the previous target
//! by a bounded ratio. Every formula choice keys off the candidate block's
//! declared [`ProtocolVersion`].
//!
//! When the channel has fewer than two blocks of history the configured start
//! target is returned; this is the designed bootstrap, not an error.

mod hash;
mod prime;
mod stake;

pub use hash::{hash_bounds, hash_decrease_rate};
pub use prime::prime_ratio;
pub use stake::stake_bounds;

use crate::chain::{chain_age, chain_times, BlockRecord, ChainHistoryView};
use crate::numeric::{chain_modulation, scale_time};
use crate::params::COIN;
use crate::subsidy::{expected_subsidy, SubsidyStream};
use crate::{Channel, ConsensusResult, ProtocolVersion, RetargetParams};
use num_bigint::BigUint;
use tracing::info;

/// A block about to extend the chain.
#[derive(Debug, Clone, Copy)]
pub struct CandidateBlock<'a> {
    /// Block the candidate builds on.
    pub parent: &'a BlockRecord,
    /// Protocol version declared by the candidate.
    pub version: ProtocolVersion,
}

impl<'a> CandidateBlock<'a> {
    /// Create a candidate on top of `parent`.
    pub fn new(parent: &'a BlockRecord, version: ProtocolVersion) -> Self {
        Self { parent, version }
    }
}

/// The two most recent blocks of one channel behind a candidate.
#[derive(Debug, Clone, Copy)]
pub struct ChannelHistory<'a> {
    /// Most recent channel block.
    pub first: &'a BlockRecord,
    /// Channel block before `first`.
    pub last: &'a BlockRecord,
}

impl<'a> ChannelHistory<'a> {
    /// Walk back from `tip` to the two most recent blocks of `channel`.
    ///
    /// Returns `None` when the walk reaches the genesis boundary first.
    pub fn gather<V>(view: &'a V, tip: &'a BlockRecord, channel: Channel) -> Option<Self>
    where
        V: ChainHistoryView + ?Sized,
    {
        let first = view.last_channel_block(tip, channel)?;
        let before = view.predecessor(first)?;
        let last = view.last_channel_block(before, channel)?;
        Some(Self { first, last })
    }

    /// Gap between the two blocks in seconds, at least 1.
    pub fn actual_time(&self) -> i64 {
        self.first.timestamp.saturating_sub(self.last.timestamp).max(1)
    }
}

/// Difficulty retargeting over a chain history view.
///
/// Holds only borrowed, read-only state, so one engine may serve concurrent
/// callers when the view does.
pub struct RetargetEngine<'a, V: ?Sized> {
    view: &'a V,
    params: &'a RetargetParams,
}

impl<'a, V> RetargetEngine<'a, V>
where
    V: ChainHistoryView + ?Sized,
{
    /// Create an engine over `view` with the given constants.
    pub fn new(view: &'a V, params: &'a RetargetParams) -> Self {
        Self { view, params }
    }

    /// Constants in use.
    pub fn params(&self) -> &RetargetParams {
        self.params
    }

    /// Next target for a candidate on `channel`.
    pub fn retarget(
        &self,
        channel: Channel,
        candidate: &CandidateBlock<'_>,
        verbose: bool,
    ) -> ConsensusResult<u32> {
        match channel {
            Channel::Stake => self.retarget_stake(candidate, verbose),
            Channel::Prime => self.retarget_prime(candidate, verbose),
            Channel::Hash => self.retarget_hash(candidate, verbose),
        }
    }

    fn history<'s>(
        &'s self,
        candidate: &'s CandidateBlock<'_>,
        channel: Channel,
    ) -> Option<ChannelHistory<'s>> {
        ChannelHistory::gather(self.view, candidate.parent, channel)
    }

    /// Observed production time for prime and hash.
    fn observed_time(&self, history: &ChannelHistory<'_>, version: ProtocolVersion) -> i64 {
        if version.uses_weighted_time() {
            self.view
                .weighted_time(history.first, self.params.weighted_samples)
        } else {
            history.actual_time()
        }
    }

    /// Chain modulation factor for prime and hash.
    fn chain_mod(&self, history: &ChannelHistory<'_>, version: ProtocolVersion) -> f64 {
        let age = chain_age(history.first.timestamp, self.params.genesis_timestamp);
        let expected = expected_subsidy(age, SubsidyStream::Miner, version.subsidy_decay_rate());
        chain_modulation(
            expected,
            history.first.miner_reserve(),
            version.chain_mod_floor(),
        )
    }

    /// Base timespan, shrunk by the chain mod from version 2 on.
    fn target_timespan(&self, version: ProtocolVersion, chain_mod: f64) -> i64 {
        let timespan = self.params.target_timespan;
        if version.scales_timespan() {
            scale_time(timespan, chain_mod).max(1)
        } else {
            timespan
        }
    }
}

/// Scale `previous` by `upper / lower`, multiplying first, and cap at `limit`.
pub(crate) fn scale_target(previous: &BigUint, upper: i64, lower: i64, limit: &BigUint) -> BigUint {
    let upper = BigUint::from(upper.max(1) as u64);
    let lower = BigUint::from(lower.max(1) as u64);

    let scaled = previous * upper / lower;
    if scaled > *limit {
        limit.clone()
    } else {
        scaled
    }
}

/// Values reported by a verbose retarget.
pub(crate) struct RetargetTrace<'a> {
    pub channel: Channel,
    pub history: &'a ChannelHistory<'a>,
    pub observed: i64,
    pub target: i64,
    /// Applied ratio as a percentage.
    pub adjustment: f64,
    pub chain_mod: Option<f64>,
    pub old_difficulty: f64,
    pub new_difficulty: f64,
}

impl RetargetTrace<'_> {
    pub fn emit(&self, genesis_timestamp: i64) {
        let age = chain_times(chain_age(self.history.first.timestamp, genesis_timestamp));

        info!(
            channel = self.channel.tag(),
            weighted_time = self.observed,
            actual_time = self.history.actual_time(),
            adjustment_pct = self.adjustment,
            target_time = self.target,
            released_reserve = self.history.first.miner_reserve() / COIN,
            chain_mod_pct = self.chain_mod.map(|m| m * 100.0),
            old_difficulty = self.old_difficulty,
            new_difficulty = self.new_difficulty,
            channel_height = self.history.first.channel_height,
            age_days = age.days,
            age_hours = age.hours,
            age_minutes = age.minutes,
            "RETARGET[{}]",
            self.channel.tag()
        );
    }
}

/// Next stake target for `candidate`.
pub fn retarget_stake<V>(
    view: &V,
    params: &RetargetParams,
    candidate: &CandidateBlock<'_>,
    verbose: bool,
) -> ConsensusResult<u32>
where
    V: ChainHistoryView + ?Sized,
{
    RetargetEngine::new(view, params).retarget_stake(candidate, verbose)
}

/// Next prime bits for `candidate`.
pub fn retarget_prime<V>(
    view: &V,
    params: &RetargetParams,
    candidate: &CandidateBlock<'_>,
    verbose: bool,
) -> ConsensusResult<u32>
where
    V: ChainHistoryView + ?Sized,
{
    RetargetEngine::new(view, params).retarget_prime(candidate, verbose)
}

/// Next hash target for `candidate`.
pub fn retarget_hash<V>(
    view: &V,
    params: &RetargetParams,
    candidate: &CandidateBlock<'_>,
    verbose: bool,
) -> ConsensusResult<u32>
where
    V: ChainHistoryView + ?Sized,
{
    RetargetEngine::new(view, params).retarget_hash(candidate, verbose)
}
