//! # nexus-consensus
//!
//! Difficulty retargeting for the Nexus chain.
//!
//! Three independently mined channels share one block sequence:
//! - Stake (trust) blocks, targeted by a compact 1024-bit threshold
//! - Prime blocks, targeted by a prime-cluster size encoded as integer bits
//! - Hash blocks, targeted by a compact 1024-bit threshold
//!
//! Each channel retargets from its own history only. Every retarget is a pure
//! function of the chain history, the candidate block's protocol version and
//! the [`RetargetParams`] passed in, so historical blocks can be re-validated
//! under the rules they were mined with.
//!
//! ## Retargeting
//!
//! All channels share a bounded-adjustment step: the observed production time
//! is compared with the target spacing and converted into a ratio close to 1.0
//! that saturates once the error exceeds one full interval. Protocol versions
//! 1 through 4 changed the formulas; see [`ProtocolVersion`].

mod chain;
mod channel;
mod compact;
mod difficulty;
mod error;
pub mod numeric;
mod retarget;
mod retarget_params;
pub mod subsidy;
mod version;

pub use chain::{chain_age, chain_times, BlockRecord, ChainArena, ChainHistoryView, ChainTimes};
pub use channel::Channel;
pub use compact::{decode_compact, encode_compact, max_target};
pub use difficulty::{
    bits_to_score, compact_difficulty, difficulty, is_valid_prime_bits, score_to_bits,
};
pub use error::{ConsensusError, ConsensusResult};
pub use retarget::{
    hash_bounds, hash_decrease_rate, prime_ratio, retarget_hash, retarget_prime, retarget_stake,
    stake_bounds, CandidateBlock, ChannelHistory, RetargetEngine,
};
pub use retarget_params::{
    ClusterBounds, RetargetParams, RetargetParamsConfig, RetargetParamsError, TargetBounds,
};
pub use version::ProtocolVersion;

/// Nexus network parameters.
pub mod params {
    /// Base units per coin.
    pub const COIN: u64 = 1_000_000;

    /// Target seconds between stake channel blocks.
    pub const STAKE_TARGET_SPACING: i64 = 150;

    /// Target seconds between prime or hash channel blocks.
    pub const TARGET_TIMESPAN: i64 = 150;

    /// Channel intervals averaged by the weighted time statistic.
    pub const WEIGHTED_TIME_SAMPLES: u32 = 5;

    /// Mainnet genesis block timestamp (seconds).
    pub const MAINNET_GENESIS_TIMESTAMP: i64 = 1_409_456_199;

    /// Testnet genesis block timestamp (seconds).
    pub const TESTNET_GENESIS_TIMESTAMP: i64 = 1_421_949_600;

    /// Width of stake and hash targets in bits.
    pub const TARGET_BITS: u32 = 1024;

    /// Prime bits per unit of cluster size.
    pub const PRIME_BITS_SCALE: f64 = 10_000_000.0;

    /// Easiest prime cluster size accepted on mainnet (bits).
    pub const PRIME_MIN_BITS: u32 = 20_000_000;

    /// Prime cluster size used until the channel has history (bits).
    pub const PRIME_START_BITS: u32 = 25_000_000;
}
