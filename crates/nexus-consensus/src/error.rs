//! Error types for retargeting.

use thiserror::Error;

/// Consensus errors raised while reading chain history or decoding targets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Compact target decodes to zero or a negative number.
    #[error("Invalid compact target 0x{bits:08x}: {reason}")]
    InvalidCompactTarget { bits: u32, reason: &'static str },

    /// Prime bits below one cluster.
    #[error("Invalid prime bits {0}")]
    InvalidPrimeBits(u32),

    /// Protocol version not known to any ruleset.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    /// Channel id outside Stake/Prime/Hash.
    #[error("Unknown channel id: {0}")]
    UnknownChannel(u8),

    /// Block record does not extend the arena tip.
    #[error("Malformed chain at height {height}: {reason}")]
    MalformedChain { height: u32, reason: String },

    /// Block not found.
    #[error("Block not found at height {0}")]
    BlockNotFound(u32),
}

/// Result type for consensus operations.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
