//! Protocol versions and the retarget rules each one selects.
//!
//! Every formula choice is a method on [`ProtocolVersion`] so the gating is
//! visible in one place and testable case by case.

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block protocol version, as declared by the candidate block.
///
/// `V4` covers version 4 and every later version: no later version changed
/// the retarget formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ProtocolVersion {
    /// Chain mod scales the adjustment ratio.
    V1,
    /// Chain mod scales the target timespan.
    V2,
    /// Proportional bounded adjustment; slower subsidy decay window.
    V3,
    /// Weighted block times for prime and hash channels.
    V4,
}

impl ProtocolVersion {
    /// Numeric version (4 for `V4` and later).
    pub fn number(self) -> u32 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
            ProtocolVersion::V4 => 4,
        }
    }

    /// Prime and hash observe the weighted time statistic instead of the last gap.
    pub fn uses_weighted_time(self) -> bool {
        self >= ProtocolVersion::V4
    }

    /// Chain mod shrinks the target timespan rather than the adjustment ratio.
    pub fn scales_timespan(self) -> bool {
        self >= ProtocolVersion::V2
    }

    /// Chain mod multiplies the adjustment ratio directly.
    pub fn applies_chain_mod_to_ratio(self) -> bool {
        self == ProtocolVersion::V1
    }

    /// Proportional bounded adjustment instead of a clamped block ratio.
    pub fn uses_bounded_adjustment(self) -> bool {
        self >= ProtocolVersion::V3
    }

    /// Minutes of expected emission compared against the released reserve.
    pub fn subsidy_decay_rate(self) -> f64 {
        if self >= ProtocolVersion::V3 {
            40.0
        } else {
            20.0
        }
    }

    /// Lowest chain modulation factor.
    pub fn chain_mod_floor(self) -> f64 {
        if self == ProtocolVersion::V1 {
            0.75
        } else {
            0.5
        }
    }
}

impl TryFrom<u32> for ProtocolVersion {
    type Error = ConsensusError;

    fn try_from(raw: u32) -> ConsensusResult<Self> {
        match raw {
            0 => Err(ConsensusError::UnsupportedVersion(0)),
            1 => Ok(ProtocolVersion::V1),
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            _ => Ok(ProtocolVersion::V4),
        }
    }
}

impl From<ProtocolVersion> for u32 {
    fn from(version: ProtocolVersion) -> u32 {
        version.number()
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}
