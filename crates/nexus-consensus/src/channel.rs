//! Mining channels.

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three independently retargeted mining tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Proof-of-stake (trust) channel.
    Stake,
    /// Prime-cluster channel.
    Prime,
    /// Hash channel.
    Hash,
}

impl Channel {
    /// All channels in id order.
    pub const ALL: [Channel; 3] = [Channel::Stake, Channel::Prime, Channel::Hash];

    /// Numeric channel id as stored in block headers.
    pub fn id(self) -> u8 {
        match self {
            Channel::Stake => 0,
            Channel::Prime => 1,
            Channel::Hash => 2,
        }
    }

    /// Short tag used in diagnostics.
    pub fn tag(self) -> &'static str {
        match self {
            Channel::Stake => "POS",
            Channel::Prime => "CPU",
            Channel::Hash => "GPU",
        }
    }
}

impl TryFrom<u8> for Channel {
    type Error = ConsensusError;

    fn try_from(id: u8) -> ConsensusResult<Self> {
        match id {
            0 => Ok(Channel::Stake),
            1 => Ok(Channel::Prime),
            2 => Ok(Channel::Hash),
            other => Err(ConsensusError::UnknownChannel(other)),
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stake" | "pos" | "0" => Ok(Channel::Stake),
            "prime" | "cpu" | "1" => Ok(Channel::Prime),
            "hash" | "gpu" | "2" => Ok(Channel::Hash),
            other => Err(format!("unknown channel '{}'", other)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Stake => "stake",
            Channel::Prime => "prime",
            Channel::Hash => "hash",
        };
        f.write_str(name)
    }
}
