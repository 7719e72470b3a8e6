//! Chain history traversal.
//!
//! Blocks live in an append-only arena indexed by height. Each record keeps
//! the height of its predecessor as a plain integer, so walking backward is a
//! bounds-checked index lookup. The genesis block has no predecessor; reaching
//! it ends every backward walk.

use crate::compact::decode_compact;
use crate::difficulty::is_valid_prime_bits;
use crate::{Channel, ConsensusError, ConsensusResult, ProtocolVersion};
use serde::{Deserialize, Serialize};

/// One accepted block, as seen by retargeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Block height.
    pub height: u32,
    /// Block timestamp in seconds.
    pub timestamp: i64,
    /// Protocol version the block was mined under.
    pub version: ProtocolVersion,
    /// Channel that produced the block.
    pub channel: Channel,
    /// Target the block satisfied: compact bits for stake and hash, cluster
    /// bits for prime.
    pub bits: u32,
    /// Number of blocks on this block's channel, including itself.
    #[serde(default)]
    pub channel_height: u32,
    /// Cumulative reserve released as of this block, per emission stream.
    #[serde(default)]
    pub released_reserve: [u64; 3],
    /// Height of the predecessor. Set by the arena.
    #[serde(skip)]
    prev: Option<u32>,
}

impl BlockRecord {
    /// Create a record with no released reserve.
    pub fn new(
        height: u32,
        timestamp: i64,
        version: ProtocolVersion,
        channel: Channel,
        bits: u32,
    ) -> Self {
        Self {
            height,
            timestamp,
            version,
            channel,
            bits,
            channel_height: 0,
            released_reserve: [0; 3],
            prev: None,
        }
    }

    /// Set the released reserve of the mining stream.
    pub fn with_miner_reserve(mut self, reserve: u64) -> Self {
        self.released_reserve[0] = reserve;
        self
    }

    /// Reserve released on the mining stream, consulted by chain modulation.
    pub fn miner_reserve(&self) -> u64 {
        self.released_reserve[0]
    }

    /// Height of the predecessor, `None` for genesis.
    pub fn prev(&self) -> Option<u32> {
        self.prev
    }

    /// Check the stored target is a valid encoding for its channel.
    fn validate_bits(&self) -> ConsensusResult<()> {
        match self.channel {
            Channel::Prime if !is_valid_prime_bits(self.bits) => {
                Err(ConsensusError::InvalidPrimeBits(self.bits))
            }
            Channel::Prime => Ok(()),
            Channel::Stake | Channel::Hash => decode_compact(self.bits).map(|_| ()),
        }
    }
}

/// Read-only view over committed chain history.
///
/// Implementors provide height lookup; the channel walks and the weighted
/// time statistic are derived from it.
pub trait ChainHistoryView {
    /// Block at `height`, if present.
    fn block(&self, height: u32) -> Option<&BlockRecord>;

    /// Predecessor of `record`, `None` at the genesis boundary.
    fn predecessor(&self, record: &BlockRecord) -> Option<&BlockRecord> {
        record.prev().and_then(|height| self.block(height))
    }

    /// Nearest block of `channel` at or before `from`.
    ///
    /// Returns `None` when the walk reaches a block without predecessor before
    /// finding one; a genesis-boundary block never counts as channel history.
    fn last_channel_block<'a>(
        &'a self,
        from: &'a BlockRecord,
        channel: Channel,
    ) -> Option<&'a BlockRecord> {
        let mut cursor = from;
        loop {
            let prev = self.predecessor(cursor)?;
            if cursor.channel == channel {
                return Some(cursor);
            }
            cursor = prev;
        }
    }

    /// Weighted average of the last `samples` block intervals on the channel
    /// of `first`, in seconds.
    ///
    /// The newest interval weighs `3 * samples`, the oldest `3`. Each interval
    /// is at least one second. Returns 1 when no interval is available.
    fn weighted_time(&self, first: &BlockRecord, samples: u32) -> i64 {
        let mut weighted: i64 = 0;
        let mut weights: i64 = 0;
        let mut cursor = first;

        for index in (1..=i64::from(samples)).rev() {
            let Some(prev) = self.predecessor(cursor) else {
                break;
            };
            let Some(last) = self.last_channel_block(prev, first.channel) else {
                break;
            };

            let weight = index * 3;
            let interval = cursor.timestamp.saturating_sub(last.timestamp).max(1);
            weighted = weighted.saturating_add(interval.saturating_mul(weight));
            weights += weight;
            cursor = last;
        }

        if weights == 0 {
            1
        } else {
            weighted / weights
        }
    }
}

/// Append-only chain arena indexed by height.
#[derive(Debug, Clone, Default)]
pub struct ChainArena {
    blocks: Vec<BlockRecord>,
    channel_heights: [u32; 3],
}

impl ChainArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from records in height order.
    pub fn from_records<I>(records: I) -> ConsensusResult<Self>
    where
        I: IntoIterator<Item = BlockRecord>,
    {
        let mut arena = Self::new();
        for record in records {
            arena.push(record)?;
        }
        Ok(arena)
    }

    /// Append a block on top of the current tip.
    ///
    /// The record's height must equal the arena length. Its predecessor link
    /// and channel height are assigned here.
    pub fn push(&mut self, mut record: BlockRecord) -> ConsensusResult<&BlockRecord> {
        let expected = self.blocks.len() as u32;
        if record.height != expected {
            return Err(ConsensusError::MalformedChain {
                height: record.height,
                reason: format!("expected height {}", expected),
            });
        }

        record.validate_bits().map_err(|e| ConsensusError::MalformedChain {
            height: record.height,
            reason: e.to_string(),
        })?;

        let slot = record.channel.id() as usize;
        self.channel_heights[slot] += 1;
        record.channel_height = self.channel_heights[slot];
        record.prev = expected.checked_sub(1);

        self.blocks.push(record);
        Ok(&self.blocks[expected as usize])
    }

    /// Most recent block.
    pub fn tip(&self) -> Option<&BlockRecord> {
        self.blocks.last()
    }

    /// Block at `height`, or an error naming it.
    pub fn get(&self, height: u32) -> ConsensusResult<&BlockRecord> {
        self.blocks
            .get(height as usize)
            .ok_or(ConsensusError::BlockNotFound(height))
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the arena holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks in height order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockRecord> {
        self.blocks.iter()
    }
}

impl ChainHistoryView for ChainArena {
    fn block(&self, height: u32) -> Option<&BlockRecord> {
        self.blocks.get(height as usize)
    }
}

/// Chain age in whole minutes since genesis, floored at zero.
pub fn chain_age(timestamp: i64, genesis_timestamp: i64) -> u64 {
    (timestamp.saturating_sub(genesis_timestamp).max(0) / 60) as u64
}

/// Chain age broken into days, hours and minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTimes {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

/// Split a chain age in minutes for display.
pub fn chain_times(age_minutes: u64) -> ChainTimes {
    let days = age_minutes / 1440;
    let hours = (age_minutes - days * 1440) / 60;
    let minutes = age_minutes % 60;
    ChainTimes {
        days,
        hours,
        minutes,
    }
}
