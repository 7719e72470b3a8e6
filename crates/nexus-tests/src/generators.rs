//! Test chain generators.
//!
//! Provides a builder that lays out interleaved channel blocks with chosen
//! spacing, protocol version and released reserve.

use nexus_consensus::{
    BlockRecord, CandidateBlock, ChainArena, Channel, ProtocolVersion, RetargetEngine,
    RetargetParams,
};

/// Bits a fresh test block carries on `channel` when none are given.
pub fn default_bits(channel: Channel, params: &RetargetParams) -> u32 {
    match channel {
        Channel::Stake => params.stake.start_bits(),
        Channel::Prime => params.prime.start_bits,
        Channel::Hash => params.hash.start_bits(),
    }
}

/// Builds a chain on top of a stake genesis block.
pub struct ChainBuilder {
    arena: ChainArena,
    params: RetargetParams,
    timestamp: i64,
    version: ProtocolVersion,
    reserve: u64,
}

impl ChainBuilder {
    /// Start a chain with a genesis block at the network genesis timestamp.
    pub fn new(params: RetargetParams) -> Self {
        let mut arena = ChainArena::new();
        let genesis = BlockRecord::new(
            0,
            params.genesis_timestamp,
            ProtocolVersion::V1,
            Channel::Stake,
            params.stake.start_bits(),
        );
        arena.push(genesis).expect("genesis extends an empty arena");

        Self {
            arena,
            timestamp: params.genesis_timestamp,
            params,
            version: ProtocolVersion::V4,
            reserve: 0,
        }
    }

    /// Start a mainnet chain.
    pub fn mainnet() -> Self {
        Self::new(RetargetParams::mainnet())
    }

    /// Protocol version stamped on subsequent blocks.
    pub fn version(&mut self, version: ProtocolVersion) -> &mut Self {
        self.version = version;
        self
    }

    /// Miner reserve released as of subsequent blocks.
    pub fn reserve(&mut self, reserve: u64) -> &mut Self {
        self.reserve = reserve;
        self
    }

    /// Advance the clock without adding a block.
    pub fn wait(&mut self, seconds: i64) -> &mut Self {
        self.timestamp += seconds;
        self
    }

    /// Append one block `gap` seconds after the previous one.
    pub fn push(&mut self, channel: Channel, gap: i64, bits: u32) -> &mut Self {
        self.timestamp += gap;
        let record = BlockRecord::new(
            self.arena.len() as u32,
            self.timestamp,
            self.version,
            channel,
            bits,
        )
        .with_miner_reserve(self.reserve);

        self.arena
            .push(record)
            .expect("generated block must extend the chain");
        self
    }

    /// Append `count` blocks of `channel`, `gap` seconds apart.
    pub fn push_many(&mut self, channel: Channel, count: usize, gap: i64, bits: u32) -> &mut Self {
        for _ in 0..count {
            self.push(channel, gap, bits);
        }
        self
    }

    /// Append a block carrying the bits the engine requires of it.
    pub fn mine(&mut self, channel: Channel, gap: i64) -> &mut Self {
        let bits = {
            let engine = RetargetEngine::new(&self.arena, &self.params);
            let tip = self.arena.tip().expect("builder chain is never empty");
            engine
                .retarget(channel, &CandidateBlock::new(tip, self.version), false)
                .expect("generated history holds valid targets")
        };
        self.push(channel, gap, bits)
    }

    /// Parameters the chain was built with.
    pub fn params(&self) -> &RetargetParams {
        &self.params
    }

    /// Chain built so far.
    pub fn arena(&self) -> &ChainArena {
        &self.arena
    }

    /// Finish the chain.
    pub fn build(self) -> ChainArena {
        self.arena
    }
}

/// `count` blocks of `channel` at `bits`, `gap` seconds apart, on mainnet.
pub fn uniform_chain(channel: Channel, count: usize, gap: i64, bits: u32) -> ChainArena {
    let mut builder = ChainBuilder::mainnet();
    builder.push_many(channel, count, gap, bits);
    builder.build()
}

/// Candidate block on the tip of `arena`.
pub fn candidate_on_tip(arena: &ChainArena, version: ProtocolVersion) -> CandidateBlock<'_> {
    let tip = arena.tip().expect("test chain is never empty");
    CandidateBlock::new(tip, version)
}
