//! Retarget parameters.
//!
//! Every constant the retarget engine reads is carried in [`RetargetParams`]
//! and passed into each call; nothing is process-global.
//! - `RetargetParams::mainnet()` / `RetargetParams::testnet()` for the public networks
//! - `RetargetParams::from_config()` for private networks and tooling

use crate::compact::{encode_compact, max_target};
use crate::params::{
    MAINNET_GENESIS_TIMESTAMP, PRIME_BITS_SCALE, PRIME_MIN_BITS, PRIME_START_BITS,
    STAKE_TARGET_SPACING, TARGET_BITS, TARGET_TIMESPAN, TESTNET_GENESIS_TIMESTAMP,
    WEIGHTED_TIME_SAMPLES,
};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Start target and ease ceiling of a compact-target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBounds {
    /// Target used until the channel has two blocks of history.
    pub start: BigUint,
    /// Easiest target ever allowed.
    pub limit: BigUint,
}

impl TargetBounds {
    /// Start target as compact bits.
    pub fn start_bits(&self) -> u32 {
        encode_compact(&self.start)
    }

    /// Ease ceiling as compact bits.
    pub fn limit_bits(&self) -> u32 {
        encode_compact(&self.limit)
    }
}

/// Start and minimum cluster size of the prime channel, in prime bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterBounds {
    /// Bits used until the channel has two blocks of history.
    pub start_bits: u32,
    /// Easiest cluster size ever allowed.
    pub min_bits: u32,
}

/// Error when constructing RetargetParams from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetargetParamsError {
    /// The field that is missing or invalid.
    pub field: &'static str,
    /// Description of the error.
    pub message: String,
}

impl RetargetParamsError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn missing(field: &'static str) -> Self {
        Self::new(field, "required field missing")
    }
}

impl fmt::Display for RetargetParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetargetParams error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for RetargetParamsError {}

/// Configuration for loading RetargetParams from TOML/JSON.
///
/// All fields are optional so partial configs can be validated with clear errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetargetParamsConfig {
    /// Target seconds between stake blocks.
    pub stake_spacing: Option<i64>,
    /// Target seconds between prime or hash blocks.
    pub target_timespan: Option<i64>,
    /// Intervals averaged by the weighted time statistic.
    pub weighted_samples: Option<u32>,
    /// Genesis timestamp in seconds.
    pub genesis_timestamp: Option<i64>,
    /// Stake start target as hex.
    pub stake_start_hex: Option<String>,
    /// Stake ease ceiling as hex.
    pub stake_limit_hex: Option<String>,
    /// Hash start target as hex.
    pub hash_start_hex: Option<String>,
    /// Hash ease ceiling as hex.
    pub hash_limit_hex: Option<String>,
    /// Prime start cluster size in bits.
    pub prime_start_bits: Option<u32>,
    /// Prime minimum cluster size in bits.
    pub prime_min_bits: Option<u32>,
}

/// Network-specific retarget constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetargetParams {
    /// Target seconds between stake blocks. Never version-gated.
    pub stake_spacing: i64,
    /// Base target seconds between prime or hash blocks.
    pub target_timespan: i64,
    /// Intervals averaged by the weighted time statistic.
    pub weighted_samples: u32,
    /// Genesis timestamp, origin of the chain age.
    pub genesis_timestamp: i64,
    /// Stake channel targets.
    pub stake: TargetBounds,
    /// Prime channel cluster sizes.
    pub prime: ClusterBounds,
    /// Hash channel targets.
    pub hash: TargetBounds,
}

impl Default for RetargetParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl RetargetParams {
    /// Create mainnet parameters.
    pub fn mainnet() -> Self {
        Self {
            stake_spacing: STAKE_TARGET_SPACING,
            target_timespan: TARGET_TIMESPAN,
            weighted_samples: WEIGHTED_TIME_SAMPLES,
            genesis_timestamp: MAINNET_GENESIS_TIMESTAMP,
            stake: TargetBounds {
                start: max_target() >> 7u32,
                limit: max_target() >> 5u32,
            },
            prime: ClusterBounds {
                start_bits: PRIME_START_BITS,
                min_bits: PRIME_MIN_BITS,
            },
            hash: TargetBounds {
                start: max_target() >> 37u32,
                limit: max_target() >> 5u32,
            },
        }
    }

    /// Create testnet parameters.
    pub fn testnet() -> Self {
        Self {
            genesis_timestamp: TESTNET_GENESIS_TIMESTAMP,
            hash: TargetBounds {
                start: max_target() >> 20u32,
                limit: max_target() >> 5u32,
            },
            ..Self::mainnet()
        }
    }

    /// Parameters for a named network (`mainnet` or `testnet`).
    pub fn for_network(network: &str) -> Option<Self> {
        match network {
            "mainnet" => Some(Self::mainnet()),
            "testnet" => Some(Self::testnet()),
            _ => None,
        }
    }

    /// Create RetargetParams from configuration.
    ///
    /// Returns an error naming the specific field if any required field is
    /// missing or invalid. Hex targets are trimmed and accept a "0x" prefix.
    pub fn from_config(config: &RetargetParamsConfig) -> Result<Self, RetargetParamsError> {
        let params = Self {
            stake_spacing: config
                .stake_spacing
                .ok_or_else(|| RetargetParamsError::missing("stake_spacing"))?,
            target_timespan: config
                .target_timespan
                .ok_or_else(|| RetargetParamsError::missing("target_timespan"))?,
            weighted_samples: config
                .weighted_samples
                .ok_or_else(|| RetargetParamsError::missing("weighted_samples"))?,
            genesis_timestamp: config
                .genesis_timestamp
                .ok_or_else(|| RetargetParamsError::missing("genesis_timestamp"))?,
            stake: TargetBounds {
                start: parse_target("stake_start_hex", config.stake_start_hex.as_deref())?,
                limit: parse_target("stake_limit_hex", config.stake_limit_hex.as_deref())?,
            },
            prime: ClusterBounds {
                start_bits: config
                    .prime_start_bits
                    .ok_or_else(|| RetargetParamsError::missing("prime_start_bits"))?,
                min_bits: config
                    .prime_min_bits
                    .ok_or_else(|| RetargetParamsError::missing("prime_min_bits"))?,
            },
            hash: TargetBounds {
                start: parse_target("hash_start_hex", config.hash_start_hex.as_deref())?,
                limit: parse_target("hash_limit_hex", config.hash_limit_hex.as_deref())?,
            },
        };

        params.validate()?;
        Ok(params)
    }

    /// Check the constants keep every retarget step well defined.
    pub fn validate(&self) -> Result<(), RetargetParamsError> {
        if self.stake_spacing < 1 {
            return Err(RetargetParamsError::new("stake_spacing", "must be at least 1 second"));
        }
        if self.target_timespan < 1 {
            return Err(RetargetParamsError::new(
                "target_timespan",
                "must be at least 1 second",
            ));
        }
        if self.weighted_samples == 0 {
            return Err(RetargetParamsError::new("weighted_samples", "must be at least 1"));
        }

        check_bounds(&self.stake, "stake_start_hex", "stake_limit_hex")?;
        check_bounds(&self.hash, "hash_start_hex", "hash_limit_hex")?;

        // Prime step sizes divide by (cluster size - 1).
        if f64::from(self.prime.min_bits) <= PRIME_BITS_SCALE {
            return Err(RetargetParamsError::new(
                "prime_min_bits",
                format!("must exceed one cluster ({} bits)", PRIME_BITS_SCALE as u32),
            ));
        }
        if self.prime.start_bits < self.prime.min_bits {
            return Err(RetargetParamsError::new(
                "prime_start_bits",
                "must not be below prime_min_bits",
            ));
        }

        Ok(())
    }
}

impl From<&RetargetParams> for RetargetParamsConfig {
    fn from(params: &RetargetParams) -> Self {
        Self {
            stake_spacing: Some(params.stake_spacing),
            target_timespan: Some(params.target_timespan),
            weighted_samples: Some(params.weighted_samples),
            genesis_timestamp: Some(params.genesis_timestamp),
            stake_start_hex: Some(target_hex(&params.stake.start)),
            stake_limit_hex: Some(target_hex(&params.stake.limit)),
            hash_start_hex: Some(target_hex(&params.hash.start)),
            hash_limit_hex: Some(target_hex(&params.hash.limit)),
            prime_start_bits: Some(params.prime.start_bits),
            prime_min_bits: Some(params.prime.min_bits),
        }
    }
}

fn target_hex(target: &BigUint) -> String {
    format!("0x{}", hex::encode(target.to_bytes_be()))
}

fn parse_target(field: &'static str, value: Option<&str>) -> Result<BigUint, RetargetParamsError> {
    let raw = value.ok_or_else(|| RetargetParamsError::missing(field))?;

    // Hex hygiene: trim whitespace and strip optional 0x prefix
    let cleaned = raw.trim();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(cleaned);

    let target = BigUint::parse_bytes(cleaned.as_bytes(), 16)
        .ok_or_else(|| RetargetParamsError::new(field, format!("invalid hex string: '{}'", raw)))?;

    if target.is_zero() {
        return Err(RetargetParamsError::new(field, "target cannot be zero"));
    }

    Ok(target)
}

fn check_bounds(
    bounds: &TargetBounds,
    start_field: &'static str,
    limit_field: &'static str,
) -> Result<(), RetargetParamsError> {
    if bounds.limit.bits() > u64::from(TARGET_BITS) {
        return Err(RetargetParamsError::new(
            limit_field,
            format!("wider than {} bits", TARGET_BITS),
        ));
    }
    if bounds.start.is_zero() {
        return Err(RetargetParamsError::new(start_field, "target cannot be zero"));
    }
    if bounds.start > bounds.limit {
        return Err(RetargetParamsError::new(
            start_field,
            "start target is easier than the limit",
        ));
    }
    Ok(())
}
