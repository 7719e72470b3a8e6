//! Property-based tests using proptest.
//!
//! These tests verify retarget invariants over randomly generated chains and
//! timing inputs.

use crate::generators::*;
use nexus_consensus::numeric::{bounded_adjustment, chain_modulation, scale_time, AdjustmentRates};
use nexus_consensus::{
    bits_to_score, decode_compact, encode_compact, hash_bounds, hash_decrease_rate, prime_ratio,
    score_to_bits, stake_bounds, ChainArena, Channel, ProtocolVersion, RetargetEngine,
    RetargetParams,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_version() -> impl Strategy<Value = ProtocolVersion> {
    prop_oneof![
        Just(ProtocolVersion::V1),
        Just(ProtocolVersion::V2),
        Just(ProtocolVersion::V3),
        Just(ProtocolVersion::V4),
    ]
}

fn arb_channel() -> impl Strategy<Value = Channel> {
    prop_oneof![Just(Channel::Stake), Just(Channel::Prime), Just(Channel::Hash)]
}

/// Block gaps including clock anomalies.
fn arb_gap() -> impl Strategy<Value = i64> {
    -600i64..=5_000i64
}

/// Prime difficulty scores strictly above one cluster.
fn arb_prime_difficulty() -> impl Strategy<Value = f64> {
    1.01f64..12.0f64
}

/// Valid stored bits for `channel`, from the ease ceiling down to very hard.
fn arb_bits(channel: Channel) -> BoxedStrategy<u32> {
    let params = RetargetParams::mainnet();
    match channel {
        Channel::Prime => (params.prime.min_bits..=120_000_000u32).boxed(),
        Channel::Stake | Channel::Hash => {
            let limit = match channel {
                Channel::Stake => params.stake.limit,
                _ => params.hash.limit,
            };
            (0u32..800)
                .prop_map(move |shift| encode_compact(&(&limit >> shift)))
                .boxed()
        }
    }
}

/// A mainnet chain of one channel's blocks, with random gaps and reserve.
fn arb_chain() -> impl Strategy<Value = (Channel, ChainArena)> {
    arb_channel().prop_flat_map(|channel| {
        (
            Just(channel),
            prop::collection::vec((arb_gap(), arb_bits(channel), any::<u64>()), 0..10),
            arb_version(),
        )
            .prop_map(|(channel, blocks, version)| {
                let mut builder = ChainBuilder::mainnet();
                builder.version(version);
                for (gap, bits, reserve) in blocks {
                    builder.reserve(reserve).push(channel, gap, bits);
                }
                (channel, builder.build())
            })
    })
}

// ============================================================================
// Retarget invariants
// ============================================================================

proptest! {
    /// Targets never ease past the channel ceiling.
    #[test]
    fn retarget_respects_ceiling((channel, arena) in arb_chain(), version in arb_version()) {
        let params = RetargetParams::mainnet();
        let engine = RetargetEngine::new(&arena, &params);
        let bits = engine.retarget(channel, &candidate_on_tip(&arena, version), false).unwrap();

        match channel {
            Channel::Prime => prop_assert!(bits >= params.prime.min_bits),
            Channel::Stake => prop_assert!(decode_compact(bits).unwrap() <= params.stake.limit),
            Channel::Hash => prop_assert!(decode_compact(bits).unwrap() <= params.hash.limit),
        }
    }

    /// The same inputs always give the same target.
    #[test]
    fn retarget_is_deterministic((channel, arena) in arb_chain(), version in arb_version()) {
        let params = RetargetParams::mainnet();
        let engine = RetargetEngine::new(&arena, &params);
        let candidate = candidate_on_tip(&arena, version);

        let first = engine.retarget(channel, &candidate, false).unwrap();
        let second = engine.retarget(channel, &candidate, true).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Slower production never raises difficulty; faster never lowers it.
    #[test]
    fn hash_bounds_monotonic(
        version in arb_version(),
        a in 1i64..2_000,
        b in 1i64..2_000,
        target in 1i64..600,
    ) {
        let (slow, fast) = if a >= b { (a, b) } else { (b, a) };
        let (upper, lower_slow) = hash_bounds(version, slow, target, 1.0);
        let (_, lower_fast) = hash_bounds(version, fast, target, 1.0);

        prop_assert!(lower_slow <= lower_fast);
        if slow >= target {
            prop_assert!(lower_slow <= upper);
        }
        if fast < target {
            prop_assert!(lower_fast >= upper);
        }
    }

    #[test]
    fn stake_bounds_monotonic(a in 0i64..2_000, b in 0i64..2_000) {
        let (slow, fast) = if a >= b { (a, b) } else { (b, a) };
        let (_, lower_slow) = stake_bounds(slow, 150);
        let (_, lower_fast) = stake_bounds(fast, 150);
        prop_assert!(lower_slow <= lower_fast);
    }

    #[test]
    fn prime_ratio_monotonic(
        version in arb_version(),
        difficulty in arb_prime_difficulty(),
        a in 1i64..2_000,
        b in 1i64..2_000,
    ) {
        let (slow, fast) = if a >= b { (a, b) } else { (b, a) };
        let ratio_slow = prime_ratio(version, difficulty, slow, 150, 1.0);
        let ratio_fast = prime_ratio(version, difficulty, fast, 150, 1.0);

        prop_assert!(ratio_slow <= ratio_fast);
        if slow >= 150 {
            prop_assert!(ratio_slow <= 1.0);
        }
        if fast < 150 {
            prop_assert!(ratio_fast >= 1.0);
        }
    }

    /// At the far end of the overlap window the ratio equals the configured rate.
    #[test]
    fn bounded_adjustment_saturates_at_rate(
        target in 1i64..1_000,
        beyond in 0i64..10_000,
        decrease in 0.0f64..1.0,
        increase in 0.0f64..1.0,
    ) {
        let rates = AdjustmentRates::new(decrease, increase);
        prop_assert_eq!(bounded_adjustment(3 * target + beyond, target, rates), 1.0 - decrease);
        prop_assert_eq!(bounded_adjustment(0, target, rates), 1.0 + increase);

        let ratio = bounded_adjustment(target / 2, target, rates);
        prop_assert!(ratio >= 1.0 && ratio <= 1.0 + increase);
    }

    #[test]
    fn hash_bounds_at_extremes(beyond in 0i64..10_000) {
        for version in [ProtocolVersion::V3, ProtocolVersion::V4] {
            let (upper, lower) = hash_bounds(version, 450 + beyond, 150, 1.0);
            prop_assert_eq!(upper, 150);
            prop_assert_eq!(lower, scale_time(150, 1.0 - hash_decrease_rate(version)));
        }
    }

    #[test]
    fn prime_ratio_at_extremes(difficulty in arb_prime_difficulty(), beyond in 0i64..5_000) {
        let excess = difficulty - 1.0;
        for version in [ProtocolVersion::V3, ProtocolVersion::V4] {
            prop_assert_eq!(
                prime_ratio(version, difficulty, 450 + beyond, 150, 1.0),
                1.0 - 0.5 / (excess * 5.0)
            );
            prop_assert_eq!(
                prime_ratio(version, difficulty, 0, 150, 1.0),
                1.0 + 0.125 / (excess * 10.0)
            );
        }
    }

    /// Chain mod stays within `[floor, 1]` for every reserve, including zero.
    #[test]
    fn chain_modulation_clamped(
        expected in 0.0f64..1.0e15,
        reserve in any::<u64>(),
        version in arb_version(),
    ) {
        let floor = version.chain_mod_floor();
        let chain_mod = chain_modulation(expected, reserve, floor);
        prop_assert!(chain_mod.is_finite());
        prop_assert!(chain_mod >= floor);
        prop_assert!(chain_mod <= 1.0);
    }

    /// Prime bits survive a score round trip within one encoding step.
    #[test]
    fn prime_score_roundtrip(bits in 10_000_001u32..=u32::MAX) {
        let back = score_to_bits(bits_to_score(bits));
        prop_assert!(back == bits || back + 1 == bits, "{} -> {}", bits, back);
    }
}
