//! Deterministic floating point for consensus values.
//!
//! Every floating step of retargeting lives here. All arithmetic is IEEE-754
//! binary64 with round-to-nearest-even, written with a fixed evaluation order;
//! Rust never contracts `a * b + c` into a fused multiply-add, so the same
//! inputs give the same bits on every platform. Conversions back to integers
//! truncate toward zero and saturate at the integer bounds.

/// Maximum fractional change per retarget, applied in proportion to the
/// timing error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentRates {
    /// Largest relative decrease of the ratio (slow blocks).
    pub decrease: f64,
    /// Largest relative increase of the ratio (fast blocks).
    pub increase: f64,
}

impl AdjustmentRates {
    /// Create rates.
    pub const fn new(decrease: f64, increase: f64) -> Self {
        Self { decrease, increase }
    }
}

/// Bounded adjustment ratio for an observed production time.
///
/// Slow production (`observed >= target`) yields `1 - decrease * p` where `p`
/// is the overshoot as a share of two target intervals, saturating at 1.
/// Fast production yields `1 + p * increase` where `p` is the shortfall as a
/// share of one target interval.
///
/// `target` must be positive.
pub fn bounded_adjustment(observed: i64, target: i64, rates: AdjustmentRates) -> f64 {
    debug_assert!(target > 0, "target timespan must be positive");

    if observed >= target {
        let overlap = (observed - target).min(target * 2);
        let proportion = overlap as f64 / (target * 2) as f64;
        1.0 - rates.decrease * proportion
    } else {
        let overlap = target - observed;
        let proportion = overlap as f64 / target as f64;
        1.0 + proportion * rates.increase
    }
}

/// Scale an integer timespan by a ratio, truncating toward zero.
pub fn scale_time(time: i64, factor: f64) -> i64 {
    (time as f64 * factor) as i64
}

/// Clamp `value` to `[low, high]`, applying the upper bound first.
///
/// Unlike `f64::clamp` this never panics; when `low > high` the lower bound
/// wins.
pub fn clamp_ratio(value: f64, low: f64, high: f64) -> f64 {
    value.min(high).max(low)
}

/// Ratio of target to observed time, clamped to `[low, high]`.
///
/// `observed` must be positive.
pub fn clamped_block_ratio(target: i64, observed: i64, low: f64, high: f64) -> f64 {
    clamp_ratio(target as f64 / observed as f64, low, high)
}

/// Chain modulation factor.
///
/// Ratio of the emission expected over the subsidy window to the reserve
/// released so far, clamped to `[floor, 1.0]`. The `+ 1` keeps a zero reserve
/// finite.
pub fn chain_modulation(expected_subsidy: f64, released_reserve: u64, floor: f64) -> f64 {
    let ratio = expected_subsidy / released_reserve.saturating_add(1) as f64;
    clamp_ratio(ratio, floor, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAKE: AdjustmentRates = AdjustmentRates::new(0.15, 0.075);

    #[test]
    fn test_on_target_is_neutral() {
        assert_eq!(bounded_adjustment(150, 150, STAKE), 1.0);
    }

    #[test]
    fn test_slow_saturates_at_decrease_rate() {
        assert_eq!(bounded_adjustment(450, 150, STAKE), 1.0 - 0.15);
        assert_eq!(bounded_adjustment(10_000, 150, STAKE), 1.0 - 0.15);
    }

    #[test]
    fn test_fast_approaches_increase_rate() {
        let fastest = bounded_adjustment(1, 150, STAKE);
        assert!(fastest > 1.0);
        assert!(fastest < 1.075);
        // Zero observed time reaches the full rate.
        assert_eq!(bounded_adjustment(0, 150, STAKE), 1.075);
    }

    #[test]
    fn test_half_overlap() {
        // 150s late is half of the 300s decrease window.
        assert_eq!(bounded_adjustment(300, 150, STAKE), 1.0 - 0.15 * 0.5);
        // 75s early is half of the increase window.
        assert_eq!(bounded_adjustment(75, 150, STAKE), 1.0 + 0.5 * 0.075);
    }

    #[test]
    fn test_scale_time_truncates() {
        assert_eq!(scale_time(150, 1.125), 168);
        assert_eq!(scale_time(150, 0.85), 127);
        assert_eq!(scale_time(150, 0.5), 75);
    }

    #[test]
    fn test_clamp_ratio() {
        assert_eq!(clamp_ratio(2.0, 0.5, 1.125), 1.125);
        assert_eq!(clamp_ratio(0.1, 0.5, 1.125), 0.5);
        assert_eq!(clamp_ratio(0.9, 0.5, 1.125), 0.9);
        assert_eq!(clamp_ratio(1.0, 1.2, 1.1), 1.2);
    }

    #[test]
    fn test_clamped_block_ratio() {
        assert_eq!(clamped_block_ratio(150, 75, 0.5, 1.125), 1.125);
        assert_eq!(clamped_block_ratio(150, 600, 0.5, 1.125), 0.5);
        assert_eq!(clamped_block_ratio(150, 600, 0.75, 1.125), 0.75);
        assert_eq!(clamped_block_ratio(150, 160, 0.5, 1.125), 150.0 / 160.0);
    }

    #[test]
    fn test_chain_modulation_bounds() {
        assert_eq!(chain_modulation(1.0e9, 0, 0.5), 1.0);
        assert_eq!(chain_modulation(0.0, 1_000, 0.5), 0.5);
        assert_eq!(chain_modulation(0.0, 1_000, 0.75), 0.75);
        assert_eq!(chain_modulation(300.0, 999, 0.25), 0.3);
        assert_eq!(chain_modulation(600.0, 999, 0.5), 0.6);
        assert_eq!(chain_modulation(5.0, u64::MAX, 0.5), 0.5);
    }
}
