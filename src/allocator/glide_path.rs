//! The canonical glide-path allocator: hedging rises both as maturity
//! nears and as the plan becomes more funded.

use std::collections::BTreeMap;

use super::{clamp, AllocationInputs, Allocator};
use crate::error::Result;

/// Funding-ratio and time-to-maturity aware glide path.
///
/// `hedge = 0.4 * funding_hedge + 0.6 * time_hedge`, where `funding_hedge`
/// ramps in over funding ratios `[0.7, 1.0]` and `time_hedge` ramps in
/// over a 15-year (180 month) horizon. Over-funded plans lock in gains;
/// under-funded plans take more equity risk.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlidePath;

const FUNDING_HEDGE_WEIGHT: f64 = 0.4;
const TIME_HEDGE_WEIGHT: f64 = 0.6;
const FUNDING_RATIO_FLOOR: f64 = 0.7;
const GLIDE_HORIZON_MONTHS: f64 = 180.0;

impl Allocator for GlidePath {
    fn name(&self) -> &'static str {
        "glide_path"
    }

    fn allocate(&self, inputs: AllocationInputs) -> Result<BTreeMap<String, f64>> {
        let funding_hedge = match inputs.funding_ratio {
            Some(ratio) => clamp((ratio - FUNDING_RATIO_FLOOR) / (1.0 - FUNDING_RATIO_FLOOR), 0.0, 1.0),
            None => 0.0,
        };
        let time_hedge = clamp(1.0 - inputs.horizon.months_f64() / GLIDE_HORIZON_MONTHS, 0.0, 1.0);

        let hedge = FUNDING_HEDGE_WEIGHT * funding_hedge + TIME_HEDGE_WEIGHT * time_hedge;

        Ok(BTreeMap::from([
            ("us_equity_total_market".to_string(), 0.7 * (1.0 - hedge)),
            ("intl_equity_developed".to_string(), 0.3 * (1.0 - hedge)),
            ("us_nominal_treasury_long".to_string(), 0.8 * hedge),
            ("us_tips_long".to_string(), 0.2 * hedge),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{assert_valid_allocation, Horizon};

    #[test]
    fn max_equity_when_unfunded_and_far_out() {
        let weights = GlidePath
            .allocate(AllocationInputs { horizon: Horizon::Finite(360), funding_ratio: None })
            .unwrap();
        assert_valid_allocation(&weights);
        assert!((weights["us_equity_total_market"] - 0.7).abs() < 1e-9);
        assert!((weights["us_nominal_treasury_long"]).abs() < 1e-9);
    }

    #[test]
    fn near_zero_equity_at_maturity_fully_funded() {
        let weights = GlidePath
            .allocate(AllocationInputs { horizon: Horizon::Finite(0), funding_ratio: Some(1.5) })
            .unwrap();
        assert_valid_allocation(&weights);
        assert!(weights["us_equity_total_market"] < 1e-9);
        assert!(weights["intl_equity_developed"] < 1e-9);
    }

    #[test]
    fn infinite_horizon_contributes_zero_time_hedge() {
        let weights = GlidePath
            .allocate(AllocationInputs { horizon: Horizon::Infinite, funding_ratio: None })
            .unwrap();
        assert_valid_allocation(&weights);
        assert!((weights["us_equity_total_market"] - 0.7).abs() < 1e-9);
    }

    #[test]
    fn weights_sum_to_one_across_the_glide() {
        for months in [0u32, 30, 90, 180, 360] {
            for ratio in [None, Some(0.0), Some(0.7), Some(1.0), Some(2.0)] {
                let weights = GlidePath
                    .allocate(AllocationInputs { horizon: Horizon::Finite(months), funding_ratio: ratio })
                    .unwrap();
                assert_valid_allocation(&weights);
            }
        }
    }
}
