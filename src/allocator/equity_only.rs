//! A maximum-equity strategy: always 70/30 US/international equity,
//! regardless of horizon or funding ratio. Kept as a second `Allocator`
//! implementation to exercise the strategy-polymorphism seam the glide
//! path alone wouldn't demonstrate.

use std::collections::BTreeMap;

use super::{AllocationInputs, Allocator};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct EquityOnly;

impl Allocator for EquityOnly {
    fn name(&self) -> &'static str {
        "equity_only"
    }

    fn allocate(&self, _inputs: AllocationInputs) -> Result<BTreeMap<String, f64>> {
        Ok(BTreeMap::from([
            ("us_equity_total_market".to_string(), 0.7),
            ("intl_equity_developed".to_string(), 0.3),
            ("us_nominal_treasury_long".to_string(), 0.0),
            ("us_tips_long".to_string(), 0.0),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{assert_valid_allocation, Horizon};

    #[test]
    fn ignores_inputs() {
        let far = EquityOnly
            .allocate(AllocationInputs { horizon: Horizon::Finite(360), funding_ratio: None })
            .unwrap();
        let near = EquityOnly
            .allocate(AllocationInputs { horizon: Horizon::Finite(0), funding_ratio: Some(3.0) })
            .unwrap();
        assert_valid_allocation(&far);
        assert_valid_allocation(&near);
        assert_eq!(far, near);
    }
}
