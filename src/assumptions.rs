//! Time-keyed market assumptions: inflation, discount rate, and per-asset
//! expected nominal returns.
//!
//! Each field is a scalar default plus an ordered list of date-range
//! overrides, resolved by linear scan (interval counts are small, so no
//! interval tree is warranted).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{EngineError, Result};

/// Converts an annual nominal rate to its equivalent monthly compounding
/// rate: `(1+annual)^(1/12) - 1`.
pub fn annual_to_monthly(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// A scalar default plus ordered `[start, end]` (inclusive) overrides.
#[derive(Debug, Clone)]
pub struct ScheduledField {
    default: f64,
    intervals: Vec<(NaiveDate, NaiveDate, f64)>,
}

impl ScheduledField {
    pub fn constant(default: f64) -> Self {
        Self { default, intervals: Vec::new() }
    }

    pub fn with_schedule(default: f64, intervals: Vec<(NaiveDate, NaiveDate, f64)>) -> Self {
        Self { default, intervals }
    }

    /// First interval (declaration order) whose inclusive range contains
    /// `d`; otherwise the default.
    pub fn value_at(&self, d: NaiveDate) -> f64 {
        for (start, end, value) in &self.intervals {
            if *start <= d && d <= *end {
                return *value;
            }
        }
        self.default
    }
}

/// Container for all projection assumptions: inflation, discount rate, and
/// the fixed set of asset classes the allocator may weight.
#[derive(Debug, Clone)]
pub struct Assumptions {
    inflation: ScheduledField,
    discount_rate: ScheduledField,
    assets: BTreeMap<String, ScheduledField>,
}

impl Assumptions {
    pub fn new(
        inflation: ScheduledField,
        discount_rate: ScheduledField,
        assets: BTreeMap<String, ScheduledField>,
    ) -> Self {
        Self { inflation, discount_rate, assets }
    }

    /// Convenience constructor for flat (no schedule overrides) assumptions,
    /// used by tests and quick scenario defaults.
    pub fn flat(inflation: f64, discount_rate: f64, assets: BTreeMap<String, f64>) -> Self {
        Self {
            inflation: ScheduledField::constant(inflation),
            discount_rate: ScheduledField::constant(discount_rate),
            assets: assets
                .into_iter()
                .map(|(name, rate)| (name, ScheduledField::constant(rate)))
                .collect(),
        }
    }

    pub fn inflation(&self, d: NaiveDate) -> f64 {
        self.inflation.value_at(d)
    }

    pub fn discount_rate(&self, d: NaiveDate) -> f64 {
        self.discount_rate.value_at(d)
    }

    /// Annual nominal return for every known asset class at date `d`.
    pub fn asset_returns(&self, d: NaiveDate) -> BTreeMap<String, f64> {
        self.assets.iter().map(|(name, field)| (name.clone(), field.value_at(d))).collect()
    }

    /// Annual nominal return for a single asset, failing if the name is
    /// not part of this run's fixed asset set.
    pub fn asset_return(&self, d: NaiveDate, asset: &str) -> Result<f64> {
        self.assets
            .get(asset)
            .map(|field| field.value_at(d))
            .ok_or_else(|| EngineError::ConfigInvalid(format!("unknown asset class '{asset}'")))
    }

    pub fn asset_names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Real (inflation-adjusted) monthly discount rate at `d`:
    /// `(1+infl_m)/(1+disc_m) - 1`.
    pub fn real_discount_monthly(&self, d: NaiveDate) -> f64 {
        let infl_m = annual_to_monthly(self.inflation(d));
        let disc_m = annual_to_monthly(self.discount_rate(d));
        (1.0 + infl_m) / (1.0 + disc_m) - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_assumptions_ignore_date() {
        let assumptions = Assumptions::flat(
            0.02,
            0.0475,
            BTreeMap::from([("us_equity_total_market".to_string(), 0.07)]),
        );
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2040, 6, 1).unwrap();
        assert_eq!(assumptions.inflation(d1), assumptions.inflation(d2));
    }

    #[test]
    fn schedule_override_wins_inside_range_only() {
        let field = ScheduledField::with_schedule(
            0.02,
            vec![(
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                0.10,
            )],
        );

        assert_eq!(field.value_at(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()), 0.10);
        assert_eq!(field.value_at(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()), 0.02);
    }

    #[test]
    fn unknown_asset_is_config_invalid() {
        let assumptions = Assumptions::flat(0.02, 0.0475, BTreeMap::new());
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = assumptions.asset_return(d, "nonexistent").unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid(_)));
    }

    #[test]
    fn annual_to_monthly_matches_compounding_identity() {
        let m = annual_to_monthly(0.12682503);
        assert!(((1.0 + m).powi(12) - 1.12682503).abs() < 1e-9);
    }
}
