//! A single future required cashflow and its monthly present-value
//! schedule.

use chrono::NaiveDate;

use crate::allocator::Horizon;
use crate::assumptions::{annual_to_monthly, Assumptions};
use crate::time::{add_months, month_range, months_between};

/// One month's row of a liability's present-value schedule.
#[derive(Debug, Clone, Copy)]
pub struct LiabilityRow {
    pub date: NaiveDate,
    pub horizon: Horizon,
    pub pv_remaining: f64,
}

/// A future required cashflow (e.g. a tuition payment), modeled as growing
/// with inflation and discounted at the plan's discount rate.
///
/// Immutable once built: `rows` is computed once at construction and
/// exposed by value so a `RequiredBucket` can append its own projection
/// columns without aliasing (or mutating) the liability's own schedule.
#[derive(Debug, Clone)]
pub struct Liability {
    pub amount_today: f64,
    pub valuation_date: NaiveDate,
    pub maturity_date: NaiveDate,
    rows: Vec<LiabilityRow>,
}

impl Liability {
    /// Build a liability's monthly real-discounted present-value schedule.
    ///
    /// `inflation_override`, when set, replaces the assumptions-looked-up
    /// inflation rate for every month of *this* liability's schedule only
    /// (the discount rate and all other liabilities are unaffected) — the
    /// per-liability `inflation_rate` field the external scenario schema
    /// allows.
    pub fn new(
        amount_today: f64,
        valuation_date: NaiveDate,
        maturity_date: NaiveDate,
        assumptions: &Assumptions,
        inflation_override: Option<f64>,
    ) -> Self {
        let dates = month_range(add_months(valuation_date, 1), maturity_date);
        let n = dates.len();

        let real_monthly_at = |d: NaiveDate| -> f64 {
            let infl = inflation_override.unwrap_or_else(|| assumptions.inflation(d));
            let infl_m = annual_to_monthly(infl);
            let disc_m = annual_to_monthly(assumptions.discount_rate(d));
            (1.0 + infl_m) / (1.0 + disc_m) - 1.0
        };

        // Cumulative product of real-discount factors from d+1 through
        // maturity; the maturity row's factor is 1 so pv_remaining there
        // equals amount_today exactly.
        let mut factors = vec![1.0_f64; n];
        for i in (0..n.saturating_sub(1)).rev() {
            let r_next = real_monthly_at(dates[i + 1]);
            factors[i] = factors[i + 1] * (1.0 + r_next);
        }

        let rows = dates
            .iter()
            .zip(factors.iter())
            .map(|(&date, &factor)| {
                let months = months_between(date, maturity_date);
                let horizon = Horizon::Finite(months.max(0) as u32);
                LiabilityRow { date, horizon, pv_remaining: amount_today * factor }
            })
            .collect();

        Self { amount_today, valuation_date, maturity_date, rows }
    }

    pub fn rows(&self) -> &[LiabilityRow] {
        &self.rows
    }

    /// Present value of the liability's remaining obligation as of the
    /// first scheduled row (valuation_date + 1 month).
    pub fn present_value(&self) -> f64 {
        self.rows.first().map(|r| r.pv_remaining).unwrap_or(0.0)
    }

    /// Full horizon, in months, from the first scheduled row to maturity.
    pub fn horizon(&self) -> Horizon {
        self.rows.first().map(|r| r.horizon).unwrap_or(Horizon::Finite(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn flat_assumptions(infl: f64, disc: f64) -> Assumptions {
        Assumptions::flat(infl, disc, BTreeMap::new())
    }

    #[test]
    fn pv_remaining_equals_amount_at_maturity() {
        let assumptions = flat_assumptions(0.02, 0.0475);
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2036, 1, 1).unwrap();
        let liability = Liability::new(10_000.0, valuation, maturity, &assumptions, None);

        let last = liability.rows().last().unwrap();
        assert_eq!(last.date, maturity);
        assert!((last.pv_remaining - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn pv_remaining_monotonic_when_discount_exceeds_inflation() {
        let assumptions = flat_assumptions(0.02, 0.0475);
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2036, 1, 1).unwrap();
        let liability = Liability::new(10_000.0, valuation, maturity, &assumptions, None);

        let rows = liability.rows();
        for window in rows.windows(2) {
            assert!(window[1].pv_remaining >= window[0].pv_remaining - 1e-9);
        }
    }

    #[test]
    fn pv_remaining_flat_when_discount_equals_inflation() {
        let assumptions = flat_assumptions(0.03, 0.03);
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let liability = Liability::new(5_000.0, valuation, maturity, &assumptions, None);

        for row in liability.rows() {
            assert!((row.pv_remaining - 5_000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn horizon_counts_down_to_zero_at_maturity() {
        let assumptions = flat_assumptions(0.02, 0.0475);
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let liability = Liability::new(1_000.0, valuation, maturity, &assumptions, None);

        assert_eq!(liability.horizon(), Horizon::Finite(6));
        assert_eq!(liability.rows().last().unwrap().horizon, Horizon::Finite(0));
    }

    #[test]
    fn inflation_override_changes_only_this_liability() {
        let assumptions = flat_assumptions(0.02, 0.0475);
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2036, 1, 1).unwrap();

        let base = Liability::new(10_000.0, valuation, maturity, &assumptions, None);
        let overridden = Liability::new(10_000.0, valuation, maturity, &assumptions, Some(0.10));

        assert!(overridden.present_value() > base.present_value());
    }
}
