//! Bucket projection: the month-by-month core of the engine.
//!
//! A bucket is a pool of assets projected forward under a pluggable
//! allocation policy. `RequiredBucket` tracks a `Liability` and reports
//! shortfall; `SurplusBucket` has no liability, never peels off surplus,
//! and carries an infinite horizon. Both are built on the same
//! `project_months` loop — composition in place of the teacher's
//! inheritance-free Rust doesn't have, but the same "one shared
//! algorithm, two thin specializations" shape.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::allocator::{AllocationInputs, Allocator, Horizon};
use crate::assumptions::{annual_to_monthly, Assumptions};
use crate::error::{EngineError, Result};
use crate::liability::Liability;
use crate::time::{add_months, month_range, month_start};

/// A contribution schedule feeding into a bucket: either a flat monthly
/// amount or an explicit series keyed by month-start date.
#[derive(Debug, Clone)]
pub enum Contributions {
    Scalar(f64),
    Series(BTreeMap<NaiveDate, f64>),
}

impl Contributions {
    pub fn zero() -> Self {
        Contributions::Scalar(0.0)
    }

    /// Reindex onto `months` (already month-starts), broadcasting a
    /// scalar or looking up each month in a series. Fails with
    /// `ScheduleMismatch` if any requested month has no matching entry.
    fn normalize(&self, months: &[NaiveDate]) -> Result<Vec<f64>> {
        match self {
            Contributions::Scalar(v) => Ok(vec![*v; months.len()]),
            Contributions::Series(map) => months
                .iter()
                .map(|d| {
                    let key = month_start(*d);
                    map.get(&key).copied().ok_or_else(|| {
                        EngineError::ScheduleMismatch(format!(
                            "missing contribution for month {key}"
                        ))
                    })
                })
                .collect(),
        }
    }
}

/// One month's row of a bucket's projection.
#[derive(Debug, Clone)]
pub struct BucketRow {
    pub date: NaiveDate,
    pub horizon: Horizon,
    pub pv_remaining: f64,
    /// Recorded after any surplus peel but before this month's return —
    /// the start-of-month post-rebalance state.
    pub asset_balance: f64,
    pub funding_ratio: Option<f64>,
    pub allocations: BTreeMap<String, f64>,
    pub expected_return: f64,
    pub surplus: f64,
}

/// The projection loop shared by `RequiredBucket` and `SurplusBucket`.
///
/// `frame` is `(date, horizon, pv_remaining)` per month, already aligned
/// with `contributions`.
fn project_months(
    initial_amount: f64,
    frame: &[(NaiveDate, Horizon, f64)],
    assumptions: &Assumptions,
    allocator: &dyn Allocator,
    contributions: &[f64],
    allow_surplus: bool,
) -> Result<Vec<BucketRow>> {
    let mut asset_balance = initial_amount;
    let mut rows = Vec::with_capacity(frame.len());

    for (i, &(date, horizon, pv_remaining)) in frame.iter().enumerate() {
        let funding_ratio = if pv_remaining > 0.0 { Some(asset_balance / pv_remaining) } else { None };

        let allocations = allocator.allocate(AllocationInputs { horizon, funding_ratio })?;

        let infl_m = annual_to_monthly(assumptions.inflation(date));
        let mut expected_return = 0.0;
        for (asset, weight) in &allocations {
            let asset_return = assumptions.asset_return(date, asset)?;
            let real_m = (1.0 + annual_to_monthly(asset_return)) / (1.0 + infl_m) - 1.0;
            expected_return += weight * real_m;
        }
        if !expected_return.is_finite() {
            return Err(EngineError::NumericDomain(format!(
                "non-finite expected return at {date}"
            )));
        }

        let surplus = if allow_surplus && asset_balance > pv_remaining {
            let peeled = asset_balance - pv_remaining;
            asset_balance = pv_remaining;
            peeled
        } else {
            0.0
        };

        rows.push(BucketRow {
            date,
            horizon,
            pv_remaining,
            asset_balance,
            funding_ratio,
            allocations,
            expected_return,
            surplus,
        });

        asset_balance = asset_balance * (1.0 + expected_return) + contributions[i];
        if !asset_balance.is_finite() {
            return Err(EngineError::NumericDomain(format!(
                "non-finite asset balance rolling forward from {date}"
            )));
        }
    }

    Ok(rows)
}

/// A pool of assets earmarked for one specific liability cashflow.
pub struct RequiredBucket<'a> {
    pub name: String,
    liability: &'a Liability,
    pub rows: Vec<BucketRow>,
    pub shortfall: Vec<f64>,
}

impl<'a> RequiredBucket<'a> {
    pub fn new(
        name: String,
        amount: f64,
        liability: &'a Liability,
        assumptions: &Assumptions,
        allocator: &dyn Allocator,
        contributions: &Contributions,
    ) -> Result<Self> {
        let frame: Vec<(NaiveDate, Horizon, f64)> =
            liability.rows().iter().map(|r| (r.date, r.horizon, r.pv_remaining)).collect();
        let months: Vec<NaiveDate> = frame.iter().map(|&(d, _, _)| d).collect();
        let contribs = contributions.normalize(&months)?;

        let rows = project_months(amount, &frame, assumptions, allocator, &contribs, true)?;
        let shortfall = rows.iter().map(|r| (r.pv_remaining - r.asset_balance).max(0.0)).collect();

        Ok(Self { name, liability, rows, shortfall })
    }

    pub fn liability(&self) -> &Liability {
        self.liability
    }

    pub fn shortfall_at_maturity(&self) -> f64 {
        self.shortfall.last().copied().unwrap_or(0.0)
    }

    pub fn asset_balance_at(&self, idx: usize) -> f64 {
        self.rows[idx].asset_balance
    }

    pub fn allocations_at(&self, idx: usize) -> &BTreeMap<String, f64> {
        &self.rows[idx].allocations
    }

    /// Surplus peeled off this bucket each month, keyed by month-start
    /// date, for recycling into the surplus bucket's contribution stream.
    pub fn surplus_series(&self) -> BTreeMap<NaiveDate, f64> {
        self.rows.iter().map(|r| (r.date, r.surplus)).collect()
    }
}

/// The pool holding assets in excess of all liability present values,
/// invested more aggressively with no liability ceiling.
pub struct SurplusBucket {
    pub rows: Vec<BucketRow>,
}

impl SurplusBucket {
    pub fn new(
        amount: f64,
        valuation_date: NaiveDate,
        end_date: NaiveDate,
        assumptions: &Assumptions,
        allocator: &dyn Allocator,
        contributions: &Contributions,
    ) -> Result<Self> {
        let months = month_range(add_months(valuation_date, 1), end_date);
        let frame: Vec<(NaiveDate, Horizon, f64)> =
            months.iter().map(|&d| (d, Horizon::Infinite, 0.0)).collect();
        let contribs = contributions.normalize(&months)?;

        let rows = project_months(amount, &frame, assumptions, allocator, &contribs, false)?;
        Ok(Self { rows })
    }

    pub fn asset_balance_at(&self, idx: usize) -> f64 {
        self.rows[idx].asset_balance
    }

    pub fn allocations_at(&self, idx: usize) -> &BTreeMap<String, f64> {
        &self.rows[idx].allocations
    }

    pub fn asset_balance_at_maturity(&self) -> f64 {
        self.rows.last().map(|r| r.asset_balance).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::GlidePath;
    use std::collections::BTreeMap as Map;

    fn assumptions() -> Assumptions {
        Assumptions::flat(
            0.02,
            0.0475,
            Map::from([
                ("us_equity_total_market".to_string(), 0.08),
                ("intl_equity_developed".to_string(), 0.07),
                ("us_nominal_treasury_long".to_string(), 0.04),
                ("us_tips_long".to_string(), 0.03),
            ]),
        )
    }

    #[test]
    fn required_bucket_never_exceeds_pv_after_peel() {
        let assumptions = assumptions();
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let liability = Liability::new(10_000.0, valuation, maturity, &assumptions, None);

        // Heavily over-funded at the start.
        let bucket = RequiredBucket::new(
            "l1".to_string(),
            50_000.0,
            &liability,
            &assumptions,
            &GlidePath,
            &Contributions::zero(),
        )
        .unwrap();

        for row in &bucket.rows {
            assert!(row.asset_balance <= row.pv_remaining + 1e-9);
        }
    }

    #[test]
    fn required_bucket_shortfall_is_nonneg_gap() {
        let assumptions = assumptions();
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2036, 1, 1).unwrap();
        let liability = Liability::new(10_000.0, valuation, maturity, &assumptions, None);

        let bucket = RequiredBucket::new(
            "l1".to_string(),
            0.0,
            &liability,
            &assumptions,
            &GlidePath,
            &Contributions::zero(),
        )
        .unwrap();

        for (row, &shortfall) in bucket.rows.iter().zip(bucket.shortfall.iter()) {
            assert!((shortfall - (row.pv_remaining - row.asset_balance).max(0.0)).abs() < 1e-9);
            assert!(shortfall >= 0.0);
        }
    }

    #[test]
    fn surplus_bucket_never_peels_and_has_zero_liability() {
        let assumptions = assumptions();
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();

        let bucket = SurplusBucket::new(
            100_000.0,
            valuation,
            end,
            &assumptions,
            &GlidePath,
            &Contributions::zero(),
        )
        .unwrap();

        for row in &bucket.rows {
            assert_eq!(row.surplus, 0.0);
            assert_eq!(row.pv_remaining, 0.0);
            assert_eq!(row.horizon, Horizon::Infinite);
            assert!(row.funding_ratio.is_none());
        }
    }

    #[test]
    fn missing_contribution_month_is_schedule_mismatch() {
        let assumptions = assumptions();
        let valuation = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let maturity = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let liability = Liability::new(1_000.0, valuation, maturity, &assumptions, None);

        let mut series = Map::new();
        series.insert(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), 10.0);
        // 2026-03 and 2026-04 are missing.

        let err = RequiredBucket::new(
            "l1".to_string(),
            0.0,
            &liability,
            &assumptions,
            &GlidePath,
            &Contributions::Series(series),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ScheduleMismatch(_)));
    }
}
