//! Orchestration: turns a scenario's liabilities and contributions into a
//! set of `RequiredBucket`s plus one `SurplusBucket`, runs them, and
//! reports the aggregate result.
//!
//! Mirrors the teacher's `ProjectionEngine::project_policy` in shape — one
//! call that expands configuration into per-unit projections and folds
//! them into a single result — generalized from "one policy" to "one
//! liability per required bucket."

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::allocator::Allocator;
use crate::assumptions::Assumptions;
use crate::bucket::{Contributions, RequiredBucket, SurplusBucket};
use crate::error::{EngineError, Result};
use crate::liability::Liability;
use crate::scenario::{ContributionConfig, LiabilityConfig, ScenarioInput};
use crate::time::{add_years, month_range, month_start};

/// A scenario after validation, ready to feed a `Model`. Distinct from
/// `ScenarioInput` so the solver can cheaply clone and perturb
/// `assets_today` / `extra_monthly_contribution` without re-parsing JSON.
#[derive(Debug, Clone)]
pub struct ScenarioShape {
    pub name: String,
    pub valuation_date: NaiveDate,
    pub assets_today: f64,
    pub liabilities: Vec<LiabilityConfig>,
    pub end_date: Option<NaiveDate>,
    pub contributions: Vec<ContributionConfig>,
    pub extra_monthly_contribution: f64,
}

impl ModelResult {
    /// Fold a solved lump-sum and monthly contribution into the external
    /// result payload (§6).
    pub fn into_scenario_result(
        self,
        net_contribution_today: f64,
        monthly_contribution: f64,
    ) -> crate::scenario::ScenarioResult {
        crate::scenario::ScenarioResult {
            name: self.name,
            assets_today: self.assets_today,
            surplus_at_maturity: self.surplus_at_maturity,
            allocations: self.current_allocations,
            net_contribution_today,
            monthly_contribution,
        }
    }
}

impl From<ScenarioInput> for ScenarioShape {
    fn from(input: ScenarioInput) -> Self {
        Self {
            name: input.name,
            valuation_date: input.valuation_date,
            assets_today: input.assets_today,
            liabilities: input.liabilities,
            end_date: input.end_date,
            contributions: input.contributions,
            extra_monthly_contribution: 0.0,
        }
    }
}

/// Whether the plan's required buckets are expected to fully cover their
/// liabilities at maturity under the given assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundedStatus {
    Funded,
    Underfunded,
}

/// The result of running a `Model`: the headline numbers from §6's result
/// payload.
#[derive(Debug, Clone)]
pub struct ModelResult {
    pub name: String,
    pub assets_today: f64,
    pub surplus_at_maturity: f64,
    pub funded_status: FundedStatus,
    pub current_allocations: BTreeMap<String, f64>,
    pub shortfalls_at_maturity: Vec<(String, f64)>,
}

struct ExpandedLiability {
    name: String,
    liability: Liability,
}

/// One fully-built projection: a set of required buckets plus a surplus
/// bucket, ready to run.
pub struct Model<'a> {
    shape: ScenarioShape,
    assumptions: &'a Assumptions,
    allocator: &'a dyn Allocator,
    end_date: NaiveDate,
    expanded: Vec<ExpandedLiability>,
    total_contribution_series: BTreeMap<NaiveDate, f64>,
}

impl<'a> Model<'a> {
    /// Validate and expand a scenario shape: resolve liability configs into
    /// individual `Liability` instances, resolve `end_date`, and build the
    /// combined contribution series. Fails fast with `ConfigInvalid` or
    /// `ScheduleMismatch` before any projection runs.
    pub fn new(
        shape: ScenarioShape,
        assumptions: &'a Assumptions,
        allocator: &'a dyn Allocator,
    ) -> Result<Self> {
        let expanded = expand_liabilities(&shape, assumptions)?;
        let end_date = resolve_end_date(&shape, &expanded)?;
        let months = month_range(crate::time::add_months(shape.valuation_date, 1), end_date);
        let total_contribution_series =
            build_contribution_series(&shape, &months)?;

        Ok(Self { shape, assumptions, allocator, end_date, expanded, total_contribution_series })
    }

    /// Run every required bucket, fold their surplus peels and any
    /// uncommitted starting capital into the surplus bucket, and summarize.
    pub fn run(&self) -> Result<ModelResult> {
        let pv_shares: Vec<f64> = self.expanded.iter().map(|e| e.liability.present_value()).collect();
        let pv_total: f64 = pv_shares.iter().sum();
        let n_buckets = self.expanded.len().max(1) as f64;
        let (initial_capitals, initial_surplus_capital) =
            split_initial_capital(self.shape.assets_today, pv_total, &pv_shares);

        let mut required_buckets = Vec::with_capacity(self.expanded.len());

        for (exp, &initial_capital) in self.expanded.iter().zip(&initial_capitals) {
            let months: Vec<NaiveDate> = exp.liability.rows().iter().map(|r| r.date).collect();
            let per_bucket = equal_split_series(&self.total_contribution_series, &months, n_buckets);

            let bucket = RequiredBucket::new(
                exp.name.clone(),
                initial_capital,
                &exp.liability,
                self.assumptions,
                self.allocator,
                &Contributions::Series(per_bucket),
            )?;
            required_buckets.push(bucket);
        }

        let mut surplus_series: BTreeMap<NaiveDate, f64> = month_range(
            crate::time::add_months(self.shape.valuation_date, 1),
            self.end_date,
        )
        .into_iter()
        .map(|d| (d, 0.0))
        .collect();

        for bucket in &required_buckets {
            for (date, amount) in bucket.surplus_series() {
                *surplus_series.entry(date).or_insert(0.0) += amount;
            }
        }

        let surplus_bucket = SurplusBucket::new(
            initial_surplus_capital,
            self.shape.valuation_date,
            self.end_date,
            self.assumptions,
            self.allocator,
            &Contributions::Series(surplus_series),
        )?;

        let surplus_at_maturity = surplus_bucket.asset_balance_at_maturity();
        let shortfalls_at_maturity: Vec<(String, f64)> = required_buckets
            .iter()
            .map(|b| (b.name.clone(), b.shortfall_at_maturity()))
            .collect();
        let funded_status = if shortfalls_at_maturity.iter().all(|(_, s)| *s <= 1e-6) {
            FundedStatus::Funded
        } else {
            FundedStatus::Underfunded
        };

        let current_allocations =
            current_allocation_snapshot(&required_buckets, &surplus_bucket, self.shape.assets_today);

        Ok(ModelResult {
            name: self.shape.name.clone(),
            assets_today: self.shape.assets_today,
            surplus_at_maturity,
            funded_status,
            current_allocations,
            shortfalls_at_maturity,
        })
    }
}

/// Turn each `LiabilityConfig` into one or more `Liability` instances.
/// `"recurring"` with `duration_years = N` produces one liability per year,
/// landing on `start_date + k` years for `k in 0..N`; `"one_time"` produces
/// exactly one. Any other `kind` is a configuration error.
fn expand_liabilities(shape: &ScenarioShape, assumptions: &Assumptions) -> Result<Vec<ExpandedLiability>> {
    let mut out = Vec::new();
    for (idx, cfg) in shape.liabilities.iter().enumerate() {
        match cfg.kind.as_str() {
            "one_time" => {
                let liability = Liability::new(
                    cfg.amount_today,
                    shape.valuation_date,
                    cfg.start_date,
                    assumptions,
                    cfg.inflation_rate,
                );
                out.push(ExpandedLiability { name: format!("liability[{idx}]"), liability });
            }
            "recurring" => {
                let years = cfg.duration_years.ok_or_else(|| {
                    EngineError::ConfigInvalid(format!(
                        "liability[{idx}] is 'recurring' but has no duration_years"
                    ))
                })?;
                for k in 0..years {
                    let maturity = add_years(cfg.start_date, k as i32);
                    let liability = Liability::new(
                        cfg.amount_today,
                        shape.valuation_date,
                        maturity,
                        assumptions,
                        cfg.inflation_rate,
                    );
                    out.push(ExpandedLiability { name: format!("liability[{idx}].{k}"), liability });
                }
            }
            other => {
                return Err(EngineError::ConfigInvalid(format!(
                    "liability[{idx}] has unknown type '{other}'"
                )))
            }
        }
    }
    Ok(out)
}

/// `end_date` is the scenario's explicit value if given, else the latest
/// liability maturity. A scenario with neither is a configuration error —
/// there is nothing to project toward.
fn resolve_end_date(shape: &ScenarioShape, expanded: &[ExpandedLiability]) -> Result<NaiveDate> {
    if let Some(end) = shape.end_date {
        return Ok(month_start(end));
    }
    expanded
        .iter()
        .map(|e| e.liability.maturity_date)
        .max()
        .map(month_start)
        .ok_or_else(|| {
            EngineError::ConfigInvalid(
                "scenario has no liabilities and no explicit end_date".to_string(),
            )
        })
}

/// Build the month-keyed total contribution series from every
/// `ContributionConfig`, plus any solver-injected `extra_monthly_contribution`.
fn build_contribution_series(
    shape: &ScenarioShape,
    months: &[NaiveDate],
) -> Result<BTreeMap<NaiveDate, f64>> {
    let mut series: BTreeMap<NaiveDate, f64> = months.iter().map(|&d| (d, 0.0)).collect();

    for (idx, cfg) in shape.contributions.iter().enumerate() {
        match cfg.kind.as_str() {
            "recurring" => {
                let frequency = cfg.frequency.as_deref().ok_or_else(|| {
                    EngineError::ConfigInvalid(format!(
                        "contribution[{idx}] is 'recurring' but has no frequency"
                    ))
                })?;
                let start = cfg.start_date.map(month_start);
                let end = cfg.end_date.map(month_start);
                match frequency {
                    "monthly" => {
                        for &d in months {
                            if in_window(d, start, end) {
                                *series.entry(d).or_insert(0.0) += cfg.amount;
                            }
                        }
                    }
                    "annual" => {
                        let target_month = cfg.month.ok_or_else(|| {
                            EngineError::ConfigInvalid(format!(
                                "contribution[{idx}] is annual but has no 'month'"
                            ))
                        })?;
                        for &d in months {
                            if in_window(d, start, end) && chrono::Datelike::month(&d) == target_month {
                                *series.entry(d).or_insert(0.0) += cfg.amount;
                            }
                        }
                    }
                    other => {
                        return Err(EngineError::ConfigInvalid(format!(
                            "contribution[{idx}] has unknown frequency '{other}'"
                        )))
                    }
                }
            }
            "one_time" => {
                let date = cfg.date.map(month_start).ok_or_else(|| {
                    EngineError::ConfigInvalid(format!(
                        "contribution[{idx}] is 'one_time' but has no date"
                    ))
                })?;
                let entry = series.get_mut(&date).ok_or_else(|| {
                    EngineError::ScheduleMismatch(format!(
                        "contribution[{idx}] date {date} is outside the projection horizon"
                    ))
                })?;
                *entry += cfg.amount;
            }
            other => {
                return Err(EngineError::ConfigInvalid(format!(
                    "contribution[{idx}] has unknown type '{other}'"
                )))
            }
        }
    }

    if shape.extra_monthly_contribution != 0.0 {
        // Solver-injected contributions only run up to one month before the
        // first configured liability's own start date, mirroring the
        // original adjustment search (it never funds past the point the
        // liability itself starts drawing down).
        let window_end = shape
            .liabilities
            .first()
            .map(|l| month_start(crate::time::add_months(l.start_date, -1)));
        for &d in months {
            if window_end.map_or(true, |end| d <= end) {
                *series.entry(d).or_insert(0.0) += shape.extra_monthly_contribution;
            }
        }
    }

    Ok(series)
}

fn in_window(d: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e)
}

/// Split `assets_today` into each required bucket's opening balance plus
/// whatever is left for the surplus bucket. The required buckets can never
/// claim more than the combined liability present value between them —
/// `required_capital = min(assets_today, pv_total)` — so an over-funded
/// plan leaves its excess (`assets_today - pv_total`) to the surplus
/// bucket instead of stranding it unaccounted for in a required bucket
/// that has no use for it.
fn split_initial_capital(assets_today: f64, pv_total: f64, pv_shares: &[f64]) -> (Vec<f64>, f64) {
    let required_capital = assets_today.min(pv_total);
    let n_buckets = pv_shares.len().max(1) as f64;

    let per_bucket: Vec<f64> = pv_shares
        .iter()
        .map(|&pv| {
            let share = if pv_total > 0.0 { pv / pv_total } else { 1.0 / n_buckets };
            required_capital * share
        })
        .collect();

    let committed: f64 = per_bucket.iter().sum();
    (per_bucket, assets_today - committed)
}

/// Re-key the total series onto `months` (a single bucket's own liability
/// horizon) and divide equally across `n_buckets`. Months present in the
/// total series but absent from `months` (i.e. after this bucket's
/// liability has matured) are simply not included.
fn equal_split_series(
    total: &BTreeMap<NaiveDate, f64>,
    months: &[NaiveDate],
    n_buckets: f64,
) -> BTreeMap<NaiveDate, f64> {
    months
        .iter()
        .map(|&d| (d, total.get(&d).copied().unwrap_or(0.0) / n_buckets))
        .collect()
}

/// The allocation snapshot an investor would see today: required-bucket
/// and surplus-bucket weights blended by their current asset balance. When
/// there is no capital anywhere yet (a zero-asset plan), fall back to
/// weighting required buckets by liability present value instead; the
/// surplus bucket has no liability to weight by, so it contributes 0 in
/// that fallback.
fn current_allocation_snapshot(
    required: &[RequiredBucket<'_>],
    surplus: &SurplusBucket,
    current_balance: f64,
) -> BTreeMap<String, f64> {
    let mut weighted: BTreeMap<String, f64> = BTreeMap::new();
    let mut total_weight = 0.0;

    let mut add = |allocations: &BTreeMap<String, f64>, weight: f64| {
        for (asset, w) in allocations {
            *weighted.entry(asset.clone()).or_insert(0.0) += w * weight;
        }
        total_weight += weight;
    };

    if current_balance.abs() > 1e-9 {
        for bucket in required {
            if let Some(row) = bucket.rows.first() {
                add(&row.allocations, row.asset_balance.max(0.0));
            }
        }
        if let Some(row) = surplus.rows.first() {
            add(&row.allocations, row.asset_balance.max(0.0));
        }
    }

    if total_weight <= 1e-9 {
        weighted.clear();
        total_weight = 0.0;
        for bucket in required {
            if let Some(row) = bucket.rows.first() {
                add(&row.allocations, bucket.liability().present_value().max(0.0));
            }
        }
    }

    if total_weight > 1e-9 {
        for w in weighted.values_mut() {
            *w /= total_weight;
        }
    }
    weighted
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

    fn base_shape() -> ScenarioShape {
        ScenarioShape {
            name: "test".to_string(),
            valuation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            assets_today: 0.0,
            liabilities: Vec::new(),
            end_date: Some(NaiveDate::from_ymd_opt(2036, 1, 1).unwrap()),
            contributions: Vec::new(),
            extra_monthly_contribution: 0.0,
        }
    }

    #[test]
    fn zero_liability_scenario_just_grows_assets_in_surplus() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.assets_today = 10_000.0;

        let model = Model::new(shape, &assumptions, &GlidePath).unwrap();
        let result = model.run().unwrap();
        assert_eq!(result.funded_status, FundedStatus::Funded);
        assert!(result.surplus_at_maturity > 10_000.0);
    }

    #[test]
    fn fully_funded_single_liability_has_zero_shortfall() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.liabilities.push(LiabilityConfig {
            kind: "one_time".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 1, 1).unwrap(),
            amount_today: 10_000.0,
            duration_years: None,
            inflation_rate: None,
        });
        shape.assets_today = 10_000.0;

        let model = Model::new(shape, &assumptions, &GlidePath).unwrap();
        let result = model.run().unwrap();
        assert_eq!(result.shortfalls_at_maturity.len(), 1);
        assert!(result.shortfalls_at_maturity[0].1 < 1e-6);
    }

    #[test]
    fn underfunded_scenario_reports_nonzero_shortfall() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.liabilities.push(LiabilityConfig {
            kind: "one_time".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 1, 1).unwrap(),
            amount_today: 100_000.0,
            duration_years: None,
            inflation_rate: None,
        });
        shape.assets_today = 1_000.0;

        let model = Model::new(shape, &assumptions, &GlidePath).unwrap();
        let result = model.run().unwrap();
        assert_eq!(result.funded_status, FundedStatus::Underfunded);
        assert!(result.shortfalls_at_maturity[0].1 > 0.0);
    }

    #[test]
    fn recurring_liability_expands_one_per_year() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.liabilities.push(LiabilityConfig {
            kind: "recurring".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 8, 1).unwrap(),
            amount_today: 10_000.0,
            duration_years: Some(4),
            inflation_rate: None,
        });
        shape.end_date = None;
        shape.assets_today = 20_000.0;

        let model = Model::new(shape, &assumptions, &GlidePath).unwrap();
        let result = model.run().unwrap();
        assert_eq!(result.shortfalls_at_maturity.len(), 4);
    }

    #[test]
    fn unknown_liability_type_is_config_invalid() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.liabilities.push(LiabilityConfig {
            kind: "bogus".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 1, 1).unwrap(),
            amount_today: 1.0,
            duration_years: None,
            inflation_rate: None,
        });

        let err = Model::new(shape, &assumptions, &GlidePath).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid(_)));
    }

    #[test]
    fn one_time_contribution_outside_horizon_is_schedule_mismatch() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.contributions.push(ContributionConfig {
            kind: "one_time".to_string(),
            amount: 500.0,
            frequency: None,
            month: None,
            start_date: None,
            end_date: None,
            date: Some(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()),
        });

        let err = Model::new(shape, &assumptions, &GlidePath).unwrap_err();
        assert!(matches!(err, EngineError::ScheduleMismatch(_)));
    }

    #[test]
    fn split_initial_capital_caps_required_share_at_combined_pv() {
        let (per_bucket, surplus) = split_initial_capital(10_000.0, 4_000.0, &[3_000.0, 1_000.0]);
        assert!((per_bucket[0] - 3_000.0).abs() < 1e-9);
        assert!((per_bucket[1] - 1_000.0).abs() < 1e-9);
        assert!((surplus - 6_000.0).abs() < 1e-9);
    }

    #[test]
    fn split_initial_capital_never_overcommits_when_underfunded() {
        let (per_bucket, surplus) = split_initial_capital(1_000.0, 4_000.0, &[3_000.0, 1_000.0]);
        assert!((per_bucket[0] - 750.0).abs() < 1e-9);
        assert!((per_bucket[1] - 250.0).abs() < 1e-9);
        assert!(surplus.abs() < 1e-9);
    }

    #[test]
    fn overfunded_scenario_conserves_capital_at_month_zero() {
        let assumptions = assumptions();
        let mut shape = base_shape();
        shape.liabilities.push(LiabilityConfig {
            kind: "one_time".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 1, 1).unwrap(),
            amount_today: 10_000.0,
            duration_years: None,
            inflation_rate: None,
        });
        shape.assets_today = 50_000.0;

        let model = Model::new(shape, &assumptions, &GlidePath).unwrap();
        let result = model.run().unwrap();

        // The liability's own present value is well under assets_today, so
        // the surplus bucket must absorb the rest rather than stranding it
        // in the required bucket.
        assert!(result.surplus_at_maturity > 40_000.0);
        assert!(result.shortfalls_at_maturity[0].1 < 1e-6);
    }
}
