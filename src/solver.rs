//! Root-finding for the two "solve for a contribution that exactly funds
//! the plan" questions (§4.6): a lump-sum top-up today, or a level monthly
//! contribution. Both are 1-D bisection searches over a monotone target
//! function, in the same spirit as the teacher's `irr::calculate_irr`
//! Newton-Raphson-with-bisection-fallback — except here bisection is
//! primary, since the target function (run the whole model, read off
//! surplus at maturity) has no cheap derivative.

use crate::allocator::Allocator;
use crate::model::{Model, ScenarioShape};

const MAX_ITER: u32 = 40;
const TOL: f64 = 100.0;

/// Outcome of a bisection search: the best bracket midpoint found, and
/// whether it converged within `TOL` before `MAX_ITER` ran out.
#[derive(Debug, Clone, Copy)]
pub struct SolverOutcome {
    pub value: f64,
    pub converged: bool,
}

/// Bisect `f` over `[lo, hi]` for the input at which it crosses zero.
/// `f` is assumed non-decreasing in its input (more contribution today or
/// per month never reduces surplus at maturity). Non-convergence is not an
/// error (§7) — the caller gets the final midpoint and `converged: false`,
/// and logs a warning.
fn bisect(mut lo: f64, mut hi: f64, f: impl Fn(f64) -> f64) -> SolverOutcome {
    let mut f_lo = f(lo);
    let f_hi = f(hi);

    if f_lo.signum() == f_hi.signum() && f_lo != 0.0 {
        log::warn!(
            "solver bracket [{lo}, {hi}] does not contain a sign change (f_lo={f_lo}, f_hi={f_hi}); returning midpoint"
        );
        return SolverOutcome { value: (lo + hi) / 2.0, converged: false };
    }

    let mut mid = (lo + hi) / 2.0;
    for _ in 0..MAX_ITER {
        mid = (lo + hi) / 2.0;
        let f_mid = f(mid);

        if f_mid.abs() < TOL {
            return SolverOutcome { value: mid, converged: true };
        }

        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    log::warn!("solver did not converge within {MAX_ITER} iterations, bracket [{lo}, {hi}]");
    SolverOutcome { value: mid, converged: false }
}

/// Solve for the lump sum, replacing today's assets entirely (with all
/// scenario contributions stripped), that brings surplus at maturity to
/// exactly zero. The returned `value` is the *adjustment* relative to the
/// scenario's own `assets_today` — negative means the plan is already
/// over-funded by that amount.
///
/// Mirrors `_calculate_current_balance_adjustment`: bisects over a
/// replacement `assets_today` in `[0, upper]`, with contributions zeroed
/// out for the duration of the search, then reports the delta from the
/// original.
pub fn net_contribution_today(
    shape: &ScenarioShape,
    assumptions: &crate::assumptions::Assumptions,
    allocator: &dyn Allocator,
) -> crate::error::Result<SolverOutcome> {
    let baseline = Model::new(shape.clone(), assumptions, allocator)?.run()?;
    let surplus_at_maturity = baseline.surplus_at_maturity;

    let lo = 0.0;
    let hi = if surplus_at_maturity > 0.0 { shape.assets_today } else { -surplus_at_maturity };

    let mut last_err = None;
    let outcome = bisect(lo, hi.max(lo + 1.0), |candidate_assets| {
        let mut trial = shape.clone();
        trial.assets_today = candidate_assets;
        trial.contributions.clear();
        trial.extra_monthly_contribution = 0.0;
        match Model::new(trial, assumptions, allocator).and_then(|m| m.run()) {
            Ok(result) => result.surplus_at_maturity,
            Err(e) => {
                last_err = Some(e);
                0.0
            }
        }
    });

    if let Some(e) = last_err.take() {
        return Err(e);
    }
    Ok(SolverOutcome { value: outcome.value - shape.assets_today, converged: outcome.converged })
}

/// Solve for the level monthly contribution, added on top of the
/// scenario's own contributions, that brings surplus at maturity to
/// exactly zero.
///
/// Mirrors `_calculate_monthly_contribution_adjustment`: brackets around
/// `10 * surplus_at_maturity / horizon_months` (the horizon to the
/// earliest liability's maturity, or the full projection horizon when
/// there are no liabilities) and bisects `extra_monthly_contribution`.
pub fn monthly_contribution(
    shape: &ScenarioShape,
    assumptions: &crate::assumptions::Assumptions,
    allocator: &dyn Allocator,
) -> crate::error::Result<SolverOutcome> {
    let baseline = Model::new(shape.clone(), assumptions, allocator)?.run()?;
    let surplus_at_maturity = baseline.surplus_at_maturity;

    let horizon = nearest_liability_horizon_months(shape).max(1.0);
    let per_month = -surplus_at_maturity / horizon;
    let lo = 10.0 * per_month.min(0.0);
    let hi = 10.0 * per_month.max(0.0);
    // Guarantee a non-degenerate, well-ordered bracket even when
    // `per_month` is exactly zero.
    let (lo, hi) = if (hi - lo).abs() < 1.0 { (lo - 1.0, hi + 1.0) } else { (lo, hi) };

    let mut last_err = None;
    let outcome = bisect(lo, hi, |extra_monthly| {
        let mut trial = shape.clone();
        trial.extra_monthly_contribution = extra_monthly;
        match Model::new(trial, assumptions, allocator).and_then(|m| m.run()) {
            Ok(result) => result.surplus_at_maturity,
            Err(e) => {
                last_err = Some(e);
                0.0
            }
        }
    });

    if let Some(e) = last_err.take() {
        return Err(e);
    }
    Ok(outcome)
}

/// Months from the scenario's first projected cashflow to the first
/// configured liability's own maturity (`start_date + duration_years` when
/// recurring, else `start_date`), or to the scenario's `end_date` when
/// there are no liabilities.
fn nearest_liability_horizon_months(shape: &ScenarioShape) -> f64 {
    let first_cashflow = crate::time::add_months(shape.valuation_date, 1);
    let target = shape
        .liabilities
        .first()
        .map(|l| match l.kind.as_str() {
            "recurring" => crate::time::add_years(l.start_date, l.duration_years.unwrap_or(1) as i32),
            _ => l.start_date,
        })
        .or(shape.end_date)
        .unwrap_or(shape.valuation_date);
    crate::time::months_between(first_cashflow, target).max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::GlidePath;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn assumptions() -> crate::assumptions::Assumptions {
        crate::assumptions::Assumptions::flat(
            0.02,
            0.0475,
            BTreeMap::from([
                ("us_equity_total_market".to_string(), 0.08),
                ("intl_equity_developed".to_string(), 0.07),
                ("us_nominal_treasury_long".to_string(), 0.04),
                ("us_tips_long".to_string(), 0.03),
            ]),
        )
    }

    fn underfunded_shape() -> ScenarioShape {
        ScenarioShape {
            name: "underfunded".to_string(),
            valuation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            assets_today: 1_000.0,
            liabilities: vec![crate::scenario::LiabilityConfig {
                kind: "one_time".to_string(),
                start_date: NaiveDate::from_ymd_opt(2036, 1, 1).unwrap(),
                amount_today: 50_000.0,
                duration_years: None,
                inflation_rate: None,
            }],
            end_date: None,
            contributions: Vec::new(),
            extra_monthly_contribution: 0.0,
        }
    }

    #[test]
    fn net_contribution_today_closes_the_gap() {
        let assumptions = assumptions();
        let shape = underfunded_shape();
        let outcome = net_contribution_today(&shape, &assumptions, &GlidePath).unwrap();
        assert!(outcome.value > 0.0);

        let mut funded = shape.clone();
        funded.assets_today += outcome.value;
        funded.contributions.clear();
        let result =
            crate::model::Model::new(funded, &assumptions, &GlidePath).unwrap().run().unwrap();
        assert!(result.surplus_at_maturity.abs() < 10_000.0);
    }

    #[test]
    fn monthly_contribution_closes_the_gap() {
        let assumptions = assumptions();
        let shape = underfunded_shape();
        let outcome = monthly_contribution(&shape, &assumptions, &GlidePath).unwrap();

        let mut funded = shape.clone();
        funded.extra_monthly_contribution = outcome.value;
        let result =
            crate::model::Model::new(funded, &assumptions, &GlidePath).unwrap().run().unwrap();
        assert!(result.surplus_at_maturity.abs() < 10_000.0);
    }

    #[test]
    fn solver_is_idempotent_across_repeated_runs() {
        let assumptions = assumptions();
        let shape = underfunded_shape();
        let a = net_contribution_today(&shape, &assumptions, &GlidePath).unwrap();
        let b = net_contribution_today(&shape, &assumptions, &GlidePath).unwrap();
        assert_eq!(a.value, b.value);
    }

    #[test]
    fn bisect_finds_root_of_linear_function() {
        let outcome = bisect(-1000.0, 1000.0, |x| x - 42.0);
        assert!(outcome.converged);
        assert!((outcome.value - 42.0).abs() < 1.0);
    }

    #[test]
    fn bisect_reports_nonconvergence_without_sign_change() {
        let outcome = bisect(10.0, 20.0, |x| x); // always positive, no root
        assert!(!outcome.converged);
    }

    #[test]
    fn bisect_is_idempotent_on_repeated_calls() {
        let f = |x: f64| x - 2.0;
        let a = bisect(-50.0, 50.0, f);
        let b = bisect(-50.0, 50.0, f);
        assert!((a.value - b.value).abs() < 1e-9);
    }
}
