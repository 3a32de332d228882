//! Batch scenario execution: run many scenarios against one shared
//! `Assumptions`, optionally in parallel.
//!
//! Grounded in the teacher's `bin/run_block.rs`, which loads one shared
//! `Assumptions` and fans a `par_iter()` out across many policies — here
//! the unit of work is a scenario rather than a policy.

use rayon::prelude::*;

use crate::allocator::Allocator;
use crate::assumptions::Assumptions;
use crate::error::Result;
use crate::model::{Model, ModelResult, ScenarioShape};

/// Runs scenarios against a shared `Assumptions` and `Allocator`. The
/// allocator must be `Sync` to cross the `rayon` fan-out boundary; every
/// `Allocator` in this crate is a stateless unit struct, so this holds
/// trivially.
pub struct LdiRunner<'a> {
    assumptions: &'a Assumptions,
    allocator: &'a (dyn Allocator + Sync),
}

impl<'a> LdiRunner<'a> {
    pub fn new(assumptions: &'a Assumptions, allocator: &'a (dyn Allocator + Sync)) -> Self {
        Self { assumptions, allocator }
    }

    /// Run scenarios sequentially, in declaration order, stopping at the
    /// first error.
    pub fn run_all(&self, shapes: Vec<ScenarioShape>) -> Result<Vec<ModelResult>> {
        shapes
            .into_iter()
            .map(|shape| Model::new(shape, self.assumptions, self.allocator)?.run())
            .collect()
    }

    /// Run scenarios in parallel; a failing scenario does not stop the
    /// others, and all errors are collected.
    pub fn run_all_parallel(&self, shapes: Vec<ScenarioShape>) -> Vec<Result<ModelResult>> {
        shapes
            .into_par_iter()
            .map(|shape| Model::new(shape, self.assumptions, self.allocator)?.run())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::GlidePath;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn assumptions() -> Assumptions {
        Assumptions::flat(
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

    fn shape(name: &str, assets: f64) -> ScenarioShape {
        ScenarioShape {
            name: name.to_string(),
            valuation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            assets_today: assets,
            liabilities: Vec::new(),
            end_date: Some(NaiveDate::from_ymd_opt(2036, 1, 1).unwrap()),
            contributions: Vec::new(),
            extra_monthly_contribution: 0.0,
        }
    }

    #[test]
    fn run_all_preserves_order() {
        let assumptions = assumptions();
        let runner = LdiRunner::new(&assumptions, &GlidePath);
        let shapes = vec![shape("a", 1_000.0), shape("b", 2_000.0)];
        let results = runner.run_all(shapes).unwrap();
        assert_eq!(results[0].name, "a");
        assert_eq!(results[1].name, "b");
    }

    #[test]
    fn run_all_parallel_matches_sequential() {
        let assumptions = assumptions();
        let runner = LdiRunner::new(&assumptions, &GlidePath);
        let shapes: Vec<ScenarioShape> = (0..8).map(|i| shape("s", 1_000.0 * i as f64)).collect();

        let sequential = runner.run_all(shapes.clone()).unwrap();
        let parallel: Vec<_> = runner
            .run_all_parallel(shapes)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        for (s, p) in sequential.iter().zip(parallel.iter()) {
            assert!((s.surplus_at_maturity - p.surplus_at_maturity).abs() < 1e-9);
        }
    }
}
