//! Allocation strategies: pure functions mapping a bucket's current horizon
//! and funding ratio to a weight distribution over named asset classes.
//!
//! Kept as a trait object rather than an enum so new strategies (a custom
//! tactical overlay, say) plug in without touching `Model` or `Bucket` —
//! the same interchangeable-strategy shape the teacher uses for
//! `CreditingApproach`, except here the strategy is a capability trait
//! instead of a closed set of crediting formulas.

mod equity_only;
mod glide_path;

use std::collections::BTreeMap;

pub use equity_only::EquityOnly;
pub use glide_path::GlidePath;

use crate::error::Result;

/// A bucket's horizon to its terminal cashflow, in months. Required
/// buckets carry a finite horizon; the surplus bucket is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizon {
    Finite(u32),
    Infinite,
}

impl Horizon {
    pub fn months_f64(&self) -> f64 {
        match self {
            Horizon::Finite(m) => *m as f64,
            Horizon::Infinite => f64::INFINITY,
        }
    }
}

/// Inputs an allocator sees at a single projection month: how far out the
/// liability is, and how well funded the bucket currently is.
#[derive(Debug, Clone, Copy)]
pub struct AllocationInputs {
    pub horizon: Horizon,
    pub funding_ratio: Option<f64>,
}

/// An allocation strategy: a pure function from `AllocationInputs` to a
/// weight distribution. Weights are non-negative and sum to 1 within
/// `1e-9`. Implementations must not hold state that changes between calls —
/// the engine is deterministic by construction (§5).
pub trait Allocator: std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn allocate(&self, inputs: AllocationInputs) -> Result<BTreeMap<String, f64>>;
}

/// Clamp `n` into `[min_n, max_n]`.
pub(crate) fn clamp(n: f64, min_n: f64, max_n: f64) -> f64 {
    n.max(min_n).min(max_n)
}

/// Assert that a weight map is a valid allocation: every weight
/// non-negative, weights sum to 1 within `1e-9`. Used by tests across the
/// allocator and bucket modules to check the "allocation sum" invariant.
#[cfg(test)]
pub(crate) fn assert_valid_allocation(weights: &BTreeMap<String, f64>) {
    let sum: f64 = weights.values().sum();
    assert!((sum - 1.0).abs() < 1e-9, "weights must sum to 1, got {sum}");
    for (asset, w) in weights {
        assert!(*w >= 0.0, "weight for {asset} must be non-negative, got {w}");
    }
}
