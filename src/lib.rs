//! LDI Engine - deterministic liability-driven investment projection engine
//!
//! This library provides:
//! - Month-by-month liability present-value schedules
//! - Pluggable asset allocation strategies (glide path, equity-only)
//! - Required/surplus bucket projection with automatic surplus peeling
//! - Bisection solvers for lump-sum and monthly contribution targets
//! - Scenario, constants, and assumptions file loading
//! - Batch scenario execution, optionally parallel

pub mod allocator;
pub mod assumptions;
pub mod bucket;
pub mod error;
pub mod liability;
pub mod model;
pub mod runner;
pub mod scenario;
pub mod solver;
pub mod time;

pub use allocator::{AllocationInputs, Allocator, EquityOnly, GlidePath, Horizon};
pub use assumptions::Assumptions;
pub use bucket::{Contributions, RequiredBucket, SurplusBucket};
pub use error::{EngineError, Result};
pub use liability::Liability;
pub use model::{FundedStatus, Model, ModelResult, ScenarioShape};
pub use runner::LdiRunner;
pub use scenario::ScenarioInput;
