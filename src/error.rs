//! Error taxonomy for the LDI projection engine
//!
//! All errors surface at `Model` construction or `Solver` invocation; the
//! projection loop itself is deterministic arithmetic with no retry path.

use thiserror::Error;

/// Errors raised while building or running a projection.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing required field, unknown `type`/`frequency`, unknown asset
    /// name, or a missing assumption key.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A contribution month is absent from a bucket's timeline, or a
    /// one-time contribution falls outside the engine horizon.
    #[error("schedule mismatch: {0}")]
    ScheduleMismatch(String),

    /// A non-finite value appeared in the projection outside the expected
    /// zero-liability funding-ratio case (which returns `None`, not an
    /// error).
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    /// Propagated from scenario/constants/assumptions file loading.
    #[error("file IO error: {0}")]
    FileIo(#[from] std::io::Error),

    /// Propagated from JSON (de)serialization of scenarios, constants, or
    /// assumptions files.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
