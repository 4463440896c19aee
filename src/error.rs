//! Error types for the classification pipeline

use thiserror::Error;

/// Startup failure while building the model pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Every configured model failed to load; the service cannot start.
    #[error("no models loaded ({attempted} configured)")]
    Empty { attempted: usize },
}

/// Request-level classification failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("no model available")]
    NoModelAvailable,

    #[error("all {attempted} models failed")]
    AllModelsFailed { attempted: usize },

    #[error("service is shutting down")]
    ShuttingDown,
}

/// Input rejected before it reaches the ensemble.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("text is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },
}
