//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::validation::ValidationErrors;

/// Errors returned by the scheduling pipeline.
///
/// Solver outcomes (infeasible, timed out, ...) are not errors: they are
/// reported through the response status.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for the scheduling pipeline.
pub type Result<T> = std::result::Result<T, ScheduleError>;
