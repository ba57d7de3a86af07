//! Error types for the gait engine

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid sensor payload: {}", errors.join("; "))]
    ValidationFailed { errors: Vec<String> },

    #[error("Baseline reference data unavailable: {0}")]
    BaselineUnavailable(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
