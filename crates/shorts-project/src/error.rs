//! Project store error types.

use thiserror::Error;

/// Result type for project store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur reading or writing a persisted document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
