//! Error types for the scoring core and the surrounding I/O pipeline.

use thiserror::Error;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, DetectError>;

/// Errors raised by the normalizer, forest and labeler.
///
/// All of them are raised synchronously at the offending call; nothing is
/// retried and no partial results are returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    /// Empty or malformed matrix, or out-of-range configuration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Record width does not match the fit-time schema.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// Configured feature names absent from the source columns.
    #[error("missing features in dataset: {missing:?}")]
    Schema { missing: Vec<String> },
}

impl DetectError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors from dataset ingestion and report export.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot parse {value:?} in column {column:?} at row {row} as a number")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Detect(#[from] DetectError),
}
