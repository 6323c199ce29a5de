//! Error types for evaluation operations.

use thiserror::Error;

/// Errors that can occur while accumulating or deriving regression statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Shape disagreement, column-count conflict or another rejected argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Column index outside the bound column range.
    #[error("Column index {index} out of range for {len} column(s)")]
    IndexOutOfRange {
        /// Requested column.
        index: usize,
        /// Number of bound columns.
        len: usize,
    },

    /// Metric is undefined for the statistics observed so far.
    #[error("{metric} is not computable for column {column}: {reason}")]
    NotComputable {
        /// Metric name.
        metric: &'static str,
        /// Column the metric was requested for.
        column: usize,
        /// Why the derivation is degenerate.
        reason: &'static str,
    },

    /// Error in configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// Shape mismatch between two named buffers.
    pub(crate) fn shape_mismatch(what: &str, expected: &[usize], actual: &[usize]) -> Self {
        EvalError::InvalidArgument(format!(
            "Shape mismatch for {}: expected {:?}, got {:?}",
            what, expected, actual
        ))
    }
}

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
