//! Evaluator configuration.

use crate::{EvalError, EvalResult};
use serde::{Deserialize, Serialize};

/// Configuration for building a [`RegressionEvaluator`](crate::RegressionEvaluator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Fixed column count; `None` binds lazily on the first batch.
    pub columns: Option<usize>,
    /// Optional column names; binds the column count to their number.
    pub column_names: Option<Vec<String>>,
    /// Relative tolerance used by approximate equality.
    pub tolerance: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            columns: None,
            column_names: None,
            tolerance: 1e-9,
        }
    }
}

impl EvaluatorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the column count.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Name the columns.
    pub fn with_column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Set the approximate-equality tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check the configuration for contradictions.
    pub fn validate(&self) -> EvalResult<()> {
        if self.columns == Some(0) {
            return Err(EvalError::ConfigError(
                "columns must be positive".to_string(),
            ));
        }
        if let Some(names) = &self.column_names {
            if names.is_empty() {
                return Err(EvalError::ConfigError(
                    "column_names must not be empty".to_string(),
                ));
            }
            if let Some(columns) = self.columns {
                if columns != names.len() {
                    return Err(EvalError::ConfigError(format!(
                        "columns is {} but {} column name(s) were given",
                        columns,
                        names.len()
                    )));
                }
            }
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EvalError::ConfigError(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
