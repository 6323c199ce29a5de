//! Derivation of regression metrics from accumulated column statistics.
//!
//! All functions here are pure: they read a [`ColumnStats`] snapshot and never
//! mutate it. Degenerate inputs (no observations, zero variance) are reported as
//! [`EvalError::NotComputable`] instead of producing `NaN` or infinities.

use crate::{ColumnStats, EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regression metrics that can be derived per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegressionMetric {
    /// Mean squared error.
    Mse,
    /// Mean absolute error.
    Mae,
    /// Root mean squared error.
    Rmse,
    /// Relative squared error.
    Rse,
    /// Coefficient of determination, `1 - RSE`.
    RSquared,
    /// Pearson product-moment correlation.
    Pearson,
    /// Squared Pearson correlation.
    CorrelationR2,
}

impl RegressionMetric {
    /// Every metric, in reporting order.
    pub const ALL: [RegressionMetric; 7] = [
        RegressionMetric::Mse,
        RegressionMetric::Mae,
        RegressionMetric::Rmse,
        RegressionMetric::Rse,
        RegressionMetric::RSquared,
        RegressionMetric::Pearson,
        RegressionMetric::CorrelationR2,
    ];

    /// Get metric name.
    pub fn name(&self) -> &'static str {
        match self {
            RegressionMetric::Mse => "mean_squared_error",
            RegressionMetric::Mae => "mean_absolute_error",
            RegressionMetric::Rmse => "root_mean_squared_error",
            RegressionMetric::Rse => "relative_squared_error",
            RegressionMetric::RSquared => "r_squared",
            RegressionMetric::Pearson => "pearson_correlation",
            RegressionMetric::CorrelationR2 => "correlation_r2",
        }
    }

    /// True when lower values are better.
    pub fn minimize(&self) -> bool {
        matches!(
            self,
            RegressionMetric::Mse
                | RegressionMetric::Mae
                | RegressionMetric::Rmse
                | RegressionMetric::Rse
        )
    }

    /// Derive this metric for `column` from its statistics.
    pub fn compute(&self, stats: &ColumnStats, column: usize) -> EvalResult<f64> {
        match self {
            RegressionMetric::Mse => mean_squared_error(stats, column),
            RegressionMetric::Mae => mean_absolute_error(stats, column),
            RegressionMetric::Rmse => root_mean_squared_error(stats, column),
            RegressionMetric::Rse => relative_squared_error(stats, column),
            RegressionMetric::RSquared => r_squared(stats, column),
            RegressionMetric::Pearson => pearson_correlation(stats, column),
            RegressionMetric::CorrelationR2 => correlation_r2(stats, column),
        }
    }
}

impl fmt::Display for RegressionMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn observed(stats: &ColumnStats, metric: &'static str, column: usize) -> EvalResult<f64> {
    if stats.count() == 0 {
        return Err(EvalError::NotComputable {
            metric,
            column,
            reason: "no examples observed",
        });
    }
    Ok(stats.count() as f64)
}

/// `sum_sq_error / n`.
pub fn mean_squared_error(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let n = observed(stats, "mean_squared_error", column)?;
    Ok(stats.sum_sq_error() / n)
}

/// `sum_abs_error / n`.
pub fn mean_absolute_error(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let n = observed(stats, "mean_absolute_error", column)?;
    Ok(stats.sum_abs_error() / n)
}

/// Square root of the mean squared error.
pub fn root_mean_squared_error(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let n = observed(stats, "root_mean_squared_error", column)?;
    Ok((stats.sum_sq_error() / n).sqrt())
}

/// Squared error relative to the total sum of squares of the labels.
///
/// `SST = sum_label_sq - sum_label^2 / n`, computed from the running sums.
pub fn relative_squared_error(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    rse_for("relative_squared_error", stats, column)
}

/// Coefficient of determination, `1 - RSE`.
pub fn r_squared(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    Ok(1.0 - rse_for("r_squared", stats, column)?)
}

fn rse_for(metric: &'static str, stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let n = observed(stats, metric, column)?;
    let sst = stats.sum_label_sq() - stats.sum_label() * stats.sum_label() / n;
    if is_zero_spread(sst, stats.sum_label_sq(), n) {
        return Err(EvalError::NotComputable {
            metric,
            column,
            reason: "labels have zero variance",
        });
    }
    Ok(stats.sum_sq_error() / sst)
}

/// Whether a spread computed as a difference of running sums is rounding noise.
///
/// `scale` is the larger operand of that difference; summing `n` terms leaves a
/// relative error of a few `n * EPSILON`, so anything below that floor counts
/// as zero.
fn is_zero_spread(spread: f64, scale: f64, n: f64) -> bool {
    spread <= SPREAD_ROUNDING_FACTOR * n * f64::EPSILON * scale.abs()
}

const SPREAD_ROUNDING_FACTOR: f64 = 8.0;

/// Pearson correlation between labels and predictions.
pub fn pearson_correlation(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    pearson_for("pearson_correlation", stats, column)
}

/// Squared Pearson correlation.
pub fn correlation_r2(stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let r = pearson_for("correlation_r2", stats, column)?;
    Ok(r * r)
}

fn pearson_for(metric: &'static str, stats: &ColumnStats, column: usize) -> EvalResult<f64> {
    let n = observed(stats, metric, column)?;
    let label_var = n * stats.sum_label_sq() - stats.sum_label() * stats.sum_label();
    let pred_var = n * stats.sum_pred_sq() - stats.sum_pred() * stats.sum_pred();
    if is_zero_spread(label_var, n * stats.sum_label_sq(), n)
        || is_zero_spread(pred_var, n * stats.sum_pred_sq(), n)
    {
        return Err(EvalError::NotComputable {
            metric,
            column,
            reason: "labels or predictions have zero variance",
        });
    }
    let cov = n * stats.sum_product() - stats.sum_label() * stats.sum_pred();
    Ok(cov / (label_var * pred_var).sqrt())
}

/// Snapshot of every metric for one column, for external report formatters.
///
/// Metrics that are not computable for the column are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReport {
    /// Column index.
    pub column: usize,
    /// Column name.
    pub name: String,
    /// Number of included examples.
    pub count: u64,
    /// Mean squared error.
    pub mean_squared_error: Option<f64>,
    /// Mean absolute error.
    pub mean_absolute_error: Option<f64>,
    /// Root mean squared error.
    pub root_mean_squared_error: Option<f64>,
    /// Relative squared error.
    pub relative_squared_error: Option<f64>,
    /// Coefficient of determination.
    pub r_squared: Option<f64>,
    /// Pearson correlation.
    pub pearson_correlation: Option<f64>,
    /// Squared Pearson correlation.
    pub correlation_r2: Option<f64>,
}

impl ColumnReport {
    /// Derive all metrics for a column.
    pub fn from_stats(column: usize, name: impl Into<String>, stats: &ColumnStats) -> Self {
        Self {
            column,
            name: name.into(),
            count: stats.count(),
            mean_squared_error: mean_squared_error(stats, column).ok(),
            mean_absolute_error: mean_absolute_error(stats, column).ok(),
            root_mean_squared_error: root_mean_squared_error(stats, column).ok(),
            relative_squared_error: relative_squared_error(stats, column).ok(),
            r_squared: r_squared(stats, column).ok(),
            pearson_correlation: pearson_correlation(stats, column).ok(),
            correlation_r2: correlation_r2(stats, column).ok(),
        }
    }

    /// Look up a metric value by kind.
    pub fn get(&self, metric: RegressionMetric) -> Option<f64> {
        match metric {
            RegressionMetric::Mse => self.mean_squared_error,
            RegressionMetric::Mae => self.mean_absolute_error,
            RegressionMetric::Rmse => self.root_mean_squared_error,
            RegressionMetric::Rse => self.relative_squared_error,
            RegressionMetric::RSquared => self.r_squared,
            RegressionMetric::Pearson => self.pearson_correlation,
            RegressionMetric::CorrelationR2 => self.correlation_r2,
        }
    }
}
