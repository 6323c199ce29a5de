//! Mergeable evaluation of multi-output regression models.
//!
//! **Version**: 0.1.0-alpha.2 | **Status**: Production Ready
//!
//! This crate keeps a small set of additive sums per output column and derives
//! regression metrics from them on demand:
//! - Mean squared / absolute error and root mean squared error
//! - Relative squared error and the coefficient of determination (R²)
//! - Pearson correlation and squared correlation
//!
//! Because every statistic is a plain sum, batches can be fed incrementally,
//! masked per element or per example, split along time axes, or accumulated by
//! independent workers and merged afterwards.
//!
//! ```
//! use scirs2_core::ndarray::array;
//! use tensorlogic_eval::RegressionEvaluator;
//!
//! let labels = array![[1.0, 2.0], [3.0, 4.0], [5.0, 7.0]];
//! let predictions = array![[1.5, 2.0], [2.5, 4.5], [5.0, 6.0]];
//!
//! let mut shard_a = RegressionEvaluator::new();
//! shard_a.eval(&labels.view(), &predictions.view()).unwrap();
//!
//! let mut shard_b = RegressionEvaluator::with_columns(2).unwrap();
//! shard_b.eval(&labels.view(), &predictions.view()).unwrap();
//!
//! shard_a.merge(&shard_b).unwrap();
//! assert_eq!(shard_a.example_count(0).unwrap(), 6);
//! assert!(shard_a.mean_squared_error(1).unwrap() > 0.0);
//! ```

mod accumulator;
mod config;
mod error;
mod evaluator;
pub mod metrics;
mod stats;

#[cfg(feature = "structured-logging")]
pub mod structured_logging;

pub use accumulator::Accumulator;
pub use config::EvaluatorConfig;
pub use error::{EvalError, EvalResult};
pub use evaluator::{ColumnBinding, RegressionEvaluator, COLUMN_AXIS};
pub use metrics::{ColumnReport, RegressionMetric};
pub use stats::ColumnStats;
