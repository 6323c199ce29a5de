//! Batch ingestion, merging and metric access for multi-output regression.
//!
//! A [`RegressionEvaluator`] accepts label/prediction arrays of rank two or more.
//! Axis 1 is always the column (output) axis; every other axis, such as the
//! example axis or a trailing time axis, indexes independent example instances.
//! Feeding one batch at once or in slices along any non-column axis folds the
//! same terms into the same per-column sums.

use crate::metrics::{ColumnReport, RegressionMetric};
use crate::{Accumulator, ColumnStats, EvalError, EvalResult, EvaluatorConfig};
use scirs2_core::ndarray::{ArrayView, ArrayViewD, Axis, Dimension};

/// Axis holding the output columns.
pub const COLUMN_AXIS: usize = 1;

/// Column binding of an evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ColumnBinding {
    /// Column count is taken from the first batch.
    #[default]
    Unbound,
    /// Column count is fixed.
    Bound {
        /// Number of output columns.
        columns: usize,
        /// Optional column names, one per column.
        names: Option<Vec<String>>,
    },
}

impl ColumnBinding {
    /// Bound column count, if any.
    pub fn columns(&self) -> Option<usize> {
        match self {
            ColumnBinding::Unbound => None,
            ColumnBinding::Bound { columns, .. } => Some(*columns),
        }
    }

    /// Column names, if the binding carries any.
    pub fn names(&self) -> Option<&[String]> {
        match self {
            ColumnBinding::Bound {
                names: Some(names), ..
            } => Some(names),
            _ => None,
        }
    }
}

/// Mask layout accepted by [`RegressionEvaluator::eval_masked`].
enum BatchMask<'a> {
    /// Same shape as the labels.
    PerElement(ArrayViewD<'a, f64>),
    /// Labels' shape without the column axis; applies to every column.
    PerExample(ArrayViewD<'a, f64>),
}

/// Mergeable evaluator for multi-output regression.
#[derive(Debug, Clone)]
pub struct RegressionEvaluator {
    binding: ColumnBinding,
    accumulator: Accumulator,
    tolerance: f64,
}

impl Default for RegressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for RegressionEvaluator {
    /// Exact comparison of the binding and every accumulated sum.
    fn eq(&self, other: &Self) -> bool {
        self.binding == other.binding && self.accumulator == other.accumulator
    }
}

impl RegressionEvaluator {
    /// Create an evaluator that binds its column count on the first batch.
    pub fn new() -> Self {
        Self {
            binding: ColumnBinding::Unbound,
            accumulator: Accumulator::new(),
            tolerance: EvaluatorConfig::default().tolerance,
        }
    }

    /// Create an evaluator over exactly `columns` output columns.
    pub fn with_columns(columns: usize) -> EvalResult<Self> {
        Ok(Self {
            binding: ColumnBinding::Bound {
                columns,
                names: None,
            },
            accumulator: Accumulator::with_columns(columns)?,
            tolerance: EvaluatorConfig::default().tolerance,
        })
    }

    /// Create an evaluator with one named column per entry of `names`.
    pub fn with_column_names<I, S>(names: I) -> EvalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let columns = names.len();
        Ok(Self {
            accumulator: Accumulator::with_columns(columns)?,
            binding: ColumnBinding::Bound {
                columns,
                names: Some(names),
            },
            tolerance: EvaluatorConfig::default().tolerance,
        })
    }

    /// Build an evaluator from a validated configuration.
    pub fn from_config(config: &EvaluatorConfig) -> EvalResult<Self> {
        config.validate()?;
        let mut evaluator = match (&config.column_names, config.columns) {
            (Some(names), _) => Self::with_column_names(names.iter().cloned())?,
            (None, Some(columns)) => Self::with_columns(columns)?,
            (None, None) => Self::new(),
        };
        evaluator.tolerance = config.tolerance;
        Ok(evaluator)
    }

    /// Current column binding.
    pub fn binding(&self) -> &ColumnBinding {
        &self.binding
    }

    /// Whether the column count is known.
    pub fn is_bound(&self) -> bool {
        matches!(self.binding, ColumnBinding::Bound { .. })
    }

    /// Number of bound columns (zero while unbound).
    pub fn num_columns(&self) -> usize {
        self.binding.columns().unwrap_or(0)
    }

    /// Tolerance used by [`approx_eq`](Self::approx_eq).
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Name of `column`; unnamed columns are reported as `col_<index>`.
    pub fn column_name(&self, column: usize) -> EvalResult<String> {
        self.accumulator.column(column)?;
        match self.binding.names() {
            Some(names) => Ok(names[column].clone()),
            None => Ok(format!("col_{}", column)),
        }
    }

    /// Accumulated statistics for `column`.
    pub fn column_stats(&self, column: usize) -> EvalResult<&ColumnStats> {
        self.accumulator.column(column)
    }

    /// Number of included examples for `column`.
    pub fn example_count(&self, column: usize) -> EvalResult<u64> {
        Ok(self.accumulator.column(column)?.count())
    }

    /// Fold a batch of labels and predictions into the statistics.
    ///
    /// Both arrays must share one shape of rank two or more, with the columns on
    /// axis 1. Nothing is accumulated if the batch is rejected.
    pub fn eval<D: Dimension>(
        &mut self,
        labels: &ArrayView<'_, f64, D>,
        predictions: &ArrayView<'_, f64, D>,
    ) -> EvalResult<()> {
        self.ingest(
            labels.view().into_dyn(),
            predictions.view().into_dyn(),
            None,
        )
    }

    /// Like [`eval`](Self::eval), skipping every position whose mask value is zero.
    ///
    /// The mask either has the labels' shape (per-element masking) or the labels'
    /// shape without the column axis, or with a column axis of length one
    /// (per-example masking, applied to every column).
    pub fn eval_masked<D: Dimension, E: Dimension>(
        &mut self,
        labels: &ArrayView<'_, f64, D>,
        predictions: &ArrayView<'_, f64, D>,
        mask: &ArrayView<'_, f64, E>,
    ) -> EvalResult<()> {
        self.ingest(
            labels.view().into_dyn(),
            predictions.view().into_dyn(),
            Some(mask.view().into_dyn()),
        )
    }

    fn ingest(
        &mut self,
        labels: ArrayViewD<'_, f64>,
        predictions: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> EvalResult<()> {
        let (columns, mask) = match self.validate_batch(&labels, &predictions, mask) {
            Ok(checked) => checked,
            Err(err) => {
                log::warn!("Rejected regression batch: {}", err);
                return Err(err);
            }
        };

        if !self.is_bound() {
            self.accumulator.bind(columns)?;
            self.binding = ColumnBinding::Bound {
                columns,
                names: None,
            };
            log::debug!("Bound regression evaluator to {} column(s)", columns);
        }

        for column in 0..columns {
            let l = labels.index_axis(Axis(COLUMN_AXIS), column);
            let p = predictions.index_axis(Axis(COLUMN_AXIS), column);
            match &mask {
                None => {
                    for (&label, &pred) in l.iter().zip(p.iter()) {
                        self.accumulator.observe(column, label, pred)?;
                    }
                }
                Some(BatchMask::PerElement(m)) => {
                    let m = m.index_axis(Axis(COLUMN_AXIS), column);
                    for ((&label, &pred), &keep) in l.iter().zip(p.iter()).zip(m.iter()) {
                        self.accumulator.observe_masked(column, label, pred, keep)?;
                    }
                }
                Some(BatchMask::PerExample(m)) => {
                    for ((&label, &pred), &keep) in l.iter().zip(p.iter()).zip(m.iter()) {
                        self.accumulator.observe_masked(column, label, pred, keep)?;
                    }
                }
            }
        }

        log::trace!(
            "Evaluated regression batch of shape {:?}{}",
            labels.shape(),
            if mask.is_some() { " (masked)" } else { "" }
        );
        Ok(())
    }

    /// Check shapes and the column binding without touching any state.
    fn validate_batch<'a>(
        &self,
        labels: &ArrayViewD<'_, f64>,
        predictions: &ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'a, f64>>,
    ) -> EvalResult<(usize, Option<BatchMask<'a>>)> {
        if labels.ndim() <= COLUMN_AXIS {
            return Err(EvalError::InvalidArgument(format!(
                "labels must have rank 2 or more ([examples, columns, ...]), got shape {:?}",
                labels.shape()
            )));
        }
        if labels.shape() != predictions.shape() {
            return Err(EvalError::shape_mismatch(
                "predictions",
                labels.shape(),
                predictions.shape(),
            ));
        }

        let columns = labels.len_of(Axis(COLUMN_AXIS));
        match self.binding.columns() {
            Some(bound) if bound != columns => {
                return Err(EvalError::InvalidArgument(format!(
                    "evaluator is bound to {} column(s) but the batch has {}",
                    bound, columns
                )));
            }
            None if columns == 0 => {
                return Err(EvalError::InvalidArgument(
                    "cannot bind an evaluator to zero columns".to_string(),
                ));
            }
            _ => {}
        }

        let mask = match mask {
            None => None,
            Some(m) if m.shape() == labels.shape() => Some(BatchMask::PerElement(m)),
            Some(m) => Some(BatchMask::PerExample(per_example_mask(m, labels.shape())?)),
        };
        Ok((columns, mask))
    }

    /// Add the statistics of `other` to `self`. `other` is left untouched.
    ///
    /// Fails, mutating nothing, when both evaluators are bound to different column
    /// counts or both carry column names that differ. An unbound `other`
    /// contributes nothing; an unbound `self` adopts the binding and statistics of
    /// `other`. Unnamed columns take the names of `other` when it has some.
    pub fn merge(&mut self, other: &RegressionEvaluator) -> EvalResult<()> {
        if !other.is_bound() {
            return Ok(());
        }
        if !self.is_bound() {
            self.binding = other.binding.clone();
            self.accumulator = other.accumulator.clone();
        } else {
            if let (Some(mine), Some(theirs)) = (self.binding.names(), other.binding.names()) {
                if mine != theirs {
                    return Err(EvalError::InvalidArgument(format!(
                        "cannot merge evaluators with column names {:?} and {:?}",
                        mine, theirs
                    )));
                }
            }
            self.accumulator.merge_from(&other.accumulator)?;
            if self.binding.names().is_none() && other.binding.names().is_some() {
                self.binding = other.binding.clone();
            }
        }
        log::debug!(
            "Merged regression evaluator over {} column(s)",
            self.num_columns()
        );
        Ok(())
    }

    /// Merge every evaluator of `evaluators` into a fresh one.
    pub fn merge_all<'a, I>(evaluators: I) -> EvalResult<RegressionEvaluator>
    where
        I: IntoIterator<Item = &'a RegressionEvaluator>,
    {
        let mut merged = RegressionEvaluator::new();
        for evaluator in evaluators {
            merged.merge(evaluator)?;
        }
        Ok(merged)
    }

    /// Clear every statistic; the column binding is kept.
    pub fn reset(&mut self) {
        self.accumulator.reset();
    }

    /// Compare with `other` using this evaluator's tolerance.
    pub fn approx_eq(&self, other: &RegressionEvaluator) -> bool {
        self.approx_eq_with(other, self.tolerance)
    }

    /// Compare bindings exactly and every sum within a relative `tolerance`.
    pub fn approx_eq_with(&self, other: &RegressionEvaluator, tolerance: f64) -> bool {
        self.binding == other.binding
            && self
                .accumulator
                .columns()
                .iter()
                .zip(other.accumulator.columns())
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }

    /// Derive `metric` for `column`.
    pub fn metric(&self, metric: RegressionMetric, column: usize) -> EvalResult<f64> {
        metric.compute(self.accumulator.column(column)?, column)
    }

    /// Mean squared error of `column`.
    pub fn mean_squared_error(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::Mse, column)
    }

    /// Mean absolute error of `column`.
    pub fn mean_absolute_error(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::Mae, column)
    }

    /// Root mean squared error of `column`.
    pub fn root_mean_squared_error(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::Rmse, column)
    }

    /// Relative squared error of `column`.
    pub fn relative_squared_error(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::Rse, column)
    }

    /// Coefficient of determination (R²) of `column`.
    pub fn r_squared(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::RSquared, column)
    }

    /// Pearson correlation of `column`.
    pub fn pearson_correlation(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::Pearson, column)
    }

    /// Squared Pearson correlation of `column`.
    pub fn correlation_r2(&self, column: usize) -> EvalResult<f64> {
        self.metric(RegressionMetric::CorrelationR2, column)
    }

    /// Arithmetic mean of `metric` over all columns.
    pub fn score_for_metric(&self, metric: RegressionMetric) -> EvalResult<f64> {
        let columns = self.num_columns();
        if columns == 0 {
            return Err(EvalError::InvalidArgument(format!(
                "cannot average {} over an unbound evaluator",
                metric
            )));
        }
        let mut total = 0.0;
        for column in 0..columns {
            total += self.metric(metric, column)?;
        }
        Ok(total / columns as f64)
    }

    /// Column-averaged mean squared error.
    pub fn average_mean_squared_error(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::Mse)
    }

    /// Column-averaged mean absolute error.
    pub fn average_mean_absolute_error(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::Mae)
    }

    /// Column-averaged root mean squared error.
    pub fn average_root_mean_squared_error(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::Rmse)
    }

    /// Column-averaged relative squared error.
    pub fn average_relative_squared_error(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::Rse)
    }

    /// Column-averaged coefficient of determination (R²).
    pub fn average_r_squared(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::RSquared)
    }

    /// Column-averaged Pearson correlation.
    pub fn average_pearson_correlation(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::Pearson)
    }

    /// Column-averaged squared Pearson correlation.
    pub fn average_correlation_r2(&self) -> EvalResult<f64> {
        self.score_for_metric(RegressionMetric::CorrelationR2)
    }

    /// Snapshot of every metric for `column`.
    pub fn column_report(&self, column: usize) -> EvalResult<ColumnReport> {
        let stats = self.accumulator.column(column)?;
        Ok(ColumnReport::from_stats(
            column,
            self.column_name(column)?,
            stats,
        ))
    }

    /// Snapshots for all bound columns, in order.
    pub fn reports(&self) -> EvalResult<Vec<ColumnReport>> {
        (0..self.num_columns())
            .map(|column| self.column_report(column))
            .collect()
    }
}

/// Reshape a per-example mask so it iterates in the same order as one column.
fn per_example_mask<'a>(
    mask: ArrayViewD<'a, f64>,
    labels_shape: &[usize],
) -> EvalResult<ArrayViewD<'a, f64>> {
    let mut without_columns = labels_shape.to_vec();
    without_columns.remove(COLUMN_AXIS);

    if mask.shape() == without_columns.as_slice() {
        return Ok(mask);
    }

    let mut single_column = labels_shape.to_vec();
    single_column[COLUMN_AXIS] = 1;
    if mask.shape() == single_column.as_slice() {
        return Ok(mask.index_axis_move(Axis(COLUMN_AXIS), 0));
    }

    Err(EvalError::InvalidArgument(format!(
        "mask shape {:?} matches neither labels {:?}, per-example {:?} nor {:?}",
        mask.shape(),
        labels_shape,
        without_columns,
        single_column
    )))
}
