//! Per-column accumulation and merging of regression statistics.

use crate::{ColumnStats, EvalError, EvalResult};

/// Owns one [`ColumnStats`] per output column.
///
/// An accumulator starts unbound (zero columns) unless created with
/// [`Accumulator::with_columns`]; once bound its column count never changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    columns: Vec<ColumnStats>,
}

impl Accumulator {
    /// Create an unbound accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator bound to `column_count` columns.
    pub fn with_columns(column_count: usize) -> EvalResult<Self> {
        let mut acc = Self::new();
        acc.bind(column_count)?;
        Ok(acc)
    }

    /// Bind the column count. Rebinding to the same count is a no-op.
    pub fn bind(&mut self, column_count: usize) -> EvalResult<()> {
        if column_count == 0 {
            return Err(EvalError::InvalidArgument(
                "column count must be positive".to_string(),
            ));
        }
        match self.columns.len() {
            0 => {
                self.columns = vec![ColumnStats::default(); column_count];
                Ok(())
            }
            n if n == column_count => Ok(()),
            n => Err(EvalError::InvalidArgument(format!(
                "accumulator already bound to {} column(s), cannot rebind to {}",
                n, column_count
            ))),
        }
    }

    /// Whether a column count has been bound.
    pub fn is_bound(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Number of bound columns (zero while unbound).
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Fold one pair into `column`.
    #[inline]
    pub fn observe(&mut self, column: usize, label: f64, pred: f64) -> EvalResult<()> {
        self.column_mut(column)?.update(label, pred);
        Ok(())
    }

    /// Fold one pair into `column` unless `mask` is zero.
    #[inline]
    pub fn observe_masked(
        &mut self,
        column: usize,
        label: f64,
        pred: f64,
        mask: f64,
    ) -> EvalResult<()> {
        let stats = self.column_mut(column)?;
        if mask != 0.0 {
            stats.update(label, pred);
        }
        Ok(())
    }

    /// Add every column of `other` into the matching column of `self`.
    ///
    /// Fails without touching `self` when the column counts differ.
    pub fn merge_from(&mut self, other: &Accumulator) -> EvalResult<()> {
        if self.columns.len() != other.columns.len() {
            return Err(EvalError::InvalidArgument(format!(
                "cannot merge accumulators over {} and {} column(s)",
                self.columns.len(),
                other.columns.len()
            )));
        }
        for (mine, theirs) in self.columns.iter_mut().zip(&other.columns) {
            mine.merge(theirs);
        }
        Ok(())
    }

    /// Zero every column; the column count is kept.
    pub fn reset(&mut self) {
        self.columns.iter_mut().for_each(ColumnStats::reset);
    }

    /// Statistics for `column`.
    pub fn column(&self, column: usize) -> EvalResult<&ColumnStats> {
        self.columns.get(column).ok_or(EvalError::IndexOutOfRange {
            index: column,
            len: self.columns.len(),
        })
    }

    /// All columns in order.
    pub fn columns(&self) -> &[ColumnStats] {
        &self.columns
    }

    fn column_mut(&mut self, column: usize) -> EvalResult<&mut ColumnStats> {
        let len = self.columns.len();
        self.columns
            .get_mut(column)
            .ok_or(EvalError::IndexOutOfRange { index: column, len })
    }
}
