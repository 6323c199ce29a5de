//! Additive sufficient statistics for a single output column.

/// Running sums for one output column.
///
/// Every field is a plain sum over the observed `(label, prediction)` pairs, so two
/// snapshots over disjoint data combine by field-wise addition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColumnStats {
    count: u64,
    sum_label: f64,
    sum_label_sq: f64,
    sum_pred: f64,
    sum_pred_sq: f64,
    sum_product: f64,
    sum_abs_error: f64,
    sum_sq_error: f64,
}

impl ColumnStats {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one `(label, prediction)` pair into the sums.
    #[inline]
    pub fn update(&mut self, label: f64, pred: f64) {
        let diff = label - pred;
        self.count += 1;
        self.sum_label += label;
        self.sum_label_sq += label * label;
        self.sum_pred += pred;
        self.sum_pred_sq += pred * pred;
        self.sum_product += label * pred;
        self.sum_abs_error += diff.abs();
        self.sum_sq_error += diff * diff;
    }

    /// Add another snapshot of the same logical column.
    pub fn merge(&mut self, other: &ColumnStats) {
        self.count += other.count;
        self.sum_label += other.sum_label;
        self.sum_label_sq += other.sum_label_sq;
        self.sum_pred += other.sum_pred;
        self.sum_pred_sq += other.sum_pred_sq;
        self.sum_product += other.sum_product;
        self.sum_abs_error += other.sum_abs_error;
        self.sum_sq_error += other.sum_sq_error;
    }

    /// Zero every field, including the count.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of included pairs.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of labels.
    pub fn sum_label(&self) -> f64 {
        self.sum_label
    }

    /// Sum of squared labels.
    pub fn sum_label_sq(&self) -> f64 {
        self.sum_label_sq
    }

    /// Sum of predictions.
    pub fn sum_pred(&self) -> f64 {
        self.sum_pred
    }

    /// Sum of squared predictions.
    pub fn sum_pred_sq(&self) -> f64 {
        self.sum_pred_sq
    }

    /// Sum of `label * prediction`.
    pub fn sum_product(&self) -> f64 {
        self.sum_product
    }

    /// Sum of absolute errors.
    pub fn sum_abs_error(&self) -> f64 {
        self.sum_abs_error
    }

    /// Sum of squared errors.
    pub fn sum_sq_error(&self) -> f64 {
        self.sum_sq_error
    }

    /// Compare with a relative tolerance; counts must match exactly.
    pub fn approx_eq(&self, other: &ColumnStats, tolerance: f64) -> bool {
        fn close(a: f64, b: f64, tol: f64) -> bool {
            let scale = 1.0_f64.max(a.abs()).max(b.abs());
            (a - b).abs() <= tol * scale
        }

        self.count == other.count
            && close(self.sum_label, other.sum_label, tolerance)
            && close(self.sum_label_sq, other.sum_label_sq, tolerance)
            && close(self.sum_pred, other.sum_pred, tolerance)
            && close(self.sum_pred_sq, other.sum_pred_sq, tolerance)
            && close(self.sum_product, other.sum_product, tolerance)
            && close(self.sum_abs_error, other.sum_abs_error, tolerance)
            && close(self.sum_sq_error, other.sum_sq_error, tolerance)
    }
}
