//! Core traits for the pluggable classifier capability.
//!
//! The feature engine only relies on `fit`/`predict` over sparse binary
//! matrices; how a model learns, and how its hyper-parameters are chosen,
//! stays behind these traits.

use crate::error::Result;
use crate::primitives::SparseMatrix;

/// Binary classifier over hashed feature rows.
pub trait BinaryClassifier: Send + Sync {
    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` and `y` disagree on rows or fitting fails.
    fn fit(&mut self, x: &SparseMatrix, y: &[bool]) -> Result<()>;

    /// Signed confidence per row; positive means the positive class.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is not fitted or `x` has the wrong width.
    fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<f64>>;

    /// Predicts one label per row.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::decision_function`].
    fn predict(&self, x: &SparseMatrix) -> Result<Vec<bool>> {
        Ok(self
            .decision_function(x)?
            .into_iter()
            .map(|d| d > 0.0)
            .collect())
    }
}

/// Produces a trained classifier from labelled rows.
///
/// Implementations own their hyper-parameter search.
pub trait Trainer: Send + Sync {
    /// Trains a model on `x`/`y`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RobError::InsufficientData`] for empty input,
    /// or any error raised while fitting.
    fn train(&self, x: &SparseMatrix, y: &[bool]) -> Result<Box<dyn BinaryClassifier>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::SparseRow;

    // Predicts positive when the row contains column 0.
    struct ColumnZero;

    impl BinaryClassifier for ColumnZero {
        fn fit(&mut self, _x: &SparseMatrix, _y: &[bool]) -> Result<()> {
            Ok(())
        }

        fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<f64>> {
            Ok(x
                .rows()
                .iter()
                .map(|r| if r.contains(0) { 1.0 } else { -1.0 })
                .collect())
        }
    }

    #[test]
    fn test_default_predict_thresholds_at_zero() {
        let x = SparseMatrix::from_rows(
            4,
            vec![SparseRow::from_columns([0]), SparseRow::from_columns([1])],
        )
        .expect("valid");
        let preds = ColumnZero.predict(&x).expect("predict");
        assert_eq!(preds, vec![true, false]);
    }
}
