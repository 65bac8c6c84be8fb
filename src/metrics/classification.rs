//! Binary classification metrics and the per-category results recorder.

use crate::error::{Result, RobError};
use serde::Serialize;
use std::path::Path;

/// Counts of a binary confusion matrix, positive class = `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinaryConfusion {
    /// Predicted true, actually true
    pub true_pos: usize,
    /// Predicted true, actually false
    pub false_pos: usize,
    /// Predicted false, actually true
    pub false_neg: usize,
    /// Predicted false, actually false
    pub true_neg: usize,
}

impl BinaryConfusion {
    /// Tallies `y_pred` against `y_true`.
    ///
    /// # Examples
    ///
    /// ```
    /// use robclass::metrics::classification::BinaryConfusion;
    ///
    /// let c = BinaryConfusion::from_predictions(
    ///     &[true, true, false, false],
    ///     &[true, false, true, false],
    /// )
    /// .expect("same length");
    /// assert_eq!((c.true_pos, c.false_pos, c.false_neg, c.true_neg), (1, 1, 1, 1));
    /// assert!((c.f1() - 0.5).abs() < 1e-12);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RobError::RowCountMismatch`] if the slices differ in length.
    pub fn from_predictions(y_pred: &[bool], y_true: &[bool]) -> Result<Self> {
        if y_pred.len() != y_true.len() {
            return Err(RobError::rows("predictions", y_true.len(), y_pred.len()));
        }
        let mut c = Self::default();
        for (&p, &t) in y_pred.iter().zip(y_true) {
            match (p, t) {
                (true, true) => c.true_pos += 1,
                (true, false) => c.false_pos += 1,
                (false, true) => c.false_neg += 1,
                (false, false) => c.true_neg += 1,
            }
        }
        Ok(c)
    }

    /// Total rows counted.
    #[must_use]
    pub fn n(&self) -> usize {
        self.true_pos + self.false_pos + self.false_neg + self.true_neg
    }

    /// TP / (TP + FP); 0 when nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }

    /// TP / (TP + FN); 0 when there are no positives.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    /// Harmonic mean of precision and recall.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Fraction of rows predicted correctly.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_pos + self.true_neg, self.n())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// One line of a results file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryMetrics {
    /// Category name, or `mean` for the summary line
    pub category: String,
    /// Rows scored
    pub n: usize,
    /// True positives
    pub true_pos: usize,
    /// False positives
    pub false_pos: usize,
    /// False negatives
    pub false_neg: usize,
    /// True negatives
    pub true_neg: usize,
    /// Positive-class precision
    pub precision: f64,
    /// Positive-class recall
    pub recall: f64,
    /// Positive-class F1
    pub f1: f64,
    /// Fraction correct
    pub accuracy: f64,
}

impl BinaryMetrics {
    fn new(category: &str, c: BinaryConfusion) -> Self {
        Self {
            category: category.to_string(),
            n: c.n(),
            true_pos: c.true_pos,
            false_pos: c.false_pos,
            false_neg: c.false_neg,
            true_neg: c.true_neg,
            precision: c.precision(),
            recall: c.recall(),
            f1: c.f1(),
            accuracy: c.accuracy(),
        }
    }
}

/// Collects test-set scores per category and writes them as CSV.
///
/// # Examples
///
/// ```
/// use robclass::metrics::classification::BinaryMetricsRecorder;
///
/// let mut recorder = BinaryMetricsRecorder::new(["Allocation concealment"]);
/// recorder
///     .add_preds_test(&[true, false], &[true, true], "Allocation concealment")
///     .expect("registered category");
/// let mean = recorder.mean().expect("one record");
/// assert!((mean.recall - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BinaryMetricsRecorder {
    categories: Vec<String>,
    records: Vec<BinaryMetrics>,
}

impl BinaryMetricsRecorder {
    /// Recorder accepting scores for `categories` only.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Records one scored test set.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::Corpus`] for an unregistered category and
    /// [`RobError::RowCountMismatch`] if `y_pred` and `y_true` differ in length.
    pub fn add_preds_test(&mut self, y_pred: &[bool], y_true: &[bool], category: &str) -> Result<()> {
        if !self.categories.iter().any(|c| c == category) {
            return Err(RobError::Corpus(format!(
                "category '{category}' is not registered with the recorder"
            )));
        }
        let confusion = BinaryConfusion::from_predictions(y_pred, y_true)?;
        self.records.push(BinaryMetrics::new(category, confusion));
        Ok(())
    }

    /// Records in the order they were added.
    #[must_use]
    pub fn records(&self) -> &[BinaryMetrics] {
        &self.records
    }

    /// Macro average of every record; `None` before the first record.
    ///
    /// Counts are summed, ratios averaged.
    #[must_use]
    pub fn mean(&self) -> Option<BinaryMetrics> {
        if self.records.is_empty() {
            return None;
        }
        let k = self.records.len() as f64;
        let avg = |f: fn(&BinaryMetrics) -> f64| self.records.iter().map(f).sum::<f64>() / k;
        let sum = |f: fn(&BinaryMetrics) -> usize| self.records.iter().map(f).sum::<usize>();
        Some(BinaryMetrics {
            category: "mean".to_string(),
            n: sum(|m| m.n),
            true_pos: sum(|m| m.true_pos),
            false_pos: sum(|m| m.false_pos),
            false_neg: sum(|m| m.false_neg),
            true_neg: sum(|m| m.true_neg),
            precision: avg(|m| m.precision),
            recall: avg(|m| m.recall),
            f1: avg(|m| m.f1),
            accuracy: avg(|m| m.accuracy),
        })
    }

    /// Writes the header, every record, then the `mean` row.
    ///
    /// An empty recorder still writes the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        for record in self.records.iter().cloned().chain(self.mean()) {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Column names of a results table, in [`BinaryMetrics`] field order.
pub const CSV_HEADER: [&str; 10] = [
    "category",
    "n",
    "true_pos",
    "false_pos",
    "false_neg",
    "true_neg",
    "precision",
    "recall",
    "f1",
    "accuracy",
];

/// File name of a results table labelled `label`.
#[must_use]
pub fn results_filename(label: &str) -> String {
    format!("{label}.csv")
}
