//! Model selection: K-fold splitting and grid search over SGD hyper-parameters.
//!
//! [`GridSearchTrainer`] is the default [`Trainer`]: it scores every
//! `alpha × positive_class_weight` pair by cross-validation and refits the
//! best pair on all rows.

use crate::classification::{SgdClassifier, SgdParams};
use crate::config::SearchConfig;
use crate::error::{Result, RobError};
use crate::metrics::BinaryConfusion;
use crate::primitives::SparseMatrix;
use crate::traits::{BinaryClassifier, Trainer};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score maximised by the grid search, always for the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    /// Harmonic mean of precision and recall
    F1,
    /// Sensitivity; favoured for sentence relevance
    Recall,
    /// Positive predictive value
    Precision,
    /// Fraction correct
    Accuracy,
}

impl Scoring {
    /// Scores `y_pred` against `y_true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length.
    pub fn score(self, y_pred: &[bool], y_true: &[bool]) -> Result<f64> {
        let c = BinaryConfusion::from_predictions(y_pred, y_true)?;
        Ok(match self {
            Self::F1 => c.f1(),
            Self::Recall => c.recall(),
            Self::Precision => c.precision(),
            Self::Accuracy => c.accuracy(),
        })
    }
}

/// K-Fold cross-validator.
///
/// Splits data into K consecutive folds. Each fold is used once as test set
/// while the remaining K-1 folds form the training set.
///
/// # Example
///
/// ```rust
/// use robclass::model_selection::KFold;
///
/// let kfold = KFold::new(5);
///
/// for (train_idx, test_idx) in kfold.split(10) {
///     assert_eq!(train_idx.len() + test_idx.len(), 10);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Must be at least 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    /// Shuffle indices with `random_state` before splitting.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generate train/test indices for each fold.
    ///
    /// Returns a vector of (train_indices, test_indices) tuples.
    #[must_use]
    pub fn split(&self, n_samples: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if let Some(seed) = self.random_state {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            indices.shuffle(&mut rng);
        }

        // Distribute remainder across first folds
        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let current_fold_size = if i < remainder { fold_size + 1 } else { fold_size };
            let end = start + current_fold_size;

            let test_indices = indices[start..end].to_vec();
            let mut train_indices = Vec::with_capacity(n_samples - current_fold_size);
            train_indices.extend_from_slice(&indices[..start]);
            train_indices.extend_from_slice(&indices[end..]);

            result.push((train_indices, test_indices));
            start = end;
        }
        result
    }
}

/// Outcome of one grid search.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchResult {
    /// Winning parameters
    pub best_params: SgdParams,
    /// Mean fold score of the winner
    pub best_score: f64,
    /// Every candidate with its mean fold score, in grid order
    pub scores: Vec<(SgdParams, f64)>,
}

/// Cross-validated grid search producing an [`SgdClassifier`].
///
/// Ties keep the earliest candidate in grid order (alphas outer, weights inner).
#[derive(Debug, Clone)]
pub struct GridSearchTrainer {
    config: SearchConfig,
    random_state: u64,
    label: String,
}

impl GridSearchTrainer {
    /// Search over `config`'s grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the grid fails [`SearchConfig::validate`].
    pub fn new(config: SearchConfig, random_state: u64) -> Result<Self> {
        config.validate("search")?;
        Ok(Self {
            config,
            random_state,
            label: "unlabelled".to_string(),
        })
    }

    /// Names the model being trained in errors and logs.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The grid.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn candidates(&self) -> Vec<SgdParams> {
        self.config
            .alphas
            .iter()
            .flat_map(|&alpha| {
                self.config
                    .positive_class_weights
                    .iter()
                    .map(move |&positive_class_weight| SgdParams {
                        alpha,
                        positive_class_weight,
                        max_iter: self.config.max_iter,
                        random_state: self.random_state,
                    })
            })
            .collect()
    }

    fn cross_validate(
        &self,
        params: SgdParams,
        x: &SparseMatrix,
        y: &[bool],
        splits: &[(Vec<usize>, Vec<usize>)],
    ) -> Result<f64> {
        let mut total = 0.0;
        for (train_idx, test_idx) in splits {
            let y_train: Vec<bool> = train_idx.iter().map(|&i| y[i]).collect();
            let y_test: Vec<bool> = test_idx.iter().map(|&i| y[i]).collect();

            let mut model = SgdClassifier::from_params(params);
            model.fit(&x.select_rows(train_idx), &y_train)?;
            let preds = model.predict(&x.select_rows(test_idx))?;
            total += self.config.scoring.score(&preds, &y_test)?;
        }
        Ok(total / splits.len() as f64)
    }

    /// Runs the search and refits the winner on every row.
    ///
    /// With fewer rows than folds, the fold count drops to the row count;
    /// a single row skips cross-validation and fits the first candidate.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InsufficientData`] for empty input,
    /// [`RobError::RowCountMismatch`] if `x` and `y` disagree, or any fitting error.
    pub fn search(&self, x: &SparseMatrix, y: &[bool]) -> Result<(SgdClassifier, GridSearchResult)> {
        if x.n_rows() != y.len() {
            return Err(RobError::rows("grid search labels", x.n_rows(), y.len()));
        }
        if x.n_rows() == 0 {
            return Err(RobError::InsufficientData {
                stage: "grid search".to_string(),
                category: self.label.clone(),
            });
        }

        let candidates = self.candidates();
        let folds = self.config.folds.min(x.n_rows());

        let scores: Vec<(SgdParams, f64)> = if folds < 2 {
            candidates.iter().map(|&p| (p, 0.0)).collect()
        } else {
            let splits = KFold::new(folds).split(x.n_rows());
            candidates
                .par_iter()
                .map(|&p| Ok((p, self.cross_validate(p, x, y, &splits)?)))
                .collect::<Result<_>>()?
        };

        let (best_params, best_score) = scores
            .iter()
            .copied()
            .fold(None, |best: Option<(SgdParams, f64)>, (p, s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((p, s)),
            })
            .ok_or_else(|| RobError::InvalidHyperparameter {
                param: "search".to_string(),
                value: "empty grid".to_string(),
                constraint: "at least one candidate".to_string(),
            })?;

        debug!(
            label = %self.label,
            alpha = best_params.alpha,
            positive_class_weight = best_params.positive_class_weight,
            score = best_score,
            candidates = scores.len(),
            "grid search finished"
        );

        let mut model = SgdClassifier::from_params(best_params);
        model.fit(x, y)?;
        Ok((
            model,
            GridSearchResult {
                best_params,
                best_score,
                scores,
            },
        ))
    }
}

impl Trainer for GridSearchTrainer {
    fn train(&self, x: &SparseMatrix, y: &[bool]) -> Result<Box<dyn BinaryClassifier>> {
        let (model, _) = self.search(x, y)?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
#[path = "tests_kfold_contract.rs"]
mod tests_kfold_contract;
