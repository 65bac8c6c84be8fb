//! Linear classification over hashed sparse features.
//!
//! [`SgdClassifier`] is a linear Support Vector Machine trained by stochastic
//! gradient descent on the hinge loss with an L2 penalty.
//!
//! # Algorithm
//!
//! Minimizes:
//! ```text
//! (α/2)||w||² + (1/n) Σᵢ cᵢ · max(0, 1 - yᵢ(w·xᵢ + b))
//! ```
//!
//! where `cᵢ` is the class weight of sample `i`. The learning rate follows
//! the "optimal" schedule `η_t = 1 / (α (t₀ + t))`. Weights are stored as a
//! sparse map times a global scale, so the L2 shrink of each step costs O(1)
//! regardless of the hash space width.
//!
//! # Example
//!
//! ```
//! use robclass::classification::SgdClassifier;
//! use robclass::primitives::{SparseMatrix, SparseRow};
//! use robclass::traits::BinaryClassifier;
//!
//! let x = SparseMatrix::from_rows(
//!     8,
//!     vec![
//!         SparseRow::from_columns([1]),
//!         SparseRow::from_columns([1, 3]),
//!         SparseRow::from_columns([2]),
//!         SparseRow::from_columns([2, 3]),
//!     ],
//! )
//! .expect("valid rows");
//! let y = [true, true, false, false];
//!
//! let mut svm = SgdClassifier::new().with_max_iter(10);
//! svm.fit(&x, &y).expect("fit");
//! assert_eq!(svm.predict(&x).expect("predict"), y.to_vec());
//! ```

use crate::error::{Result, RobError};
use crate::primitives::SparseMatrix;
use crate::traits::{BinaryClassifier, Trainer};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MIN_SCALE: f64 = 1e-9;

/// Hyper-parameters of one [`SgdClassifier`] fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SgdParams {
    /// L2 regularisation strength (> 0)
    pub alpha: f64,
    /// Loss weight of positive samples; negatives weigh 1
    pub positive_class_weight: f64,
    /// Passes over the training data
    pub max_iter: usize,
    /// Seed of the per-epoch shuffle
    pub random_state: u64,
}

impl Default for SgdParams {
    fn default() -> Self {
        Self {
            alpha: 1e-4,
            positive_class_weight: 1.0,
            max_iter: 5,
            random_state: 42,
        }
    }
}

impl SgdParams {
    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidHyperparameter`] for a non-positive alpha or
    /// weight, or zero epochs.
    pub fn validate(&self) -> Result<()> {
        let invalid = |param: &str, value: String, constraint: &str| {
            Err(RobError::InvalidHyperparameter {
                param: param.to_string(),
                value,
                constraint: constraint.to_string(),
            })
        };
        if !(self.alpha > 0.0 && self.alpha.is_finite()) {
            return invalid("alpha", self.alpha.to_string(), "finite and > 0");
        }
        if !(self.positive_class_weight > 0.0 && self.positive_class_weight.is_finite()) {
            return invalid(
                "positive_class_weight",
                self.positive_class_weight.to_string(),
                "finite and > 0",
            );
        }
        if self.max_iter == 0 {
            return invalid("max_iter", "0".to_string(), ">= 1");
        }
        Ok(())
    }
}

/// Linear SVM trained with SGD over sparse binary rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    params: SgdParams,
    /// Unscaled weights; the effective weight is `weights[j] * scale`
    weights: HashMap<u32, f64>,
    scale: f64,
    bias: f64,
    /// Width seen at fit time; `None` until fitted
    n_features: Option<usize>,
}

impl SgdClassifier {
    /// Creates an unfitted classifier with default parameters.
    ///
    /// # Default Parameters
    ///
    /// - alpha: 1e-4
    /// - `positive_class_weight`: 1.0
    /// - `max_iter`: 5
    /// - `random_state`: 42
    #[must_use]
    pub fn new() -> Self {
        Self::from_params(SgdParams::default())
    }

    /// Creates an unfitted classifier with the given parameters.
    #[must_use]
    pub fn from_params(params: SgdParams) -> Self {
        Self {
            params,
            weights: HashMap::new(),
            scale: 1.0,
            bias: 0.0,
            n_features: None,
        }
    }

    /// Sets the regularisation strength.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.params.alpha = alpha;
        self
    }

    /// Sets the positive-class loss weight.
    #[must_use]
    pub fn with_positive_class_weight(mut self, weight: f64) -> Self {
        self.params.positive_class_weight = weight;
        self
    }

    /// Sets the number of epochs.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.params.max_iter = max_iter;
        self
    }

    /// Sets the shuffle seed.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.params.random_state = random_state;
        self
    }

    /// Current parameters.
    #[must_use]
    pub fn params(&self) -> &SgdParams {
        &self.params
    }

    /// Learned intercept.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.bias
    }

    /// Effective weight of `column` (0 when never updated).
    #[must_use]
    pub fn weight(&self, column: u32) -> f64 {
        self.weights.get(&column).map_or(0.0, |w| w * self.scale)
    }

    fn raw_dot(&self, columns: &[u32]) -> f64 {
        columns
            .iter()
            .filter_map(|c| self.weights.get(c))
            .sum::<f64>()
    }

    /// Folds the scale into the stored weights.
    fn rescale(&mut self) {
        let scale = self.scale;
        self.weights.values_mut().for_each(|w| *w *= scale);
        self.weights.retain(|_, w| *w != 0.0);
        self.scale = 1.0;
    }
}

impl Default for SgdClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryClassifier for SgdClassifier {
    fn fit(&mut self, x: &SparseMatrix, y: &[bool]) -> Result<()> {
        self.params.validate()?;
        if x.n_rows() != y.len() {
            return Err(RobError::rows("classifier labels", x.n_rows(), y.len()));
        }
        if x.n_rows() == 0 {
            return Err(RobError::DimensionMismatch {
                expected: "at least one training row".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        let SgdParams {
            alpha,
            positive_class_weight,
            max_iter,
            random_state,
        } = self.params;

        self.weights.clear();
        self.scale = 1.0;
        self.bias = 0.0;

        // Initial step size heuristic of the "optimal" schedule.
        let typw = (1.0 / alpha.sqrt()).sqrt();
        let optimal_init = 1.0 / (typw * alpha);

        let mut rng = StdRng::seed_from_u64(random_state);
        let mut order: Vec<usize> = (0..x.n_rows()).collect();
        let mut t = 1.0;

        for _ in 0..max_iter {
            order.shuffle(&mut rng);
            for &i in &order {
                let eta = 1.0 / (alpha * (optimal_init + t - 1.0));
                let columns = x.row(i).columns();
                let (sign, class_weight) = if y[i] {
                    (1.0, positive_class_weight)
                } else {
                    (-1.0, 1.0)
                };

                let decision = self.raw_dot(columns) * self.scale + self.bias;
                if sign * decision < 1.0 {
                    let update = eta * sign * class_weight;
                    let step = update / self.scale;
                    for &c in columns {
                        *self.weights.entry(c).or_insert(0.0) += step;
                    }
                    self.bias += update;
                }

                self.scale *= (1.0 - eta * alpha).max(0.0);
                if self.scale < MIN_SCALE {
                    self.rescale();
                }
                t += 1.0;
            }
        }

        self.rescale();
        self.n_features = Some(x.n_cols());
        Ok(())
    }

    fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<f64>> {
        let n_features = self
            .n_features
            .ok_or_else(|| RobError::NotFitted("SgdClassifier".to_string()))?;
        if x.n_cols() != n_features {
            return Err(RobError::DimensionMismatch {
                expected: format!("{n_features} columns"),
                actual: format!("{} columns", x.n_cols()),
            });
        }
        Ok(x
            .rows()
            .iter()
            .map(|r| self.raw_dot(r.columns()) * self.scale + self.bias)
            .collect())
    }
}

/// Trains an [`SgdClassifier`] with fixed parameters, no search.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedTrainer {
    params: SgdParams,
}

impl FixedTrainer {
    /// Trainer always fitting with `params`.
    #[must_use]
    pub fn new(params: SgdParams) -> Self {
        Self { params }
    }
}

impl Trainer for FixedTrainer {
    fn train(&self, x: &SparseMatrix, y: &[bool]) -> Result<Box<dyn BinaryClassifier>> {
        let mut model = SgdClassifier::from_params(self.params);
        model.fit(x, y)?;
        Ok(Box::new(model))
    }
}
