//! Explicit, immutable run configuration.
//!
//! Every component receives its sizing and thresholds at construction.
//! [`ExperimentConfig`] bundles them for a whole experiment run and can be
//! read from a JSON file; any field left out takes its default.

use crate::error::{Result, RobError};
use crate::model_selection::Scoring;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The six core risk-of-bias domains.
pub const CORE_CATEGORIES: [&str; 6] = [
    "Random sequence generation",
    "Allocation concealment",
    "Blinding of participants and personnel",
    "Blinding of outcome assessment",
    "Incomplete outcome data",
    "Selective reporting",
];

const MIN_FEATURES_LOG2: u32 = 4;
const MAX_FEATURES_LOG2: u32 = 31;

/// `num` values evenly spaced on a log10 scale from `10^start` to `10^stop`.
///
/// # Examples
///
/// ```
/// use robclass::config::logspace;
///
/// let grid = logspace(-2.0, 2.0, 5);
/// assert_eq!(grid.len(), 5);
/// assert!((grid[0] - 0.01).abs() < 1e-12);
/// assert!((grid[2] - 1.0).abs() < 1e-12);
/// assert!((grid[4] - 100.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn logspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

/// Shape of a hashed feature space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Number of hashed columns; a power of two.
    pub n_features: usize,
    /// Inclusive n-gram length range `(min_n, max_n)`.
    pub ngram_range: (usize, usize),
    /// Lowercase text before tokenizing.
    pub lowercase: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            n_features: 1 << 20,
            ngram_range: (1, 2),
            lowercase: true,
        }
    }
}

impl HashingConfig {
    /// Creates a config with the given width, unigrams+bigrams and lowercasing.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            ..Self::default()
        }
    }

    /// Set the n-gram range.
    #[must_use]
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Set lowercasing.
    #[must_use]
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Checks width and n-gram range.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidHyperparameter`] if `n_features` is not a power
    /// of two in `[2^4, 2^31]` or the n-gram range is empty or starts at 0.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_features;
        let in_range = n.is_power_of_two()
            && n >= 1 << MIN_FEATURES_LOG2
            && n.trailing_zeros() <= MAX_FEATURES_LOG2;
        if !in_range {
            return Err(RobError::InvalidHyperparameter {
                param: "n_features".to_string(),
                value: n.to_string(),
                constraint: format!(
                    "a power of two between 2^{MIN_FEATURES_LOG2} and 2^{MAX_FEATURES_LOG2}"
                ),
            });
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(RobError::InvalidHyperparameter {
                param: "ngram_range".to_string(),
                value: format!("({min_n}, {max_n})"),
                constraint: "1 <= min_n <= max_n".to_string(),
            });
        }
        Ok(())
    }
}

/// Minimum occurrence counts for each fitted feature group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Base bag-of-words group of the multitask model.
    pub base: usize,
    /// Per-category interaction groups.
    pub interaction: usize,
    /// High-probability sentence group.
    pub sentence_group: usize,
    /// Features of each sentence relevance model.
    pub sentence_model: usize,
    /// Single-task bigram model.
    pub basic: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            base: 10,
            interaction: 2,
            sentence_group: 2,
            sentence_model: 2,
            basic: 2,
        }
    }
}

/// Hyper-parameter grid searched for one classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// L2 regularisation strengths.
    pub alphas: Vec<f64>,
    /// Weights applied to the positive class.
    pub positive_class_weights: Vec<f64>,
    /// Score maximised across folds.
    pub scoring: Scoring,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Training epochs per fit.
    pub max_iter: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alphas: logspace(-4.0, -1.0, 10),
            positive_class_weights: vec![1.0],
            scoring: Scoring::F1,
            folds: 3,
            max_iter: 5,
        }
    }
}

impl SearchConfig {
    /// Checks the grid is usable.
    ///
    /// # Errors
    ///
    /// Returns an error for empty grids, non-positive values or fewer than two folds.
    pub fn validate(&self, name: &str) -> Result<()> {
        let invalid = |param: &str, value: String, constraint: &str| {
            Err(RobError::InvalidHyperparameter {
                param: format!("{name}.{param}"),
                value,
                constraint: constraint.to_string(),
            })
        };
        if self.alphas.is_empty() || self.alphas.iter().any(|&a| a <= 0.0 || !a.is_finite()) {
            return invalid("alphas", format!("{:?}", self.alphas), "non-empty, all > 0");
        }
        if self.positive_class_weights.is_empty()
            || self
                .positive_class_weights
                .iter()
                .any(|&w| w <= 0.0 || !w.is_finite())
        {
            return invalid(
                "positive_class_weights",
                format!("{:?}", self.positive_class_weights),
                "non-empty, all > 0",
            );
        }
        if self.folds < 2 {
            return invalid("folds", self.folds.to_string(), ">= 2");
        }
        if self.max_iter == 0 {
            return invalid("max_iter", "0".to_string(), ">= 1");
        }
        Ok(())
    }
}

/// Complete configuration of an experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Categories modelled, in reporting order.
    pub categories: Vec<String>,
    /// Feature space of the multitask document model.
    pub document_features: HashingConfig,
    /// Feature space of the single-task bigram model.
    pub basic_features: HashingConfig,
    /// Feature space of the sentence relevance models.
    pub sentence_features: HashingConfig,
    /// Pruning thresholds.
    pub thresholds: Thresholds,
    /// Grid for the sentence relevance models.
    pub sentence_search: SearchConfig,
    /// Grid for the multitask document model.
    pub document_search: SearchConfig,
    /// Grid for the single-task bigram model.
    pub basic_search: SearchConfig,
    /// Seed for SGD shuffling.
    pub random_state: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            categories: CORE_CATEGORIES.iter().map(ToString::to_string).collect(),
            document_features: HashingConfig::new(1 << 26),
            basic_features: HashingConfig::new(1 << 24),
            sentence_features: HashingConfig::new(1 << 24),
            thresholds: Thresholds::default(),
            sentence_search: SearchConfig {
                alphas: logspace(-4.0, -1.0, 5),
                positive_class_weights: logspace(-1.0, 1.0, 5),
                scoring: Scoring::Recall,
                ..SearchConfig::default()
            },
            document_search: SearchConfig::default(),
            basic_search: SearchConfig {
                alphas: logspace(-2.0, 2.0, 10),
                ..SearchConfig::default()
            },
            random_state: 42,
        }
    }
}

impl ExperimentConfig {
    /// Reads a JSON config file and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails [`Self::validate`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(RobError::InvalidHyperparameter {
                param: "categories".to_string(),
                value: "[]".to_string(),
                constraint: "at least one category".to_string(),
            });
        }
        self.document_features.validate()?;
        self.basic_features.validate()?;
        self.sentence_features.validate()?;
        let t = &self.thresholds;
        for (name, value) in [
            ("thresholds.base", t.base),
            ("thresholds.interaction", t.interaction),
            ("thresholds.sentence_group", t.sentence_group),
            ("thresholds.sentence_model", t.sentence_model),
            ("thresholds.basic", t.basic),
        ] {
            if value == 0 {
                return Err(RobError::InvalidHyperparameter {
                    param: name.to_string(),
                    value: "0".to_string(),
                    constraint: ">= 1".to_string(),
                });
            }
        }
        self.sentence_search.validate("sentence_search")?;
        self.document_search.validate("document_search")?;
        self.basic_search.validate("basic_search")
    }
}
