//! Error types for robclass operations.
//!
//! Every failure is detected before a classifier sees a feature matrix.
//! Variants fall into four classes (see [`ErrorKind`]) so callers can tell a
//! bad parameter from a misaligned pipeline or a corpus that is too small.

use thiserror::Error;

/// Coarse classification of a [`RobError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A parameter value makes the run meaningless (threshold too high,
    /// hash space too small). Retry with different parameters.
    Configuration,
    /// Staged groups disagree on rows, a transform references an unfitted
    /// prefix, or an operation was called in the wrong state.
    Alignment,
    /// A category has no usable training examples.
    DataSufficiency,
    /// Reading or writing files, or decoding their contents.
    Io,
}

/// Main error type for robclass operations.
///
/// # Examples
///
/// ```
/// use robclass::error::{ErrorKind, RobError};
///
/// let err = RobError::EmptyFeatureSpace {
///     prefix: "-s-".to_string(),
///     low_threshold: 3,
/// };
/// assert_eq!(err.kind(), ErrorKind::Configuration);
/// assert!(err.to_string().contains("-s-"));
/// ```
#[derive(Debug, Error)]
pub enum RobError {
    /// Invalid hyperparameter or configuration value.
    #[error("Invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Frequency pruning removed every column of a feature group.
    #[error(
        "Feature group '{prefix}' has no columns left after pruning with low_threshold = {low_threshold}"
    )]
    EmptyFeatureSpace {
        /// Prefix of the group that collapsed
        prefix: String,
        /// Threshold that removed every column
        low_threshold: usize,
    },

    /// Every column of the hash space is occupied by a single group.
    #[error("Feature group '{prefix}' occupies all {n_features} hashed columns; n_features is too small")]
    HashSpaceSaturated {
        /// Prefix of the group
        prefix: String,
        /// Width of the hash space
        n_features: usize,
    },

    /// Two row-aligned collections disagree on length.
    #[error("Row count mismatch in {context}: expected {expected}, got {actual}")]
    RowCountMismatch {
        /// Where the mismatch was detected
        context: String,
        /// Expected number of rows
        expected: usize,
        /// Actual number of rows
        actual: usize,
    },

    /// A transform-only stage referenced a prefix that was never fit.
    #[error("Feature group '{prefix}' was never fit; stage it with a low_threshold first")]
    UnfittedPrefix {
        /// Prefix without a learned mask
        prefix: String,
    },

    /// Operation is not allowed in the current builder state.
    #[error("Cannot {operation} while builder is {state}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// Current state name
        state: &'static str,
    },

    /// Matrix dimensions do not match.
    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// A model was used before it was trained.
    #[error("Model not fitted: {0}")]
    NotFitted(String),

    /// No training examples for a category at some stage.
    #[error("Insufficient data for {stage}: category '{category}' has no training examples")]
    InsufficientData {
        /// Pipeline stage ("sentence relevance", "document model", ...)
        stage: String,
        /// Category lacking data
        category: String,
    },

    /// Malformed or inconsistent corpus input.
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// CSV writing error.
    #[error("CSV error: {0}")]
    Csv(String),
}

impl RobError {
    /// Taxonomy class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHyperparameter { .. }
            | Self::EmptyFeatureSpace { .. }
            | Self::HashSpaceSaturated { .. } => ErrorKind::Configuration,
            Self::RowCountMismatch { .. }
            | Self::UnfittedPrefix { .. }
            | Self::InvalidState { .. }
            | Self::DimensionMismatch { .. }
            | Self::NotFitted(_) => ErrorKind::Alignment,
            Self::InsufficientData { .. } => ErrorKind::DataSufficiency,
            Self::Corpus(_) | Self::Io(_) | Self::Serialization(_) | Self::Csv(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for a row-count mismatch.
    pub(crate) fn rows(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::RowCountMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for RobError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for RobError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for RobError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

/// Convenience type alias for Results with [`RobError`].
pub type Result<T> = std::result::Result<T, RobError>;
