//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use robclass::prelude::*;
//! ```

pub use crate::cascade::{CascadedSentenceFilter, SENTENCE_PREFIX};
pub use crate::classification::{FixedTrainer, SgdClassifier, SgdParams};
pub use crate::config::{ExperimentConfig, HashingConfig, SearchConfig, Thresholds, CORE_CATEGORIES};
pub use crate::corpus::{CorpusProvider, JsonCorpus};
pub use crate::error::{ErrorKind, RobError};
pub use crate::experiment::{run_experiment, ExperimentKind, ExperimentOutcome, Trainers};
pub use crate::metrics::{BinaryMetricsRecorder, results_filename};
pub use crate::model_selection::{GridSearchTrainer, KFold, Scoring};
pub use crate::primitives::{SparseMatrix, SparseRow};
pub use crate::text::sentence::{RuleBasedSegmenter, SentenceSegmenter};
pub use crate::text::vectorize::{
    FrequencyFilter, GroupSpec, HashingVectorizer, MaskRegistry, ModularVectorizer,
};
pub use crate::traits::{BinaryClassifier, Trainer};
