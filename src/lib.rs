//! Robclass: risk-of-bias text classification over hashed features.
//!
//! Documents are mapped into a fixed-width binary feature space by hashing
//! their unigrams and bigrams. Several feature groups (the base bag of words,
//! per-category interaction blocks, sentences picked by a relevance cascade)
//! share that space, distinguished only by a string prefix, and are overlaid
//! into one sparse matrix for a single classifier.
//!
//! # Quick Start
//!
//! ```
//! use robclass::prelude::*;
//!
//! let mut vec = ModularVectorizer::new(HashingConfig::new(1 << 16))
//!     .expect("valid config");
//!
//! let docs = ["random sequence was adequate", "allocation unclear", "random allocation"];
//! let gate = vec![true, false, true];
//!
//! vec.stage(&docs, GroupSpec::base().with_low_threshold(1)).expect("base group");
//! vec.stage(&docs, GroupSpec::new("d-i-").with_inclusion_mask(gate).with_low_threshold(1))
//!     .expect("interaction group");
//! let x = vec.finalize().expect("aligned groups");
//! assert_eq!(x.shape(), (3, 1 << 16));
//! ```
//!
//! # Modules
//!
//! - [`text`]: Tokenization, sentence segmentation and feature hashing
//! - [`primitives`]: Sparse binary rows and matrices
//! - [`classification`]: SGD-trained linear SVM
//! - [`model_selection`]: K-fold splitting and grid search
//! - [`cascade`]: Per-category sentence relevance cascade
//! - [`corpus`]: Labelled corpus access
//! - [`metrics`]: Binary metrics and results tables
//! - [`experiment`]: Basic and hybrid experiments
//! - [`config`]: Hashing, pruning and search configuration

pub mod cascade;
pub mod classification;
pub mod config;
pub mod corpus;
pub mod error;
pub mod experiment;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod primitives;
pub mod text;
pub mod traits;

pub use error::{Result, RobError};
pub use primitives::{SparseMatrix, SparseRow};
pub use traits::{BinaryClassifier, Trainer};
