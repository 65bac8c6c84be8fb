//! Evaluation metrics for the binary risk-of-bias classifiers.
//!
//! Precision, recall, F1 and accuracy of the positive (low-risk or relevant)
//! class, and a recorder that writes per-category results tables.

pub mod classification;

pub use classification::{
    results_filename, BinaryConfusion, BinaryMetrics, BinaryMetricsRecorder, CSV_HEADER,
};

#[cfg(test)]
#[path = "tests_classification_contract.rs"]
mod tests_classification_contract;
