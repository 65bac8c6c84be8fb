//! Core compute primitives.
//!
//! Hashed feature spaces are far too wide (up to 2^26 columns) for dense
//! storage, so every row and matrix here is sparse and binary.

mod sparse;

pub use sparse::{SparseMatrix, SparseRow};
