//! Text processing: n-gram extraction, sentence segmentation and feature
//! hashing.

pub mod sentence;
pub mod tokenize;
pub mod vectorize;
