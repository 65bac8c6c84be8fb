//! Hashed text vectorization.
//!
//! - [`HashingVectorizer`]: n-gram extraction and deterministic token hashing
//! - [`FrequencyFilter`] / [`FrequencyMask`]: fit-time column pruning
//! - [`ModularVectorizer`]: prefixed, optionally gated feature groups staged
//!   and overlaid into one matrix

mod builder;
mod filter;
mod hashing;

pub use builder::{
    BuilderState, FeatureGroup, FeatureGroupAccumulator, GroupMode, GroupSpec, ModularVectorizer,
};
pub use filter::{FrequencyFilter, FrequencyMask, MaskRegistry};
pub use hashing::{hash_index, murmurhash3_32, HashingVectorizer};


#[cfg(test)]
mod vectorize_contract_falsify;
