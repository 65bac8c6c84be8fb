//! Deterministic feature hashing.
//!
//! Tokens are hashed with 32-bit MurmurHash3 (seed 0) over the UTF-8 bytes of
//! `prefix + token`. The signed hash is folded to `|h| mod n_features`, the
//! same index scheme as scikit-learn's `HashingVectorizer`, so column indices
//! are stable across runs, processes and platforms.
//!
//! Distinct tokens may land on the same column. That is the price of a
//! fixed-width space and is never reported as an error.

use crate::config::HashingConfig;
use crate::error::Result;
use crate::primitives::{SparseMatrix, SparseRow};
use crate::text::tokenize::extract_ngrams;
use rayon::prelude::*;
use std::collections::BTreeSet;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// 32-bit MurmurHash3 (x86 variant).
///
/// # Examples
///
/// ```
/// use robclass::text::vectorize::murmurhash3_32;
///
/// assert_eq!(murmurhash3_32(b"", 0), 0);
/// assert_eq!(murmurhash3_32(b"hello", 0), 0x248b_fa47);
/// ```
#[must_use]
pub fn murmurhash3_32(key: &[u8], seed: u32) -> u32 {
    let mut h = seed;
    let mut blocks = key.chunks_exact(4);
    for block in &mut blocks {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_k(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let k = tail
            .iter()
            .enumerate()
            .fold(0u32, |k, (i, &b)| k ^ (u32::from(b) << (8 * i)));
        h ^= mix_k(k);
    }

    // Lengths beyond u32 wrap, as in the reference implementation.
    h ^= key.len() as u32;
    fmix32(h)
}

#[inline]
fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Column of `prefix + token` in a space of `n_features` columns.
///
/// # Panics
///
/// Panics if `n_features` is zero.
#[must_use]
pub fn hash_index(token: &str, prefix: &str, n_features: usize) -> u32 {
    let mut key = String::with_capacity(prefix.len() + token.len());
    key.push_str(prefix);
    key.push_str(token);
    let signed = murmurhash3_32(key.as_bytes(), 0) as i32;
    (signed.unsigned_abs() as usize % n_features) as u32
}

/// Fixed-width hashed feature space.
///
/// Maps each document's n-gram set to a binary sparse row. No token→column
/// table is ever stored, so memory stays bounded regardless of vocabulary.
///
/// # Examples
///
/// ```
/// use robclass::config::HashingConfig;
/// use robclass::text::vectorize::HashingVectorizer;
///
/// let space = HashingVectorizer::new(HashingConfig::new(1024).with_ngram_range(1, 1))
///     .expect("valid config");
/// let row = space.vectorize("bias bias unclear", "");
/// assert_eq!(row.nnz(), 2);
/// assert!(row.contains(space.hash_index("bias", "")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashingVectorizer {
    config: HashingConfig,
}

impl HashingVectorizer {
    /// Create a hashing space.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails [`HashingConfig::validate`].
    pub fn new(config: HashingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The space's configuration.
    #[must_use]
    pub fn config(&self) -> &HashingConfig {
        &self.config
    }

    /// Number of hashed columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.config.n_features
    }

    /// N-gram set of `document` under this space's range and casing.
    #[must_use]
    pub fn extract_ngrams(&self, document: &str) -> BTreeSet<String> {
        extract_ngrams(document, self.config.ngram_range, self.config.lowercase)
    }

    /// Column of `token` qualified by `prefix`.
    #[must_use]
    pub fn hash_index(&self, token: &str, prefix: &str) -> u32 {
        hash_index(token, prefix, self.config.n_features)
    }

    /// Binary row of `document` with every n-gram qualified by `prefix`.
    #[must_use]
    pub fn vectorize(&self, document: &str, prefix: &str) -> SparseRow {
        SparseRow::from_columns(
            self.extract_ngrams(document)
                .iter()
                .map(|gram| self.hash_index(gram, prefix)),
        )
    }

    /// Hashes every document, in parallel, preserving input order.
    #[must_use]
    pub fn transform<S: AsRef<str> + Sync>(&self, documents: &[S], prefix: &str) -> SparseMatrix {
        self.transform_gated(documents, prefix, None)
    }

    /// Like [`Self::transform`], but rows whose `gate` entry is false are all-zero.
    ///
    /// The caller guarantees `gate`, when given, has one entry per document.
    pub(crate) fn transform_gated<S: AsRef<str> + Sync>(
        &self,
        documents: &[S],
        prefix: &str,
        gate: Option<&[bool]>,
    ) -> SparseMatrix {
        let rows: Vec<SparseRow> = documents
            .par_iter()
            .enumerate()
            .map(|(i, doc)| {
                if gate.map_or(true, |g| g[i]) {
                    self.vectorize(doc.as_ref(), prefix)
                } else {
                    SparseRow::new()
                }
            })
            .collect();
        // hash_index folds into 0..n_features
        SparseMatrix::from_rows_unchecked(self.config.n_features, rows)
    }
}
