//! Frequency-based column pruning.
//!
//! A [`FrequencyMask`] is learned once from the fit corpus and replayed
//! unchanged on every later transform of the same feature group.

use crate::error::{Result, RobError};
use crate::primitives::{SparseMatrix, SparseRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Columns of a hash space that met a minimum occurrence count at fit time.
///
/// Stored sparsely as the sorted list of retained columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyMask {
    n_features: usize,
    low_threshold: usize,
    retained: Vec<u32>,
}

impl FrequencyMask {
    /// Width of the space the mask was learned in.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Threshold the mask was learned with.
    #[must_use]
    pub fn low_threshold(&self) -> usize {
        self.low_threshold
    }

    /// Retained columns, ascending.
    #[must_use]
    pub fn retained(&self) -> &[u32] {
        &self.retained
    }

    /// Number of retained columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// True when no column was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Whether `column` survives the mask.
    #[must_use]
    pub fn contains(&self, column: u32) -> bool {
        self.retained.binary_search(&column).is_ok()
    }

    /// Projects `row` onto the retained columns.
    #[must_use]
    pub fn apply_row(&self, row: &SparseRow) -> SparseRow {
        row.filtered(|c| self.contains(c))
    }
}

/// Learns and applies [`FrequencyMask`]s.
///
/// # Examples
///
/// ```
/// use robclass::primitives::{SparseMatrix, SparseRow};
/// use robclass::text::vectorize::FrequencyFilter;
///
/// let rows = SparseMatrix::from_rows(
///     16,
///     vec![SparseRow::from_columns([1, 2]), SparseRow::from_columns([1])],
/// )
/// .expect("valid rows");
///
/// let mask = FrequencyFilter::new(2)
///     .expect("threshold >= 1")
///     .fit("", &rows)
///     .expect("column 1 survives");
/// assert_eq!(mask.retained(), &[1]);
///
/// let pruned = FrequencyFilter::apply(&rows, &mask).expect("same width");
/// assert_eq!(pruned.row(0).columns(), &[1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyFilter {
    low_threshold: usize,
}

impl FrequencyFilter {
    /// Filter keeping columns active in at least `low_threshold` rows.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidHyperparameter`] if `low_threshold` is zero.
    pub fn new(low_threshold: usize) -> Result<Self> {
        if low_threshold == 0 {
            return Err(RobError::InvalidHyperparameter {
                param: "low_threshold".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        Ok(Self { low_threshold })
    }

    /// The occurrence threshold.
    #[must_use]
    pub fn low_threshold(&self) -> usize {
        self.low_threshold
    }

    /// Learns the mask of `rows` (a fit-corpus feature group named `prefix`).
    ///
    /// Rows are binary, so a column's count is the number of rows it is active in.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::EmptyFeatureSpace`] if no column reaches the threshold;
    /// the group would otherwise contribute nothing.
    pub fn fit(&self, prefix: &str, rows: &SparseMatrix) -> Result<FrequencyMask> {
        let mut retained: Vec<u32> = rows
            .column_counts()
            .into_iter()
            .filter(|&(_, count)| count >= self.low_threshold)
            .map(|(column, _)| column)
            .collect();
        retained.sort_unstable();

        if retained.is_empty() {
            return Err(RobError::EmptyFeatureSpace {
                prefix: prefix.to_string(),
                low_threshold: self.low_threshold,
            });
        }

        Ok(FrequencyMask {
            n_features: rows.n_cols(),
            low_threshold: self.low_threshold,
            retained,
        })
    }

    /// Zeroes every column of `rows` outside `mask`. Learns nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::DimensionMismatch`] if the widths differ.
    pub fn apply(rows: &SparseMatrix, mask: &FrequencyMask) -> Result<SparseMatrix> {
        if rows.n_cols() != mask.n_features {
            return Err(RobError::DimensionMismatch {
                expected: format!("{} columns", mask.n_features),
                actual: format!("{} columns", rows.n_cols()),
            });
        }
        let pruned = rows.rows().iter().map(|r| mask.apply_row(r)).collect();
        Ok(SparseMatrix::from_rows_unchecked(rows.n_cols(), pruned))
    }
}

/// Learned masks keyed by feature-group prefix.
///
/// Lives outside the staging builder so masks survive every reset and can be
/// saved after a fit and loaded for a later transform-only run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRegistry {
    masks: BTreeMap<String, FrequencyMask>,
}

impl MaskRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the mask for `prefix`, returning the one it replaces.
    pub fn insert(&mut self, prefix: impl Into<String>, mask: FrequencyMask) -> Option<FrequencyMask> {
        self.masks.insert(prefix.into(), mask)
    }

    /// Mask learned for `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&FrequencyMask> {
        self.masks.get(prefix)
    }

    /// Whether `prefix` has been fit.
    #[must_use]
    pub fn contains(&self, prefix: &str) -> bool {
        self.masks.contains_key(prefix)
    }

    /// Number of fitted prefixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// True when nothing has been fit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Fitted prefixes, sorted.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.masks.keys().map(String::as_str)
    }

    /// Writes the registry with bincode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or encoding fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Reads a registry written by [`Self::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}
