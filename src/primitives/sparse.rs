//! Sparse binary rows and matrices.

use crate::error::{Result, RobError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A binary sparse row: the sorted, de-duplicated set of active columns.
///
/// Every active cell has value 1; absent columns are 0.
///
/// # Examples
///
/// ```
/// use robclass::primitives::SparseRow;
///
/// let row = SparseRow::from_columns(vec![7, 3, 7, 1]);
/// assert_eq!(row.columns(), &[1, 3, 7]);
/// assert!(row.contains(3));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SparseRow {
    columns: Vec<u32>,
}

impl SparseRow {
    /// Creates an all-zero row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row from arbitrary column indices (order and duplicates ignored).
    #[must_use]
    pub fn from_columns(columns: impl IntoIterator<Item = u32>) -> Self {
        let mut columns: Vec<u32> = columns.into_iter().collect();
        columns.sort_unstable();
        columns.dedup();
        Self { columns }
    }

    /// Active columns in ascending order.
    #[must_use]
    pub fn columns(&self) -> &[u32] {
        &self.columns
    }

    /// Number of active columns.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.columns.len()
    }

    /// True when the row has no active column.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether `column` is active.
    #[must_use]
    pub fn contains(&self, column: u32) -> bool {
        self.columns.binary_search(&column).is_ok()
    }

    /// Largest active column, if any.
    #[must_use]
    pub fn max_column(&self) -> Option<u32> {
        self.columns.last().copied()
    }

    /// Logical OR of two rows.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (a, b) = (&self.columns, &other.columns);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        Self { columns: merged }
    }

    /// Keeps only the columns for which `keep` returns true.
    #[must_use]
    pub fn filtered(&self, mut keep: impl FnMut(u32) -> bool) -> Self {
        Self {
            columns: self.columns.iter().copied().filter(|&c| keep(c)).collect(),
        }
    }
}

/// A sparse binary matrix with a fixed column count.
///
/// This is the hashed feature matrix consumed by classifiers: one row per
/// document, `n_cols` equal to the hash space width.
///
/// # Examples
///
/// ```
/// use robclass::primitives::{SparseMatrix, SparseRow};
///
/// let m = SparseMatrix::from_rows(
///     16,
///     vec![SparseRow::from_columns([1, 4]), SparseRow::new()],
/// )
/// .expect("columns are in range");
/// assert_eq!(m.shape(), (2, 16));
/// assert_eq!(m.get(0, 4), 1.0);
/// assert_eq!(m.get(1, 4), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    rows: Vec<SparseRow>,
}

impl SparseMatrix {
    /// Creates a matrix with no rows.
    #[must_use]
    pub fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: Vec::new(),
        }
    }

    /// Creates a matrix with `n_rows` all-zero rows.
    #[must_use]
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![SparseRow::new(); n_rows],
        }
    }

    /// Creates a matrix from rows.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::DimensionMismatch`] if a row has a column outside `0..n_cols`.
    pub fn from_rows(n_cols: usize, rows: Vec<SparseRow>) -> Result<Self> {
        if let Some((i, max)) = rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.max_column().map(|m| (i, m)))
            .find(|&(_, m)| m as usize >= n_cols)
        {
            return Err(RobError::DimensionMismatch {
                expected: format!("columns < {n_cols}"),
                actual: format!("row {i} has column {max}"),
            });
        }
        Ok(Self { n_cols, rows })
    }

    /// Creates a matrix from rows already known to be in range.
    pub(crate) fn from_rows_unchecked(n_cols: usize, rows: Vec<SparseRow>) -> Self {
        debug_assert!(rows
            .iter()
            .all(|r| r.max_column().map_or(true, |m| (m as usize) < n_cols)));
        Self { n_cols, rows }
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.n_cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Returns the row at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn row(&self, index: usize) -> &SparseRow {
        &self.rows[index]
    }

    /// All rows in order.
    #[must_use]
    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    /// Value at (row, col): 1.0 when active, 0.0 otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: u32) -> f32 {
        if self.rows[row].contains(col) {
            1.0
        } else {
            0.0
        }
    }

    /// Total number of active cells.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseRow::nnz).sum()
    }

    /// Number of rows in which each column is active.
    #[must_use]
    pub fn column_counts(&self) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for row in &self.rows {
            for &c in row.columns() {
                *counts.entry(c).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Copies the rows at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            n_cols: self.n_cols,
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// ORs `other` into `self`, row by row.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    pub fn overlay(&mut self, other: &Self) -> Result<()> {
        if self.n_cols != other.n_cols {
            return Err(RobError::DimensionMismatch {
                expected: format!("{} columns", self.n_cols),
                actual: format!("{} columns", other.n_cols),
            });
        }
        if self.rows.len() != other.rows.len() {
            return Err(RobError::rows("overlay", self.rows.len(), other.rows.len()));
        }
        for (mine, theirs) in self.rows.iter_mut().zip(&other.rows) {
            if !theirs.is_empty() {
                *mine = mine.union(theirs);
            }
        }
        Ok(())
    }
}
