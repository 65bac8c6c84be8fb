//! Incremental, multi-group feature assembly.
//!
//! Several feature families (base bag-of-words, category-gated interaction
//! blocks, cascade-derived sentence text) are hashed into the same
//! fixed-width space, each under its own prefix, staged one by one and then
//! overlaid into a single matrix:
//!
//! ```text
//!  reset()            stage(..)            finalize()
//! ───────▶ Empty ──────────────▶ Staging ─────────────▶ Finalized
//!                               ▲      │
//!                               └──────┘ stage(..)
//! ```
//!
//! A group staged with a `low_threshold` is a fit: its frequency mask is
//! learned and stored under the group's prefix. A group staged without one is
//! a transform and must find that stored mask.

use super::filter::{FrequencyFilter, FrequencyMask, MaskRegistry};
use super::hashing::HashingVectorizer;
use crate::config::HashingConfig;
use crate::error::{Result, RobError};
use crate::primitives::SparseMatrix;
use tracing::debug;

/// Whether a staged group learns its mask or replays a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Learn a mask keeping columns seen in at least `low_threshold` rows.
    Fit {
        /// Minimum occurrence count
        low_threshold: usize,
    },
    /// Apply the mask previously fit for the same prefix.
    Transform,
}

/// Request to stage one feature group.
///
/// # Examples
///
/// ```
/// use robclass::text::vectorize::{GroupMode, GroupSpec};
///
/// let spec = GroupSpec::new("Allocation concealment-i-")
///     .with_inclusion_mask(vec![true, false])
///     .with_low_threshold(2);
/// assert_eq!(spec.mode(), GroupMode::Fit { low_threshold: 2 });
/// assert_eq!(GroupSpec::base().mode(), GroupMode::Transform);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSpec {
    prefix: String,
    inclusion_mask: Option<Vec<bool>>,
    low_threshold: Option<usize>,
}

impl GroupSpec {
    /// Group hashing its tokens under `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Unprefixed group.
    #[must_use]
    pub fn base() -> Self {
        Self::default()
    }

    /// Zero every document whose mask entry is false.
    #[must_use]
    pub fn with_inclusion_mask(mut self, mask: Vec<bool>) -> Self {
        self.inclusion_mask = Some(mask);
        self
    }

    /// Make this a fit call with the given pruning threshold.
    #[must_use]
    pub fn with_low_threshold(mut self, low_threshold: usize) -> Self {
        self.low_threshold = Some(low_threshold);
        self
    }

    /// Group prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Fit or transform.
    #[must_use]
    pub fn mode(&self) -> GroupMode {
        match self.low_threshold {
            Some(low_threshold) => GroupMode::Fit { low_threshold },
            None => GroupMode::Transform,
        }
    }
}

/// A staged, already hashed and pruned feature group.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroup {
    /// Group prefix
    pub prefix: String,
    /// How the group's mask was obtained
    pub mode: GroupMode,
    /// Per-document inclusion gate, if any
    pub inclusion_mask: Option<Vec<bool>>,
    /// One row per document
    pub rows: SparseMatrix,
}

/// Builder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing staged.
    Empty,
    /// At least one group staged.
    Staging,
    /// Matrix emitted; reset before staging again.
    Finalized,
}

impl BuilderState {
    fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Staging => "staging",
            Self::Finalized => "finalized",
        }
    }
}

/// Ordered list of staged groups sharing one column space.
///
/// Checks alignment and overlays groups; it does no hashing itself.
#[derive(Debug, Clone)]
pub struct FeatureGroupAccumulator {
    n_features: usize,
    state: BuilderState,
    groups: Vec<FeatureGroup>,
}

impl FeatureGroupAccumulator {
    /// Empty accumulator over `n_features` columns.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            n_features,
            state: BuilderState::Empty,
            groups: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Staged groups in staging order.
    #[must_use]
    pub fn groups(&self) -> &[FeatureGroup] {
        &self.groups
    }

    /// Discards every staged group.
    pub fn reset(&mut self) {
        self.groups.clear();
        self.state = BuilderState::Empty;
    }

    /// Fails unless staging is currently allowed.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state == BuilderState::Finalized {
            return Err(RobError::InvalidState {
                operation: "stage",
                state: self.state.name(),
            });
        }
        Ok(())
    }

    /// Appends a group.
    ///
    /// # Errors
    ///
    /// - [`RobError::InvalidState`] after [`Self::finalize`] without a reset.
    /// - [`RobError::DimensionMismatch`] if the group's width differs.
    /// - [`RobError::RowCountMismatch`] if its row count differs from the
    ///   groups already staged.
    pub fn push(&mut self, group: FeatureGroup) -> Result<()> {
        self.ensure_open()?;
        if group.rows.n_cols() != self.n_features {
            return Err(RobError::DimensionMismatch {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", group.rows.n_cols()),
            });
        }
        if let Some(first) = self.groups.first() {
            if first.rows.n_rows() != group.rows.n_rows() {
                return Err(RobError::rows(
                    format!("feature group '{}'", group.prefix),
                    first.rows.n_rows(),
                    group.rows.n_rows(),
                ));
            }
        }
        self.groups.push(group);
        self.state = BuilderState::Staging;
        Ok(())
    }

    /// Overlays every staged group into one matrix.
    ///
    /// A document's row is the logical OR of its rows in every group, so the
    /// result stays binary and `n_features` wide. Row order is staging order.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidState`] unless the builder is staging.
    pub fn finalize(&mut self) -> Result<SparseMatrix> {
        if self.state != BuilderState::Staging {
            return Err(RobError::InvalidState {
                operation: "finalize",
                state: self.state.name(),
            });
        }
        let mut groups = self.groups.iter();
        let mut combined = match groups.next() {
            Some(first) => first.rows.clone(),
            None => SparseMatrix::new(self.n_features),
        };
        for group in groups {
            combined.overlay(&group.rows)?;
        }
        self.state = BuilderState::Finalized;
        Ok(combined)
    }
}

/// Hashing space, learned masks and staging builder in one place.
///
/// # Examples
///
/// ```
/// use robclass::config::HashingConfig;
/// use robclass::text::vectorize::{GroupSpec, ModularVectorizer};
///
/// let train = ["low risk of bias", "high risk of bias"];
/// let mut vec = ModularVectorizer::new(HashingConfig::new(1024)).expect("valid config");
///
/// vec.stage(&train, GroupSpec::base().with_low_threshold(2)).expect("fit base");
/// vec.stage(
///     &train,
///     GroupSpec::new("d-i-")
///         .with_inclusion_mask(vec![true, true])
///         .with_low_threshold(1),
/// )
/// .expect("fit interaction");
/// let x_train = vec.finalize().expect("aligned groups");
/// assert_eq!(x_train.n_rows(), 2);
///
/// vec.reset();
/// vec.stage(&["unclear risk"], GroupSpec::base()).expect("replay base mask");
/// vec.stage(&["unclear risk"], GroupSpec::new("d-i-")).expect("replay interaction mask");
/// let x_test = vec.finalize().expect("aligned groups");
/// assert_eq!(x_test.n_cols(), 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ModularVectorizer {
    space: HashingVectorizer,
    masks: MaskRegistry,
    builder: FeatureGroupAccumulator,
}

impl ModularVectorizer {
    /// Create a vectorizer with no learned masks.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid.
    pub fn new(config: HashingConfig) -> Result<Self> {
        let space = HashingVectorizer::new(config)?;
        let builder = FeatureGroupAccumulator::new(space.n_features());
        Ok(Self {
            space,
            masks: MaskRegistry::new(),
            builder,
        })
    }

    /// Adopt masks from an earlier fit (e.g. loaded with [`MaskRegistry::load`]).
    ///
    /// # Errors
    ///
    /// Returns [`RobError::DimensionMismatch`] if a mask was learned in a
    /// space of a different width.
    pub fn with_masks(mut self, masks: MaskRegistry) -> Result<Self> {
        for prefix in masks.prefixes() {
            let width = masks.get(prefix).map_or(0, FrequencyMask::n_features);
            if width != self.space.n_features() {
                return Err(RobError::DimensionMismatch {
                    expected: format!("masks over {} columns", self.space.n_features()),
                    actual: format!("mask '{prefix}' over {width} columns"),
                });
            }
        }
        self.masks = masks;
        Ok(self)
    }

    /// The hashing space.
    #[must_use]
    pub fn space(&self) -> &HashingVectorizer {
        &self.space
    }

    /// Masks learned so far.
    #[must_use]
    pub fn masks(&self) -> &MaskRegistry {
        &self.masks
    }

    /// Builder state.
    #[must_use]
    pub fn state(&self) -> BuilderState {
        self.builder.state()
    }

    /// Staged groups.
    #[must_use]
    pub fn staged(&self) -> &[FeatureGroup] {
        self.builder.groups()
    }

    /// Discards staged groups; learned masks are kept.
    pub fn reset(&mut self) {
        self.builder.reset();
    }

    /// Hashes, prunes and stages one feature group.
    ///
    /// # Errors
    ///
    /// - [`RobError::InvalidState`] if the builder was finalized and not reset.
    /// - [`RobError::RowCountMismatch`] if the inclusion mask or the document
    ///   count disagrees with what is staged.
    /// - [`RobError::UnfittedPrefix`] for a transform of a never-fit prefix.
    /// - [`RobError::EmptyFeatureSpace`] / [`RobError::HashSpaceSaturated`]
    ///   when a fit leaves nothing usable.
    pub fn stage<S: AsRef<str> + Sync>(&mut self, documents: &[S], spec: GroupSpec) -> Result<()> {
        self.builder.ensure_open()?;
        let GroupSpec {
            prefix,
            inclusion_mask,
            low_threshold,
        } = spec;

        if let Some(mask) = &inclusion_mask {
            if mask.len() != documents.len() {
                return Err(RobError::rows(
                    format!("inclusion mask of '{prefix}'"),
                    documents.len(),
                    mask.len(),
                ));
            }
        }

        if let Some(first) = self.builder.groups().first() {
            if first.rows.n_rows() != documents.len() {
                return Err(RobError::rows(
                    format!("feature group '{prefix}'"),
                    first.rows.n_rows(),
                    documents.len(),
                ));
            }
        }

        let mode = match low_threshold {
            Some(low_threshold) => GroupMode::Fit { low_threshold },
            None => GroupMode::Transform,
        };
        // Check before hashing so a bad transform fails fast.
        if mode == GroupMode::Transform && !self.masks.contains(&prefix) {
            return Err(RobError::UnfittedPrefix { prefix });
        }

        let hashed = self
            .space
            .transform_gated(documents, &prefix, inclusion_mask.as_deref());

        let (rows, fitted) = match mode {
            GroupMode::Fit { low_threshold } => {
                let mask = self.fit_mask(&prefix, &hashed, low_threshold)?;
                (FrequencyFilter::apply(&hashed, &mask)?, Some(mask))
            }
            GroupMode::Transform => {
                let mask = self
                    .masks
                    .get(&prefix)
                    .ok_or_else(|| RobError::UnfittedPrefix {
                        prefix: prefix.clone(),
                    })?;
                (FrequencyFilter::apply(&hashed, mask)?, None)
            }
        };

        debug!(
            prefix = %prefix,
            rows = rows.n_rows(),
            active_rows = rows.rows().iter().filter(|r| !r.is_empty()).count(),
            nnz = rows.nnz(),
            fit = matches!(mode, GroupMode::Fit { .. }),
            "staged feature group"
        );

        // A rejected group must leave the registry untouched.
        self.builder.push(FeatureGroup {
            prefix: prefix.clone(),
            mode,
            inclusion_mask,
            rows,
        })?;
        if let Some(mask) = fitted {
            if self.masks.insert(prefix.clone(), mask).is_some() {
                debug!(prefix = %prefix, "replaced previously fit mask");
            }
        }
        Ok(())
    }

    fn fit_mask(
        &self,
        prefix: &str,
        hashed: &SparseMatrix,
        low_threshold: usize,
    ) -> Result<FrequencyMask> {
        let filter = FrequencyFilter::new(low_threshold)?;
        let occupied = hashed.column_counts().len();
        if occupied == self.space.n_features() {
            return Err(RobError::HashSpaceSaturated {
                prefix: prefix.to_string(),
                n_features: self.space.n_features(),
            });
        }
        let mask = filter.fit(prefix, hashed)?;
        debug!(
            prefix = %prefix,
            occupied,
            retained = mask.len(),
            low_threshold,
            "learned frequency mask"
        );
        Ok(mask)
    }

    /// Overlays the staged groups into one matrix.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidState`] unless groups are staged.
    pub fn finalize(&mut self) -> Result<SparseMatrix> {
        self.builder.finalize()
    }

    /// Hashes `documents` under `prefix` and replays that prefix's mask,
    /// leaving the staging builder untouched.
    ///
    /// Equal to staging the group alone and finalizing.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::UnfittedPrefix`] if `prefix` was never fit.
    pub fn project<S: AsRef<str> + Sync>(&self, documents: &[S], prefix: &str) -> Result<SparseMatrix> {
        let mask = self
            .masks
            .get(prefix)
            .ok_or_else(|| RobError::UnfittedPrefix {
                prefix: prefix.to_string(),
            })?;
        FrequencyFilter::apply(&self.space.transform(documents, prefix), mask)
    }

    /// Single unprefixed group: reset, fit with `low_threshold`, finalize.
    ///
    /// # Errors
    ///
    /// See [`Self::stage`].
    pub fn fit_transform<S: AsRef<str> + Sync>(
        &mut self,
        documents: &[S],
        low_threshold: usize,
    ) -> Result<SparseMatrix> {
        self.reset();
        self.stage(documents, GroupSpec::base().with_low_threshold(low_threshold))?;
        self.finalize()
    }

    /// Single unprefixed group: reset, replay the base mask, finalize.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::UnfittedPrefix`] if [`Self::fit_transform`] never ran.
    pub fn transform<S: AsRef<str> + Sync>(&mut self, documents: &[S]) -> Result<SparseMatrix> {
        self.reset();
        self.stage(documents, GroupSpec::base())?;
        self.finalize()
    }
}
