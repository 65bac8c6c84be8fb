//! End-to-end risk-of-bias experiments.
//!
//! Both experiments train on documents reviewed once and test, per category,
//! on documents reviewed twice: the first review is the truth, the second
//! is the human the model is compared with. Three results tables are
//! written: the model, an "always low risk" baseline, and the second review.

use crate::cascade::{CascadedSentenceFilter, SENTENCE_PREFIX};
use crate::config::ExperimentConfig;
use crate::corpus::{CorpusProvider, JsonCorpus, LabelledTexts};
use crate::error::{Result, RobError};
use crate::metrics::{results_filename, BinaryMetricsRecorder};
use crate::model_selection::GridSearchTrainer;
use crate::text::sentence::SentenceSegmenter;
use crate::text::vectorize::{GroupSpec, MaskRegistry, ModularVectorizer};
use crate::traits::Trainer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, info_span, warn};

/// Results label of the model table.
pub const MODEL_LABEL: &str = "model";
/// Results label of the all-positive baseline table.
pub const BASELINE_LABEL: &str = "stupid-baseline";
/// Results label of the second-review table.
pub const HUMAN_LABEL: &str = "human-performance";

/// Prefix of the interaction group of `category`.
#[must_use]
pub fn interaction_prefix(category: &str) -> String {
    format!("{category}-i-")
}

/// Which experiment to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentKind {
    /// One bigram model per category
    Basic,
    /// Multitask document model with interaction and sentence-cascade groups
    #[default]
    Hybrid,
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Trainers for each model an experiment fits.
#[derive(Clone)]
pub struct Trainers {
    /// Sentence relevance models
    pub sentence: Arc<dyn Trainer>,
    /// Multitask document model
    pub document: Arc<dyn Trainer>,
    /// Per-category bigram models
    pub basic: Arc<dyn Trainer>,
}

impl fmt::Debug for Trainers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trainers").finish_non_exhaustive()
    }
}

impl Trainers {
    /// Grid-searched SGD trainers built from `config`'s search sections.
    ///
    /// # Errors
    ///
    /// Returns an error if a grid is invalid.
    pub fn grid_search(config: &ExperimentConfig) -> Result<Self> {
        let seed = config.random_state;
        Ok(Self {
            sentence: Arc::new(
                GridSearchTrainer::new(config.sentence_search.clone(), seed)?.with_label("sentence model"),
            ),
            document: Arc::new(
                GridSearchTrainer::new(config.document_search.clone(), seed)?.with_label("document model"),
            ),
            basic: Arc::new(
                GridSearchTrainer::new(config.basic_search.clone(), seed)?.with_label("basic model"),
            ),
        })
    }

    /// The same trainer for every model.
    #[must_use]
    pub fn uniform(trainer: Arc<dyn Trainer>) -> Self {
        Self {
            sentence: Arc::clone(&trainer),
            document: Arc::clone(&trainer),
            basic: trainer,
        }
    }
}

/// Everything an experiment produced.
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    /// Model scores per category
    pub model: BinaryMetricsRecorder,
    /// "Always low risk" scores per category
    pub baseline: BinaryMetricsRecorder,
    /// Second-review scores per category
    pub human: BinaryMetricsRecorder,
    /// Masks of the document feature space. The basic experiment keys them by
    /// category, since every category fits its own unprefixed space.
    pub masks: MaskRegistry,
    /// Results files written
    pub written: Vec<PathBuf>,
}

impl ExperimentOutcome {
    fn new(categories: &[String]) -> Self {
        Self {
            model: BinaryMetricsRecorder::new(categories.iter().cloned()),
            baseline: BinaryMetricsRecorder::new(categories.iter().cloned()),
            human: BinaryMetricsRecorder::new(categories.iter().cloned()),
            masks: MaskRegistry::new(),
            written: Vec::new(),
        }
    }

    /// Records one category's predictions against its truth and the second review.
    fn record(&mut self, category: &str, preds: &[bool], test: &LabelledTexts, human: &LabelledTexts) -> Result<()> {
        self.model.add_preds_test(preds, &test.labels, category)?;
        self.human.add_preds_test(&human.labels, &test.labels, category)?;
        self.baseline
            .add_preds_test(&vec![true; test.labels.len()], &test.labels, category)
    }

    fn save(&mut self, out_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(out_dir)?;
        for (label, recorder) in [
            (MODEL_LABEL, &self.model),
            (BASELINE_LABEL, &self.baseline),
            (HUMAN_LABEL, &self.human),
        ] {
            let path = out_dir.join(results_filename(label));
            recorder.save_csv(&path)?;
            info!(path = %path.display(), "wrote results");
            self.written.push(path);
        }
        Ok(())
    }
}

/// Test rows of `category`: first-review truth and second-review labels.
///
/// `None` when no document of the category was reviewed twice.
fn test_split(corpus: &JsonCorpus, category: &str) -> Option<(LabelledTexts, LabelledTexts)> {
    let ids = corpus.test_ids(category);
    if ids.is_empty() {
        warn!(category, "no double-assessed documents; category not scored");
        return None;
    }
    Some((corpus.xy(&ids, category, 0), corpus.xy(&ids, category, 1)))
}

/// Runs the experiment named by `kind`.
///
/// # Errors
///
/// See [`run_basic_experiment`] and [`run_hybrid_experiment`].
pub fn run_experiment(
    kind: ExperimentKind,
    corpus: &JsonCorpus,
    config: &ExperimentConfig,
    trainers: &Trainers,
    segmenter: Box<dyn SentenceSegmenter>,
    out_dir: &Path,
) -> Result<ExperimentOutcome> {
    match kind {
        ExperimentKind::Basic => run_basic_experiment(corpus, config, trainers, out_dir),
        ExperimentKind::Hybrid => run_hybrid_experiment(corpus, config, trainers, segmenter, out_dir),
    }
}

/// One bigram model per category, each in its own hashed space.
///
/// # Errors
///
/// - [`RobError::InsufficientData`] if a category has no training document.
/// - Any configuration, vectorizer, trainer or I/O error.
pub fn run_basic_experiment(
    corpus: &JsonCorpus,
    config: &ExperimentConfig,
    trainers: &Trainers,
    out_dir: &Path,
) -> Result<ExperimentOutcome> {
    config.validate()?;
    let mut outcome = ExperimentOutcome::new(&config.categories);
    let train_ids = corpus.training_ids();
    info!(training_documents = train_ids.len(), "running basic experiment");

    for category in &config.categories {
        let _span = info_span!("category", name = %category).entered();

        let train = corpus.xy(&train_ids, category, 0);
        if train.texts.is_empty() {
            return Err(RobError::InsufficientData {
                stage: "document model".to_string(),
                category: category.clone(),
            });
        }
        let Some((test, human)) = test_split(corpus, category) else {
            continue;
        };

        let mut vec = ModularVectorizer::new(config.basic_features)?;
        let x_train = vec.fit_transform(&train.texts, config.thresholds.basic)?;
        let x_test = vec.transform(&test.texts)?;

        let model = trainers.basic.train(&x_train, &train.labels)?;
        let preds = model.predict(&x_test)?;
        outcome.record(category, &preds, &test, &human)?;

        if let Some(mask) = vec.masks().get("") {
            outcome.masks.insert(category.clone(), mask.clone());
        }
        info!(train = train.texts.len(), test = test.texts.len(), "scored category");
    }

    outcome.save(out_dir)?;
    Ok(outcome)
}

/// Sentence cascade feeding one multitask document model.
///
/// Stage 1 trains a sentence relevance model per category on training
/// documents with reviewer quotes. Stage 2 fits the document space with a
/// base group, one interaction group per category gated on row membership,
/// and the pseudo-document group, then trains a single model. Each category
/// is tested with transform-only staging: base, that category's interaction
/// prefix, and pseudo-documents regenerated by that category's sentence model.
///
/// # Errors
///
/// - [`RobError::InsufficientData`] if a category has no training sentences
///   or no training document.
/// - Any configuration, alignment, trainer or I/O error.
pub fn run_hybrid_experiment(
    corpus: &JsonCorpus,
    config: &ExperimentConfig,
    trainers: &Trainers,
    segmenter: Box<dyn SentenceSegmenter>,
    out_dir: &Path,
) -> Result<ExperimentOutcome> {
    config.validate()?;
    let mut outcome = ExperimentOutcome::new(&config.categories);
    let train_ids = corpus.training_ids();
    info!(training_documents = train_ids.len(), "running hybrid experiment");

    let mut cascade = CascadedSentenceFilter::new(
        config.sentence_features,
        config.thresholds.sentence_model,
        segmenter,
    )?;
    for category in &config.categories {
        let _span = info_span!("sentence model", category = %category).entered();
        let ids: BTreeSet<String> = corpus
            .sentence_ids(category)
            .into_iter()
            .filter(|id| train_ids.contains(id))
            .collect();
        let data = corpus.sentence_xy(&ids, category, cascade.segmenter());
        cascade.train_category(category, &data.texts, &data.labels, trainers.sentence.as_ref())?;
    }

    let rows = corpus.multitask_xyi(&train_ids, 0, &config.categories);
    if rows.is_empty() {
        return Err(RobError::InsufficientData {
            stage: "document model".to_string(),
            category: config.categories.join(", "),
        });
    }
    let pseudo = cascade.pseudo_documents(&rows.texts, &rows.categories)?;

    let mut vec = ModularVectorizer::new(config.document_features)?;
    vec.stage(
        &rows.texts,
        GroupSpec::base().with_low_threshold(config.thresholds.base),
    )?;
    for category in &config.categories {
        let membership = rows.membership(category);
        let members = membership.iter().filter(|&&m| m).count();
        if members == 0 {
            return Err(RobError::InsufficientData {
                stage: "document model".to_string(),
                category: category.clone(),
            });
        }
        info!(category = %category, members, rows = rows.len(), "staging interaction group");
        vec.stage(
            &rows.texts,
            GroupSpec::new(interaction_prefix(category))
                .with_inclusion_mask(membership)
                .with_low_threshold(config.thresholds.interaction),
        )?;
    }
    vec.stage(
        &pseudo,
        GroupSpec::new(SENTENCE_PREFIX).with_low_threshold(config.thresholds.sentence_group),
    )?;
    let x_train = vec.finalize()?;
    info!(rows = x_train.n_rows(), nnz = x_train.nnz(), "training document model");
    let model = trainers.document.train(&x_train, &rows.labels)?;

    for category in &config.categories {
        let _span = info_span!("category", name = %category).entered();
        let Some((test, human)) = test_split(corpus, category) else {
            continue;
        };
        let categories = vec![category.as_str(); test.texts.len()];
        let test_pseudo = cascade.pseudo_documents(&test.texts, &categories)?;

        vec.reset();
        vec.stage(&test.texts, GroupSpec::base())?;
        vec.stage(&test.texts, GroupSpec::new(interaction_prefix(category)))?;
        vec.stage(&test_pseudo, GroupSpec::new(SENTENCE_PREFIX))?;
        let x_test = vec.finalize()?;

        let preds = model.predict(&x_test)?;
        outcome.record(category, &preds, &test, &human)?;
        info!(test = test.texts.len(), "scored category");
    }

    outcome.masks = vec.masks().clone();
    outcome.save(out_dir)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests;
