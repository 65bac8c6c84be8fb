//! Two-stage sentence cascade.
//!
//! Stage 1 trains one sentence relevance model per category. Stage 2 turns
//! each document into a pseudo-document made of the sentences its category's
//! model predicts relevant; the document model stages those under
//! [`SENTENCE_PREFIX`].
//!
//! Each category owns its own [`ModularVectorizer`], so a sentence is always
//! projected through the mask learned from that category's training sentences.

use crate::config::HashingConfig;
use crate::error::{Result, RobError};
use crate::text::sentence::SentenceSegmenter;
use crate::text::vectorize::ModularVectorizer;
use crate::traits::{BinaryClassifier, Trainer};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Prefix of the high-probability-sentence feature group.
pub const SENTENCE_PREFIX: &str = "-s-";

/// Relevance classifier of one category, with the feature space it was fit in.
pub struct SentenceModel {
    vectorizer: ModularVectorizer,
    classifier: Box<dyn BinaryClassifier>,
}

impl std::fmt::Debug for SentenceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceModel")
            .field("vectorizer", &self.vectorizer)
            .finish_non_exhaustive()
    }
}

impl SentenceModel {
    /// Fits the sentence space with `low_threshold` and trains on it.
    ///
    /// # Errors
    ///
    /// Propagates vectorizer and trainer errors.
    pub fn train(
        sentences: &[String],
        labels: &[bool],
        config: HashingConfig,
        low_threshold: usize,
        trainer: &dyn Trainer,
    ) -> Result<Self> {
        let mut vectorizer = ModularVectorizer::new(config)?;
        let x = vectorizer.fit_transform(sentences, low_threshold)?;
        let classifier = trainer.train(&x, labels)?;
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// Relevance of each sentence.
    ///
    /// # Errors
    ///
    /// Propagates classifier errors.
    pub fn predict<S: AsRef<str> + Sync>(&self, sentences: &[S]) -> Result<Vec<bool>> {
        let x = self.vectorizer.project(sentences, "")?;
        self.classifier.predict(&x)
    }

    /// The fitted sentence space.
    #[must_use]
    pub fn vectorizer(&self) -> &ModularVectorizer {
        &self.vectorizer
    }
}

/// Per-category sentence models plus the segmenter that feeds them.
pub struct CascadedSentenceFilter {
    config: HashingConfig,
    low_threshold: usize,
    segmenter: Box<dyn SentenceSegmenter>,
    models: BTreeMap<String, SentenceModel>,
}

impl std::fmt::Debug for CascadedSentenceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadedSentenceFilter")
            .field("config", &self.config)
            .field("low_threshold", &self.low_threshold)
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CascadedSentenceFilter {
    /// Cascade hashing sentences with `config`, pruning at `low_threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::InvalidHyperparameter`] for an invalid config or a
    /// zero threshold.
    pub fn new(
        config: HashingConfig,
        low_threshold: usize,
        segmenter: Box<dyn SentenceSegmenter>,
    ) -> Result<Self> {
        config.validate()?;
        if low_threshold == 0 {
            return Err(RobError::InvalidHyperparameter {
                param: "low_threshold".to_string(),
                value: "0".to_string(),
                constraint: ">= 1".to_string(),
            });
        }
        Ok(Self {
            config,
            low_threshold,
            segmenter,
            models: BTreeMap::new(),
        })
    }

    /// The segmenter feeding the sentence models.
    #[must_use]
    pub fn segmenter(&self) -> &dyn SentenceSegmenter {
        self.segmenter.as_ref()
    }

    /// Trains (or retrains) the relevance model of `category`.
    ///
    /// # Errors
    ///
    /// - [`RobError::InsufficientData`] when there are no sentences.
    /// - [`RobError::RowCountMismatch`] when `labels` disagrees with `sentences`.
    /// - Any vectorizer or trainer error.
    pub fn train_category(
        &mut self,
        category: &str,
        sentences: &[String],
        labels: &[bool],
        trainer: &dyn Trainer,
    ) -> Result<()> {
        if sentences.is_empty() {
            return Err(RobError::InsufficientData {
                stage: "sentence relevance".to_string(),
                category: category.to_string(),
            });
        }
        if sentences.len() != labels.len() {
            return Err(RobError::rows(
                format!("sentence labels of '{category}'"),
                sentences.len(),
                labels.len(),
            ));
        }

        let relevant = labels.iter().filter(|&&l| l).count();
        if relevant == 0 {
            warn!(category, "no training sentence labelled relevant");
        }

        let model = SentenceModel::train(sentences, labels, self.config, self.low_threshold, trainer)?;
        info!(
            category,
            sentences = sentences.len(),
            relevant,
            retained = model.vectorizer.masks().get("").map_or(0, |m| m.len()),
            "trained sentence model"
        );
        self.models.insert(category.to_string(), model);
        Ok(())
    }

    /// Whether `category` has a trained model.
    #[must_use]
    pub fn has_model(&self, category: &str) -> bool {
        self.models.contains_key(category)
    }

    /// Model of `category`.
    #[must_use]
    pub fn model(&self, category: &str) -> Option<&SentenceModel> {
        self.models.get(category)
    }

    /// Sentences of `document` predicted relevant to `category`, in order.
    ///
    /// May be empty.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::NotFitted`] if `category` has no model.
    pub fn predict_relevant_sentences(&self, document: &str, category: &str) -> Result<Vec<String>> {
        let model = self
            .models
            .get(category)
            .ok_or_else(|| RobError::NotFitted(format!("sentence model for '{category}'")))?;
        let sentences = self.segmenter.segment(document);
        if sentences.is_empty() {
            return Ok(sentences);
        }
        let relevant = model.predict(&sentences)?;
        Ok(sentences
            .into_iter()
            .zip(relevant)
            .filter_map(|(s, keep)| keep.then_some(s))
            .collect())
    }

    /// Relevant sentences of `document` joined by single spaces.
    ///
    /// # Errors
    ///
    /// See [`Self::predict_relevant_sentences`].
    pub fn pseudo_document(&self, document: &str, category: &str) -> Result<String> {
        Ok(self.predict_relevant_sentences(document, category)?.join(" "))
    }

    /// Pseudo-document of every row, each filtered by its own category.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::RowCountMismatch`] if the slices differ in length,
    /// or any [`Self::pseudo_document`] error.
    pub fn pseudo_documents<S: AsRef<str>, C: AsRef<str>>(
        &self,
        documents: &[S],
        categories: &[C],
    ) -> Result<Vec<String>> {
        if documents.len() != categories.len() {
            return Err(RobError::rows("pseudo-document categories", documents.len(), categories.len()));
        }
        let pseudo = documents
            .iter()
            .zip(categories)
            .map(|(d, c)| self.pseudo_document(d.as_ref(), c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            documents = pseudo.len(),
            empty = pseudo.iter().filter(|p| p.is_empty()).count(),
            "derived pseudo-documents"
        );
        Ok(pseudo)
    }
}

#[cfg(test)]
mod tests;
