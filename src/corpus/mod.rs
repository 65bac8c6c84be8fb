//! Labelled risk-of-bias corpus.
//!
//! Each document carries one assessment per independent human review
//! ("instance"). Instance 0 always exists; instance 1 only for documents
//! assessed twice, which are held out to compare the model with humans.
//!
//! # File format
//!
//! ```json
//! [
//!   {
//!     "id": "12345",
//!     "text": "Patients were randomised by computer ...",
//!     "assessments": [
//!       { "Random sequence generation": { "low_risk": true, "quotes": ["randomised by computer"] } }
//!     ]
//!   }
//! ]
//! ```

use crate::error::{Result, RobError};
use crate::text::sentence::SentenceSegmenter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// One reviewer's verdict on one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    /// Judged at low risk of bias
    pub low_risk: bool,
    /// Supporting text quoted by the reviewer
    #[serde(default)]
    pub quotes: Vec<String>,
}

/// Judgements of one review, keyed by category.
pub type Assessment = BTreeMap<String, Judgement>;

/// A study report and its reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusDocument {
    /// Stable identifier
    pub id: String,
    /// Full text
    pub text: String,
    /// Reviews, in instance order
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl CorpusDocument {
    /// Judgement for `category` at `instance`, if that review judged it.
    #[must_use]
    pub fn judgement(&self, instance: usize, category: &str) -> Option<&Judgement> {
        self.assessments.get(instance)?.get(category)
    }
}

/// Documents with their labels, in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelledTexts {
    /// Document texts
    pub texts: Vec<String>,
    /// `low_risk` (documents) or relevance (sentences)
    pub labels: Vec<bool>,
}

/// One row per (document, judged category).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultitaskRows {
    /// Document text of each row
    pub texts: Vec<String>,
    /// `low_risk` of each row
    pub labels: Vec<bool>,
    /// Category each row is judged on
    pub categories: Vec<String>,
}

impl MultitaskRows {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when no row was produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Per-row flags: does the row belong to `category`?
    #[must_use]
    pub fn membership(&self, category: &str) -> Vec<bool> {
        self.categories.iter().map(|c| c == category).collect()
    }
}

/// Document-level access to a labelled corpus.
pub trait CorpusProvider {
    /// Ids with a review at `instance`; with `filter_category`, only those
    /// whose review at `instance` judged that category.
    fn get_ids(&self, instance: usize, filter_category: Option<&str>) -> BTreeSet<String>;

    /// Texts and `low_risk` labels of `ids` judged on `category` at `instance`.
    fn xy(&self, ids: &BTreeSet<String>, category: &str, instance: usize) -> LabelledTexts;

    /// Ids reviewed once: everything at instance 0 not also at instance 1.
    fn training_ids(&self) -> BTreeSet<String> {
        let double = self.get_ids(1, None);
        self.get_ids(0, None)
            .into_iter()
            .filter(|id| !double.contains(id))
            .collect()
    }

    /// Ids judged on `category` by two reviews.
    fn test_ids(&self, category: &str) -> BTreeSet<String> {
        let second = self.get_ids(1, Some(category));
        self.get_ids(0, Some(category))
            .into_iter()
            .filter(|id| second.contains(id))
            .collect()
    }
}

/// In-memory corpus read from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct JsonCorpus {
    documents: BTreeMap<String, CorpusDocument>,
}

impl JsonCorpus {
    /// Builds a corpus from parsed documents.
    ///
    /// # Errors
    ///
    /// Returns [`RobError::Corpus`] if two documents share an id.
    pub fn from_documents(documents: Vec<CorpusDocument>) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for doc in documents {
            let id = doc.id.clone();
            if by_id.insert(id.clone(), doc).is_some() {
                return Err(RobError::Corpus(format!("duplicate document id '{id}'")));
            }
        }
        Ok(Self { documents: by_id })
    }

    /// Parses a JSON array of documents.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or duplicate ids.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_documents(serde_json::from_str(json)?)
    }

    /// Loads a corpus file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let corpus = Self::from_documents(serde_json::from_reader(reader)?)?;
        info!(
            path = %path.display(),
            documents = corpus.len(),
            double_assessed = corpus.get_ids(1, None).len(),
            "loaded corpus"
        );
        Ok(corpus)
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True for an empty corpus.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Document by id.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<&CorpusDocument> {
        self.documents.get(id)
    }

    /// Rows of every judged category in `categories` for `ids` at `instance`.
    ///
    /// Rows follow id order, then the order of `categories`.
    #[must_use]
    pub fn multitask_xyi(
        &self,
        ids: &BTreeSet<String>,
        instance: usize,
        categories: &[String],
    ) -> MultitaskRows {
        let mut rows = MultitaskRows::default();
        for doc in ids.iter().filter_map(|id| self.documents.get(id)) {
            for category in categories {
                if let Some(j) = doc.judgement(instance, category) {
                    rows.texts.push(doc.text.clone());
                    rows.labels.push(j.low_risk);
                    rows.categories.push(category.clone());
                }
            }
        }
        rows
    }

    /// Ids whose first review quotes supporting text for `category`.
    #[must_use]
    pub fn sentence_ids(&self, category: &str) -> BTreeSet<String> {
        self.documents
            .values()
            .filter(|d| d.judgement(0, category).is_some_and(|j| !j.quotes.is_empty()))
            .map(|d| d.id.clone())
            .collect()
    }

    /// Sentence rows of `ids` for `category`.
    ///
    /// Every sentence of a document with quotes becomes a row, labelled
    /// relevant when it overlaps one of the quotes.
    #[must_use]
    pub fn sentence_xy(
        &self,
        ids: &BTreeSet<String>,
        category: &str,
        segmenter: &dyn SentenceSegmenter,
    ) -> LabelledTexts {
        let mut out = LabelledTexts::default();
        for doc in ids.iter().filter_map(|id| self.documents.get(id)) {
            let Some(j) = doc.judgement(0, category) else {
                continue;
            };
            if j.quotes.is_empty() {
                continue;
            }
            let quotes: Vec<String> = j.quotes.iter().map(|q| normalize(q)).collect();
            for sentence in segmenter.segment(&doc.text) {
                let label = overlaps(&normalize(&sentence), &quotes);
                out.texts.push(sentence);
                out.labels.push(label);
            }
        }
        out
    }
}

impl CorpusProvider for JsonCorpus {
    fn get_ids(&self, instance: usize, filter_category: Option<&str>) -> BTreeSet<String> {
        self.documents
            .values()
            .filter(|d| match (d.assessments.get(instance), filter_category) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(a), Some(c)) => a.contains_key(c),
            })
            .map(|d| d.id.clone())
            .collect()
    }

    fn xy(&self, ids: &BTreeSet<String>, category: &str, instance: usize) -> LabelledTexts {
        let mut out = LabelledTexts::default();
        for doc in ids.iter().filter_map(|id| self.documents.get(id)) {
            if let Some(j) = doc.judgement(instance, category) {
                out.texts.push(doc.text.clone());
                out.labels.push(j.low_risk);
            }
        }
        out
    }
}

/// Lowercase with whitespace runs collapsed to one space.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn overlaps(sentence: &str, quotes: &[String]) -> bool {
    !sentence.is_empty()
        && quotes
            .iter()
            .any(|q| !q.is_empty() && (sentence.contains(q.as_str()) || q.contains(sentence)))
}
