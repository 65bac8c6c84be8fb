use super::*;
use crate::error::ErrorKind;
use crate::primitives::SparseMatrix;
use crate::text::sentence::RuleBasedSegmenter;
use std::collections::BTreeSet;

// Positive when a row has a column seen only in positive training rows.
struct Memorizer {
    columns: BTreeSet<u32>,
}

impl BinaryClassifier for Memorizer {
    fn fit(&mut self, x: &SparseMatrix, y: &[bool]) -> Result<()> {
        let mut pos = BTreeSet::new();
        let mut neg = BTreeSet::new();
        for (row, &label) in x.rows().iter().zip(y) {
            let target = if label { &mut pos } else { &mut neg };
            target.extend(row.columns().iter().copied());
        }
        self.columns = pos.difference(&neg).copied().collect();
        Ok(())
    }

    fn decision_function(&self, x: &SparseMatrix) -> Result<Vec<f64>> {
        Ok(x
            .rows()
            .iter()
            .map(|r| {
                if r.columns().iter().any(|c| self.columns.contains(c)) {
                    1.0
                } else {
                    -1.0
                }
            })
            .collect())
    }
}

struct MemorizingTrainer;

impl Trainer for MemorizingTrainer {
    fn train(&self, x: &SparseMatrix, y: &[bool]) -> Result<Box<dyn BinaryClassifier>> {
        let mut model = Memorizer {
            columns: BTreeSet::new(),
        };
        model.fit(x, y)?;
        Ok(Box::new(model))
    }
}

fn cascade() -> CascadedSentenceFilter {
    CascadedSentenceFilter::new(
        HashingConfig::new(1 << 16).with_ngram_range(1, 1),
        1,
        Box::new(RuleBasedSegmenter::new()),
    )
    .expect("valid config")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn trained() -> CascadedSentenceFilter {
    let mut c = cascade();
    c.train_category(
        "Random sequence generation",
        &strings(&["Randomised by computer.", "Outcome data complete."]),
        &[true, false],
        &MemorizingTrainer,
    )
    .expect("train");
    c
}

#[test]
fn test_relevant_sentences_keep_order() {
    let c = trained();
    let relevant = c
        .predict_relevant_sentences(
            "Patients randomised by computer. Nothing else reported. It was by computer.",
            "Random sequence generation",
        )
        .expect("predict");
    assert_eq!(
        relevant,
        vec!["Patients randomised by computer.", "It was by computer."]
    );
}

#[test]
fn test_pseudo_document_joins_with_spaces() {
    let c = trained();
    let pseudo = c
        .pseudo_document(
            "Randomised by computer. Nothing else reported. By computer.",
            "Random sequence generation",
        )
        .expect("predict");
    assert_eq!(pseudo, "Randomised by computer. By computer.");
}

#[test]
fn test_no_relevant_sentence_gives_empty_pseudo_document() {
    let c = trained();
    let pseudo = c
        .pseudo_document("Nothing else reported.", "Random sequence generation")
        .expect("predict");
    assert!(pseudo.is_empty());

    let blank = c
        .pseudo_document("   ", "Random sequence generation")
        .expect("predict");
    assert!(blank.is_empty());
}

#[test]
fn test_no_training_sentences_is_insufficient_data() {
    let mut c = cascade();
    let err = c
        .train_category("Selective reporting", &[], &[], &MemorizingTrainer)
        .expect_err("empty");
    assert_eq!(err.kind(), ErrorKind::DataSufficiency);
    assert!(!c.has_model("Selective reporting"));
}

#[test]
fn test_label_count_mismatch() {
    let mut c = cascade();
    let err = c
        .train_category("x", &strings(&["a b"]), &[true, false], &MemorizingTrainer)
        .expect_err("rows");
    assert_eq!(err.kind(), ErrorKind::Alignment);
}

#[test]
fn test_untrained_category() {
    let c = trained();
    let err = c
        .predict_relevant_sentences("Anything.", "Allocation concealment")
        .expect_err("no model");
    assert!(matches!(err, RobError::NotFitted(_)));
}

#[test]
fn test_categories_use_their_own_masks() {
    let mut c = trained();
    c.train_category(
        "Allocation concealment",
        &strings(&["Sealed envelopes.", "Allocation was concealed."]),
        &[true, false],
        &MemorizingTrainer,
    )
    .expect("train");

    let doc = "Randomised by computer. Sealed envelopes.";
    assert_eq!(
        c.pseudo_document(doc, "Random sequence generation").expect("rsg"),
        "Randomised by computer."
    );
    assert_eq!(
        c.pseudo_document(doc, "Allocation concealment").expect("ac"),
        "Sealed envelopes."
    );
    assert!(c
        .model("Allocation concealment")
        .expect("trained")
        .vectorizer()
        .masks()
        .contains(""));
}

#[test]
fn test_pseudo_documents_per_row_category() {
    let c = trained();
    let docs = strings(&["Randomised by computer. Other.", "Nothing."]);
    let cats = ["Random sequence generation", "Random sequence generation"];
    let pseudo = c.pseudo_documents(&docs, &cats).expect("rows");
    assert_eq!(pseudo, vec!["Randomised by computer.".to_string(), String::new()]);

    let err = c.pseudo_documents(&docs, &cats[..1]).expect_err("rows");
    assert_eq!(err.kind(), ErrorKind::Alignment);
}

#[test]
fn test_zero_threshold_rejected() {
    let err = CascadedSentenceFilter::new(
        HashingConfig::new(1 << 16),
        0,
        Box::new(RuleBasedSegmenter::new()),
    )
    .expect_err("zero threshold");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
