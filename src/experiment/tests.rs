use super::*;
use crate::classification::{FixedTrainer, SgdParams};
use crate::config::{HashingConfig, Thresholds};
use crate::error::ErrorKind;
use crate::text::sentence::RuleBasedSegmenter;

const RSG: &str = "Random sequence generation";
const AC: &str = "Allocation concealment";

const CORPUS: &str = r#"[
  { "id": "t1", "text": "Patients were randomised by computer. Sealed envelopes were used.",
    "assessments": [ { "Random sequence generation": { "low_risk": true, "quotes": ["randomised by computer"] },
                       "Allocation concealment": { "low_risk": true, "quotes": ["sealed envelopes"] } } ] },
  { "id": "t2", "text": "Allocation was alternate. Envelopes were not described.",
    "assessments": [ { "Random sequence generation": { "low_risk": false, "quotes": ["allocation was alternate"] },
                       "Allocation concealment": { "low_risk": false, "quotes": ["envelopes were not described"] } } ] },
  { "id": "h1", "text": "A computer randomised the order. Sealed envelopes concealed allocation.",
    "assessments": [ { "Random sequence generation": { "low_risk": true }, "Allocation concealment": { "low_risk": true } },
                     { "Random sequence generation": { "low_risk": true }, "Allocation concealment": { "low_risk": false } } ] },
  { "id": "h2", "text": "Alternate allocation was used. Nothing about concealment.",
    "assessments": [ { "Random sequence generation": { "low_risk": false }, "Allocation concealment": { "low_risk": false } },
                     { "Random sequence generation": { "low_risk": false }, "Allocation concealment": { "low_risk": false } } ] }
]"#;

fn small_config() -> ExperimentConfig {
    let space = HashingConfig::new(1 << 16);
    ExperimentConfig {
        categories: vec![RSG.to_string(), AC.to_string()],
        document_features: space,
        basic_features: space,
        sentence_features: space,
        thresholds: Thresholds {
            base: 1,
            interaction: 1,
            sentence_group: 1,
            sentence_model: 1,
            basic: 1,
        },
        ..ExperimentConfig::default()
    }
}

fn sgd() -> Trainers {
    Trainers::uniform(Arc::new(FixedTrainer::new(SgdParams {
        max_iter: 10,
        ..SgdParams::default()
    })))
}

#[test]
fn test_interaction_prefix() {
    assert_eq!(interaction_prefix(AC), "Allocation concealment-i-");
}

#[test]
fn test_experiment_kind_names() {
    assert_eq!(ExperimentKind::Basic.to_string(), "basic");
    assert_eq!(ExperimentKind::default(), ExperimentKind::Hybrid);
    let kind: ExperimentKind = serde_json::from_str("\"basic\"").expect("de");
    assert_eq!(kind, ExperimentKind::Basic);
}

#[test]
fn test_grid_search_trainers_from_default_config() {
    assert!(Trainers::grid_search(&ExperimentConfig::default()).is_ok());
}

#[test]
fn test_basic_experiment_writes_three_tables() {
    let corpus = JsonCorpus::from_json(CORPUS).expect("corpus");
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("results");

    let outcome = run_basic_experiment(&corpus, &small_config(), &sgd(), &out).expect("run");

    assert_eq!(outcome.written.len(), 3);
    for name in ["model.csv", "stupid-baseline.csv", "human-performance.csv"] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
    assert_eq!(outcome.model.records().len(), 2);
    assert!(outcome.masks.contains(RSG));
    assert!(outcome.masks.contains(AC));
}

#[test]
fn test_baseline_and_human_scores() {
    let corpus = JsonCorpus::from_json(CORPUS).expect("corpus");
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = run_basic_experiment(&corpus, &small_config(), &sgd(), dir.path()).expect("run");

    let baseline = &outcome.baseline.records()[0];
    assert_eq!(baseline.category, RSG);
    assert_eq!((baseline.true_pos, baseline.false_pos), (1, 1));
    assert!((baseline.recall - 1.0).abs() < 1e-12);

    let human_rsg = &outcome.human.records()[0];
    assert!((human_rsg.accuracy - 1.0).abs() < 1e-12);
    let human_ac = &outcome.human.records()[1];
    assert_eq!(human_ac.false_neg, 1);
}

#[test]
fn test_hybrid_experiment_runs_with_sgd() {
    let corpus = JsonCorpus::from_json(CORPUS).expect("corpus");
    let dir = tempfile::tempdir().expect("tempdir");
    let outcome = run_experiment(
        ExperimentKind::Hybrid,
        &corpus,
        &small_config(),
        &sgd(),
        Box::new(RuleBasedSegmenter::new()),
        dir.path(),
    )
    .expect("run");

    assert_eq!(outcome.model.records().len(), 2);
    assert!(outcome.masks.contains(""));
    assert!(outcome.masks.contains(&interaction_prefix(RSG)));
    assert!(outcome.masks.contains(&interaction_prefix(AC)));
    assert!(outcome.masks.contains(SENTENCE_PREFIX));
}

#[test]
fn test_category_without_training_documents() {
    let corpus = JsonCorpus::from_json(CORPUS).expect("corpus");
    let mut config = small_config();
    config.categories.push("Selective reporting".to_string());
    let dir = tempfile::tempdir().expect("tempdir");

    let err = run_basic_experiment(&corpus, &config, &sgd(), dir.path()).expect_err("no data");
    assert_eq!(err.kind(), ErrorKind::DataSufficiency);
}

#[test]
fn test_hybrid_category_without_sentences() {
    let corpus = JsonCorpus::from_json(CORPUS).expect("corpus");
    let mut config = small_config();
    config.categories.push("Selective reporting".to_string());
    let dir = tempfile::tempdir().expect("tempdir");

    let err = run_hybrid_experiment(
        &corpus,
        &config,
        &sgd(),
        Box::new(RuleBasedSegmenter::new()),
        dir.path(),
    )
    .expect_err("no sentences");
    match err {
        RobError::InsufficientData { stage, category } => {
            assert_eq!(stage, "sentence relevance");
            assert_eq!(category, "Selective reporting");
        }
        other => panic!("unexpected error: {other}"),
    }
}
