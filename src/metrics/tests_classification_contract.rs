// =========================================================================
// FALSIFY-MC: binary classification metrics and results recorder
//
// Each test names the property it tries to falsify; a failure message starts
// with "FALSIFIED MC-NNN".
// =========================================================================

use super::*;
use crate::error::{ErrorKind, RobError};

/// FALSIFY-MC-001: Every ratio ∈ [0, 1]
#[test]
fn falsify_mc_001_ratios_bounded() {
    let c = BinaryConfusion::from_predictions(
        &[true, false, true, true, false],
        &[true, true, false, true, false],
    )
    .expect("same length");

    for (name, v) in [
        ("precision", c.precision()),
        ("recall", c.recall()),
        ("f1", c.f1()),
        ("accuracy", c.accuracy()),
    ] {
        assert!((0.0..=1.0).contains(&v), "FALSIFIED MC-001: {name}={v} not in [0, 1]");
    }
}

/// FALSIFY-MC-002: Perfect predictions → every ratio = 1.0
#[test]
fn falsify_mc_002_perfect_predictions() {
    let y = [true, false, true, false];
    let c = BinaryConfusion::from_predictions(&y, &y).expect("same length");
    assert_eq!(c.precision(), 1.0, "FALSIFIED MC-002: precision");
    assert_eq!(c.recall(), 1.0, "FALSIFIED MC-002: recall");
    assert_eq!(c.f1(), 1.0, "FALSIFIED MC-002: f1");
    assert_eq!(c.accuracy(), 1.0, "FALSIFIED MC-002: accuracy");
}

/// FALSIFY-MC-003: No predicted positives → precision 0, not NaN
#[test]
fn falsify_mc_003_zero_denominators() {
    let c = BinaryConfusion::from_predictions(&[false, false], &[true, false]).expect("same length");
    assert_eq!(c.precision(), 0.0, "FALSIFIED MC-003: precision={}", c.precision());
    assert_eq!(c.f1(), 0.0, "FALSIFIED MC-003: f1={}", c.f1());
    assert!((c.accuracy() - 0.5).abs() < 1e-12);
}

/// FALSIFY-MC-004: Length disagreement is an alignment error
#[test]
fn falsify_mc_004_length_mismatch() {
    let err = BinaryConfusion::from_predictions(&[true], &[true, false]).expect_err("lengths");
    assert_eq!(err.kind(), ErrorKind::Alignment, "FALSIFIED MC-004: {err}");
}

/// FALSIFY-MC-005: Recorder rejects categories it was not built with
#[test]
fn falsify_mc_005_unregistered_category() {
    let mut recorder = BinaryMetricsRecorder::new(["Selective reporting"]);
    let err = recorder
        .add_preds_test(&[true], &[true], "Other bias")
        .expect_err("unregistered");
    assert!(matches!(err, RobError::Corpus(_)), "FALSIFIED MC-005: {err}");
    assert!(recorder.records().is_empty());
}

/// FALSIFY-MC-006: Mean row macro-averages ratios and sums counts
#[test]
fn falsify_mc_006_mean_row() {
    let mut recorder = BinaryMetricsRecorder::new(["a", "b"]);
    recorder.add_preds_test(&[true, true], &[true, true], "a").expect("a");
    recorder.add_preds_test(&[false, false], &[true, true], "b").expect("b");

    let mean = recorder.mean().expect("two records");
    assert_eq!(mean.category, "mean");
    assert_eq!(mean.n, 4, "FALSIFIED MC-006: n={}", mean.n);
    assert!((mean.recall - 0.5).abs() < 1e-12, "FALSIFIED MC-006: recall={}", mean.recall);
}

/// FALSIFY-MC-007: CSV has a header, one line per record, then the mean
#[test]
fn falsify_mc_007_csv_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(results_filename("model"));

    let mut recorder = BinaryMetricsRecorder::new(["a", "b"]);
    recorder.add_preds_test(&[true], &[true], "a").expect("a");
    recorder.add_preds_test(&[false], &[true], "b").expect("b");
    recorder.save_csv(&path).expect("save");

    let text = std::fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "category,n,true_pos,false_pos,false_neg,true_neg,precision,recall,f1,accuracy",
        "FALSIFIED MC-007: header={}",
        lines[0]
    );
    assert_eq!(lines.len(), 4, "FALSIFIED MC-007: {} lines", lines.len());
    assert!(lines[1].starts_with("a,1,1,0,0,0,"));
    assert!(lines[3].starts_with("mean,2,"));
}

/// FALSIFY-MC-008: an empty recorder still writes a parseable table
#[test]
fn falsify_mc_008_empty_recorder_writes_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(results_filename("empty"));

    BinaryMetricsRecorder::new(["a"]).save_csv(&path).expect("save");

    let text = std::fs::read_to_string(&path).expect("read back");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![CSV_HEADER.join(",")], "FALSIFIED MC-008: {text:?}");

    let mut reader = csv::Reader::from_path(&path).expect("parseable");
    assert_eq!(reader.headers().expect("header").len(), CSV_HEADER.len());
    assert_eq!(reader.records().count(), 0);
}

#[test]
fn test_results_filename() {
    assert_eq!(results_filename("human-performance"), "human-performance.csv");
}
