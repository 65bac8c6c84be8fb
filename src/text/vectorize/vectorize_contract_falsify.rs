//! Vectorization contract tests.
//!
//! Each test tries to falsify one claim about the hashing engine:
//!   - VEC-001: hashing is deterministic and folds into `0..n_features`
//!   - VEC-002: fit-then-finalize equals a transform-only replay
//!   - VEC-003: pruning keeps exactly the columns meeting the threshold
//!   - VEC-004: gated rows contribute the all-zero vector
//!   - VEC-005: row order is preserved across staged groups
//!   - VEC-006: empty pseudo-documents are ordinary all-zero rows
//!   - VEC-007: the sparsity pattern does not depend on the width chosen
//!   - VEC-008: cross-group collisions are possible and tolerated

pub(crate) use super::*;
use crate::config::HashingConfig;
use crate::error::{ErrorKind, RobError};
use crate::primitives::{SparseMatrix, SparseRow};
use proptest::prelude::*;

fn vectorizer(n_features: usize, max_n: usize) -> ModularVectorizer {
    ModularVectorizer::new(HashingConfig::new(n_features).with_ngram_range(1, max_n))
        .expect("valid config")
}

/// Pairwise row-overlap sizes: invariant under any collision-free re-hashing.
fn overlap_pattern(m: &SparseMatrix) -> Vec<Vec<usize>> {
    (0..m.n_rows())
        .map(|i| {
            (0..m.n_rows())
                .map(|j| {
                    m.row(i)
                        .columns()
                        .iter()
                        .filter(|&&c| m.row(j).contains(c))
                        .count()
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// VEC-001: determinism and range
// ============================================================================

#[test]
fn falsify_vec_001_hash_index_is_pinned() {
    // Pinned values: any change to the hash or the fold breaks saved masks.
    for _ in 0..3 {
        assert_eq!(
            hash_index("risk", "", 1024),
            446,
            "FALSIFIED VEC-001: hash of 'risk' drifted"
        );
        assert_eq!(hash_index("randomization", "", 1024), 186);
    }
}

proptest! {
    #[test]
    fn falsify_vec_001_hash_index_stable_and_in_range(
        token in "[a-z ]{0,24}",
        prefix in "[a-z-]{0,8}",
        log2 in 4u32..27,
    ) {
        let n = 1usize << log2;
        let first = hash_index(&token, &prefix, n);
        let second = hash_index(&token, &prefix, n);
        prop_assert_eq!(first, second);
        prop_assert!((first as usize) < n);
    }

    #[test]
    fn falsify_vec_005_row_order_preserved(
        docs in proptest::collection::vec(
            proptest::collection::vec(
                prop::sample::select(vec!["risk", "bias", "low", "high", "unclear", "blinded"]),
                0..6,
            ),
            1..8,
        )
    ) {
        let docs: Vec<String> = docs.iter().map(|words| words.join(" ")).collect();
        let mut vec = vectorizer(1 << 12, 2);
        // Threshold 1 keeps every occupied column. Guard against the
        // all-empty corpus, which is a configuration error by contract.
        let any_tokens = docs.iter().any(|d| !d.trim().is_empty());
        let staged = vec
            .stage(&docs, GroupSpec::base().with_low_threshold(1))
            .and_then(|()| vec.stage(&docs, GroupSpec::new("x-").with_low_threshold(1)));
        prop_assert_eq!(staged.is_ok(), any_tokens);
        if any_tokens {
            let x = vec.finalize().expect("aligned groups");
            prop_assert_eq!(x.n_rows(), docs.len());
            for (i, doc) in docs.iter().enumerate() {
                let expected = vec.space().vectorize(doc, "").union(&vec.space().vectorize(doc, "x-"));
                prop_assert_eq!(x.row(i), &expected);
            }
        }
    }
}

// ============================================================================
// VEC-002: fit/transform consistency
// ============================================================================

#[test]
fn falsify_vec_002_fit_equals_replay() {
    let docs = [
        "sealed opaque envelopes were used",
        "computer generated random sequence",
        "allocation was not concealed",
        "sealed envelopes and random sequence",
    ];
    let gate = vec![true, false, true, true];
    let sentences = ["sealed opaque envelopes", "", "not concealed", "sealed envelopes"];

    let mut vec = vectorizer(1 << 14, 2);
    vec.stage(&docs, GroupSpec::base().with_low_threshold(2))
        .expect("fit base");
    vec.stage(
        &docs,
        GroupSpec::new("ac-i-")
            .with_inclusion_mask(gate.clone())
            .with_low_threshold(1),
    )
    .expect("fit interaction");
    vec.stage(&sentences, GroupSpec::new("-s-").with_low_threshold(1))
        .expect("fit sentences");
    let fitted = vec.finalize().expect("finalize fit");

    vec.reset();
    vec.stage(&docs, GroupSpec::base()).expect("replay base");
    vec.stage(&docs, GroupSpec::new("ac-i-").with_inclusion_mask(gate))
        .expect("replay interaction");
    vec.stage(&sentences, GroupSpec::new("-s-"))
        .expect("replay sentences");
    let replayed = vec.finalize().expect("finalize replay");

    assert_eq!(
        fitted, replayed,
        "FALSIFIED VEC-002: transform-only replay differs from fit"
    );
}

// ============================================================================
// VEC-003: pruning correctness
// ============================================================================

#[test]
fn falsify_vec_003_threshold_two_keeps_a_and_b() {
    // counts: a = 2, b = 2, c = 1
    let docs = ["a b c", "a b"];
    let mut vec = vectorizer(1024, 1);
    vec.stage(&docs, GroupSpec::base().with_low_threshold(2))
        .expect("fit");

    let mask = vec.masks().get("").expect("mask stored under base prefix");
    let a = hash_index("a", "", 1024);
    let b = hash_index("b", "", 1024);
    let c = hash_index("c", "", 1024);
    assert!(mask.contains(a), "FALSIFIED VEC-003: 'a' pruned");
    assert!(mask.contains(b), "FALSIFIED VEC-003: 'b' pruned");
    assert!(!mask.contains(c), "FALSIFIED VEC-003: 'c' kept");
    assert_eq!(mask.len(), 2);

    let x = vec.finalize().expect("finalize");
    assert!(!x.row(0).contains(c));
}

#[test]
fn falsify_vec_003_threshold_three_is_configuration_error() {
    let docs = ["a b c", "a b"];
    let mut vec = vectorizer(1024, 1);
    let err = vec
        .stage(&docs, GroupSpec::base().with_low_threshold(3))
        .unwrap_err();
    assert!(
        matches!(err, RobError::EmptyFeatureSpace { low_threshold: 3, .. }),
        "FALSIFIED VEC-003: expected EmptyFeatureSpace, got {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!vec.masks().contains(""), "failed fit must not store a mask");
}

#[test]
fn falsify_vec_003_filter_direct() {
    let rows = SparseMatrix::from_rows(
        1024,
        vec![
            SparseRow::from_columns([434, 509, 417]),
            SparseRow::from_columns([434, 509]),
        ],
    )
    .expect("valid");
    let mask = FrequencyFilter::new(2)
        .expect("valid")
        .fit("", &rows)
        .expect("two columns survive");
    assert_eq!(mask.retained(), &[434, 509]);
}

// ============================================================================
// VEC-004: gated interaction zeroing
// ============================================================================

#[test]
fn falsify_vec_004_gated_row_is_zero() {
    let docs = ["risk of bias is low", "randomization was adequate", "bias unclear here"];
    let mut vec = vectorizer(1024, 2);
    vec.stage(
        &docs,
        GroupSpec::new("d-i-")
            .with_inclusion_mask(vec![true, false, true])
            .with_low_threshold(1),
    )
    .expect("fit");

    let group = &vec.staged()[0];
    assert!(
        group.rows.row(1).is_empty(),
        "FALSIFIED VEC-004: gated document has {} active columns",
        group.rows.row(1).nnz()
    );
    assert!(!group.rows.row(0).is_empty());
    assert!(!group.rows.row(2).is_empty());

    // The gated document's tokens never reached the mask either.
    let adequate = hash_index("adequate", "d-i-", 1024);
    assert!(!vec.masks().get("d-i-").expect("mask").contains(adequate));
}

#[test]
fn falsify_vec_004_all_gated_group_is_empty_feature_space() {
    let docs = ["a", "b"];
    let mut vec = vectorizer(1024, 1);
    let err = vec
        .stage(
            &docs,
            GroupSpec::new("d-i-")
                .with_inclusion_mask(vec![false, false])
                .with_low_threshold(1),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ============================================================================
// VEC-005: row order (fixed example)
// ============================================================================

#[test]
fn falsify_vec_005_rows_align_across_groups() {
    let docs = ["a", "b", "c"];
    let mut vec = vectorizer(1024, 1);
    vec.stage(&docs, GroupSpec::base().with_low_threshold(1))
        .expect("fit");
    vec.stage(&docs, GroupSpec::new("x-").with_low_threshold(1))
        .expect("fit");
    let x = vec.finalize().expect("finalize");

    for (i, token) in docs.iter().enumerate() {
        let expected = SparseRow::from_columns([
            hash_index(token, "", 1024),
            hash_index(token, "x-", 1024),
        ]);
        assert_eq!(x.row(i), &expected, "FALSIFIED VEC-005: row {i} misaligned");
    }
}

// ============================================================================
// VEC-006: empty pseudo-documents
// ============================================================================

#[test]
fn falsify_vec_006_empty_pseudo_document_is_zero_row() {
    let docs = ["sequence was random", "open label", "random envelopes"];
    let pseudo = ["sequence was random", "", "random envelopes"];
    let mut vec = vectorizer(1024, 2);
    vec.stage(&docs, GroupSpec::base().with_low_threshold(1))
        .expect("fit base");
    vec.stage(&pseudo, GroupSpec::new("-s-").with_low_threshold(1))
        .expect("fit sentences");
    assert!(vec.staged()[1].rows.row(1).is_empty());

    let x = vec.finalize().expect("finalize");
    let base_only = vec.space().vectorize("open label", "");
    assert_eq!(x.row(1), &base_only);

    // Transform with every pseudo-document empty still works.
    vec.reset();
    vec.stage(&docs, GroupSpec::base()).expect("replay base");
    vec.stage(&["", "", ""], GroupSpec::new("-s-"))
        .expect("empty pseudo-documents are valid input");
    assert_eq!(vec.finalize().expect("finalize").n_rows(), 3);
}

// ============================================================================
// VEC-007: end-to-end scenario
// ============================================================================

#[test]
fn falsify_vec_007_end_to_end() {
    let docs = ["risk of bias is low", "randomization was adequate", "bias unclear here"];

    let mut vec = vectorizer(1024, 1);
    let x_fit = vec.fit_transform(&docs, 1).expect("fit");
    let x_transform = vec.transform(&docs).expect("transform");
    assert_eq!(x_fit, x_transform, "FALSIFIED VEC-007: fit != transform");

    assert_eq!(x_fit.shape(), (3, 1024));
    assert_eq!(x_fit.row(0).nnz(), 5);
    assert_eq!(x_fit.row(1).nnz(), 3);
    assert_eq!(x_fit.row(2).nnz(), 3);
    // "bias" is the only shared token.
    assert_eq!(x_fit.column_counts().get(&117), Some(&2));

    let mut wider = vectorizer(2048, 1);
    let x_wide_fit = wider.fit_transform(&docs, 1).expect("fit");
    let x_wide = wider.transform(&docs).expect("transform");
    assert_eq!(x_wide_fit, x_wide);
    assert_eq!(
        overlap_pattern(&x_fit),
        overlap_pattern(&x_wide),
        "FALSIFIED VEC-007: sparsity pattern depends on n_features"
    );
}

// ============================================================================
// VEC-008: collisions
// ============================================================================

#[test]
fn falsify_vec_008_prefix_separates_groups_but_cannot_guarantee_it() {
    // Prefixing moves a token to a different column in a realistic space...
    assert_ne!(hash_index("bias", "", 1024), hash_index("bias", "-s-", 1024));

    // ...but in a narrow space distinct group tokens can still coincide, and
    // the overlay silently ORs them into one column.
    let base = hash_index("adequate", "", 16);
    let other = hash_index("unclear", "", 16);
    assert_eq!(base, other);

    let mut vec = vectorizer(16, 1);
    vec.stage(&["adequate"], GroupSpec::base().with_low_threshold(1))
        .expect("fit");
    vec.stage(&["unclear"], GroupSpec::new("").with_low_threshold(1))
        .expect("refit of the same prefix is allowed");
    let x = vec.finalize().expect("collisions are not errors");
    assert_eq!(x.row(0).columns(), &[base]);
}
