// =========================================================================
// FALSIFY-KF: KFold splitting used by the grid search
//
// References:
//   - Stone (1974) "Cross-Validatory Choice and Assessment of Predictions"
// =========================================================================

use super::*;
use std::collections::HashSet;

/// FALSIFY-KF-001: Unshuffled folds are consecutive, larger folds first
#[test]
fn falsify_kf_001_consecutive_folds() {
    let splits = KFold::new(3).split(7);
    let tests: Vec<Vec<usize>> = splits.into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        tests,
        vec![vec![0, 1, 2], vec![3, 4], vec![5, 6]],
        "FALSIFIED KF-001: test folds {tests:?}"
    );
}

/// FALSIFY-KF-002: Train and test sets are disjoint and cover every row
#[test]
fn falsify_kf_002_partition() {
    for (fold_idx, (train, test)) in KFold::new(4).split(17).iter().enumerate() {
        let train_set: HashSet<usize> = train.iter().copied().collect();
        let test_set: HashSet<usize> = test.iter().copied().collect();
        assert!(
            train_set.is_disjoint(&test_set),
            "FALSIFIED KF-002: fold {fold_idx} overlaps"
        );
        assert_eq!(
            train_set.len() + test_set.len(),
            17,
            "FALSIFIED KF-002: fold {fold_idx} misses rows"
        );
    }
}

/// FALSIFY-KF-003: A seeded shuffle is reproducible
#[test]
fn falsify_kf_003_seeded_shuffle_reproducible() {
    let a = KFold::new(3).with_random_state(7).split(12);
    let b = KFold::new(3).with_random_state(7).split(12);
    assert_eq!(a, b, "FALSIFIED KF-003: same seed, different folds");
}

mod kf_proptest_falsify {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// FALSIFY-KF-004-prop: Every row lands in exactly one test fold
        #[test]
        fn falsify_kf_004_prop_sample_coverage(
            k in 2..=5usize,
            n in 5..=30usize,
            seed in proptest::option::of(any::<u64>()),
        ) {
            let mut kfold = KFold::new(k);
            if let Some(seed) = seed {
                kfold = kfold.with_random_state(seed);
            }
            let splits = kfold.split(n);
            prop_assert_eq!(splits.len(), k);

            let mut test_counts = vec![0usize; n];
            for (_train, test) in &splits {
                for &idx in test {
                    test_counts[idx] += 1;
                }
            }
            for (i, &count) in test_counts.iter().enumerate() {
                prop_assert_eq!(
                    count, 1,
                    "FALSIFIED KF-004-prop: row {} appeared {} times",
                    i, count
                );
            }
        }
    }
}
