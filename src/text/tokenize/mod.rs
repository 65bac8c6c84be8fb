//! N-gram extraction over whitespace tokens.
//!
//! N-grams are joined with a single space, so the bigram of `"low"` and
//! `"risk"` is `"low risk"`. A document's n-grams form a set: repeating a
//! phrase never adds weight.

use std::collections::BTreeSet;

/// Extracts the set of n-grams of `tokens` with lengths in `min_n..=max_n`.
///
/// # Examples
///
/// ```
/// use robclass::text::tokenize::ngrams;
///
/// let tokens = ["risk", "of", "bias"];
/// let grams = ngrams(&tokens, (1, 2));
/// assert_eq!(grams.len(), 5);
/// assert!(grams.contains("of bias"));
/// ```
#[must_use]
pub fn ngrams<S: AsRef<str>>(tokens: &[S], (min_n, max_n): (usize, usize)) -> BTreeSet<String> {
    let mut grams = BTreeSet::new();
    for n in min_n.max(1)..=max_n {
        for window in tokens.windows(n) {
            let gram = window
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .join(" ");
            grams.insert(gram);
        }
    }
    grams
}

/// Whitespace-tokenizes `text` (optionally lowercased) and extracts its n-gram set.
///
/// Pure function of its inputs.
#[must_use]
pub fn extract_ngrams(text: &str, ngram_range: (usize, usize), lowercase: bool) -> BTreeSet<String> {
    if lowercase {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        ngrams(&tokens, ngram_range)
    } else {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        ngrams(&tokens, ngram_range)
    }
}
