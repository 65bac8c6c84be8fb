//! Rule-based sentence segmentation.
//!
//! Segmentation is deterministic and holds no learned state. A boundary is
//! placed after `.`, `!` or `?` (plus any closing quotes or brackets) when
//! whitespace follows and the next sentence starts with an uppercase letter,
//! a digit or an opening bracket/quote. Periods ending a known abbreviation
//! or a single-letter initial never end a sentence.

/// Splits text into an ordered sequence of sentences.
pub trait SentenceSegmenter: Send + Sync {
    /// Sentences of `text` in original order, trimmed, without empties.
    fn segment(&self, text: &str) -> Vec<String>;
}

const CLOSERS: [char; 6] = ['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];
const OPENERS: [char; 4] = ['(', '[', '"', '\u{201c}'];

const DEFAULT_ABBREVIATIONS: [&str; 22] = [
    "al.", "approx.", "ca.", "cf.", "dr.", "e.g.", "eq.", "fig.", "figs.", "i.e.", "jr.",
    "mr.", "mrs.", "ms.", "no.", "prof.", "ref.", "refs.", "st.", "tab.", "vol.", "vs.",
];

/// Punctuation-driven segmenter with an abbreviation list.
///
/// # Examples
///
/// ```
/// use robclass::text::sentence::{RuleBasedSegmenter, SentenceSegmenter};
///
/// let segmenter = RuleBasedSegmenter::new();
/// let sentences = segmenter.segment("Smith et al. randomised 40 patients. Allocation was concealed.");
/// assert_eq!(
///     sentences,
///     vec!["Smith et al. randomised 40 patients.", "Allocation was concealed."]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RuleBasedSegmenter {
    abbreviations: Vec<String>,
}

impl Default for RuleBasedSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedSegmenter {
    /// Segmenter with the default abbreviation list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Adds abbreviations (case-insensitive, including the trailing period).
    #[must_use]
    pub fn with_abbreviations(mut self, extra: &[&str]) -> Self {
        self.abbreviations
            .extend(extra.iter().map(|a| a.to_lowercase()));
        self
    }

    /// Whether the last word of `segment` (which ends in a period) is an
    /// abbreviation or an initial.
    fn ends_with_abbreviation(&self, segment: &str) -> bool {
        let word = segment
            .split_whitespace()
            .last()
            .unwrap_or("")
            .trim_start_matches(|c: char| OPENERS.contains(&c))
            .to_lowercase();
        let mut chars = word.chars();
        let is_initial = matches!(
            (chars.next(), chars.next(), chars.next()),
            (Some(c), Some('.'), None) if c.is_alphabetic()
        );
        is_initial || self.abbreviations.iter().any(|a| *a == word)
    }
}

fn starts_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || OPENERS.contains(&c)
}

impl SentenceSegmenter for RuleBasedSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let byte_at = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);

        let mut sentences = Vec::new();
        let mut push = |s: &str| {
            let s = s.trim();
            if !s.is_empty() {
                sentences.push(s.to_string());
            }
        };

        let mut start = 0;
        let mut i = 0;
        while i < chars.len() {
            let (byte, c) = chars[i];
            if !matches!(c, '.' | '!' | '?') {
                i += 1;
                continue;
            }

            let mut end = i + 1;
            while end < chars.len() && CLOSERS.contains(&chars[end].1) {
                end += 1;
            }
            let mut next = end;
            while next < chars.len() && chars[next].1.is_whitespace() {
                next += 1;
            }

            let boundary = next > end
                && next < chars.len()
                && starts_sentence(chars[next].1)
                && !(c == '.' && self.ends_with_abbreviation(&text[start..byte + 1]));

            if boundary {
                push(&text[start..byte_at(end)]);
                start = byte_at(next);
                i = next;
            } else {
                i = end;
            }
        }
        push(&text[start..]);
        sentences
    }
}
