//! Text normalization applied before any model sees the input.
//!
//! Pretrained sentiment models react differently to contraction forms and to
//! repeated punctuation, so every request is cleaned the same way before it
//! fans out to the ensemble.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Negation contractions and their expansions.
pub const NEGATION_CONTRACTIONS: [(&str, &str); 16] = [
    ("don't", "do not"),
    ("doesn't", "does not"),
    ("didn't", "did not"),
    ("won't", "will not"),
    ("wouldn't", "would not"),
    ("can't", "can not"),
    ("cannot", "can not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
    ("wasn't", "was not"),
    ("weren't", "were not"),
    ("haven't", "have not"),
    ("hasn't", "has not"),
    ("hadn't", "had not"),
    ("shouldn't", "should not"),
    ("couldn't", "could not"),
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static EXCLAMATIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").expect("valid regex"));
static QUESTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").expect("valid regex"));
static PERIODS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").expect("valid regex"));

// Accepts both the ASCII and the typographic apostrophe.
static CONTRACTIONS: Lazy<Regex> = Lazy::new(|| {
    let alternation = NEGATION_CONTRACTIONS
        .iter()
        .map(|(contraction, _)| contraction.replace('\'', "['\u{2019}]"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("valid regex")
});

/// Deterministic text cleaner shared by every model in the ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize text: whitespace, then contractions, then punctuation.
    ///
    /// The result is a fixed point: normalizing it again changes nothing.
    pub fn normalize(&self, text: &str) -> String {
        let collapsed = WHITESPACE.replace_all(text, " ");
        let expanded = CONTRACTIONS.replace_all(collapsed.trim(), |caps: &Captures| {
            expand_contraction(&caps[0])
        });

        let text = EXCLAMATIONS.replace_all(&expanded, "!");
        let text = QUESTIONS.replace_all(&text, "?");
        PERIODS.replace_all(&text, "...").into_owned()
    }
}

/// Expand one matched contraction, following the casing of the match.
fn expand_contraction(matched: &str) -> String {
    let key = matched.to_lowercase().replace('\u{2019}', "'");
    let expansion = NEGATION_CONTRACTIONS
        .iter()
        .find(|(contraction, _)| *contraction == key)
        .map(|(_, expansion)| *expansion)
        .unwrap_or(matched);

    let letters: Vec<char> = matched.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        expansion.to_uppercase()
    } else if matched.chars().next().is_some_and(char::is_uppercase) {
        capitalize(expansion)
    } else {
        expansion.to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
