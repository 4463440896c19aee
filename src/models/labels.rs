//! Shared sentiment vocabulary across heterogeneous model outputs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label after normalization.
///
/// Models emit different spellings ("LABEL_0", "NEG", "negative"); voting only
/// works once they share this vocabulary. Unknown labels pass through as
/// [`SentimentLabel::Other`] so an unfamiliar model never crashes a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Other(String),
}

impl SentimentLabel {
    /// Map a model-specific label onto the shared vocabulary.
    ///
    /// Case-insensitive and total.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "positive" | "pos" | "label_2" => SentimentLabel::Positive,
            "negative" | "neg" | "label_0" => SentimentLabel::Negative,
            "neutral" | "label_1" => SentimentLabel::Neutral,
            _ => SentimentLabel::Other(capitalize_first(raw)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Other(label) => label,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SentimentLabel> for String {
    fn from(label: SentimentLabel) -> Self {
        label.as_str().to_string()
    }
}

impl From<String> for SentimentLabel {
    fn from(raw: String) -> Self {
        SentimentLabel::normalize(&raw)
    }
}

/// Upper-case the first character, leave the rest unchanged.
fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vocabularies() {
        assert_eq!(SentimentLabel::normalize("POSITIVE"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::normalize("pos"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::normalize("LABEL_2"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::normalize("Neg"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::normalize("neutral"), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::normalize("Label_1"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_0_case_insensitive() {
        assert_eq!(
            SentimentLabel::normalize("LABEL_0"),
            SentimentLabel::normalize("label_0")
        );
        assert_eq!(SentimentLabel::normalize("LABEL_0").as_str(), "Negative");
    }

    #[test]
    fn test_unknown_label_passthrough() {
        assert_eq!(
            SentimentLabel::normalize("mixed_FEELINGS"),
            SentimentLabel::Other("Mixed_FEELINGS".to_string())
        );
        assert_eq!(SentimentLabel::normalize("LABEL_3").as_str(), "LABEL_3");
        assert_eq!(SentimentLabel::normalize("").as_str(), "");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&SentimentLabel::Positive).unwrap();
        assert_eq!(json, "\"Positive\"");

        let label: SentimentLabel = serde_json::from_str("\"neg\"").unwrap();
        assert_eq!(label, SentimentLabel::Negative);
    }
}
