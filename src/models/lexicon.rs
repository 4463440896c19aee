//! Word-list sentiment scorer
//!
//! Needs no model files, so it always loads. Useful as a default
//! configuration and as a fallback member of the ensemble.

use super::SentimentModel;
use crate::types::prediction::RawPrediction;
use anyhow::Result;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "best", "brilliant", "excellent", "exceptional", "fantastic",
    "good", "great", "happy", "impressive", "incredible", "love", "loved", "nice",
    "outstanding", "perfect", "pleased", "recommend", "recommended", "superb", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "broken", "buggy", "disappointed", "disappointing", "hate", "hated",
    "horrible", "poor", "sad", "terrible", "useless", "waste", "worse", "worst", "wrong",
];

const NEGATORS: &[&str] = &["not", "no", "never", "hardly"];

/// Lexicon-based sentiment model emitting `pos` / `neg` / `neutral`.
pub struct LexiconModel {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negators: HashSet<&'static str>,
}

impl LexiconModel {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negators: NEGATORS.iter().copied().collect(),
        }
    }

    /// Count positive and negative hits; a negator flips the next hit.
    fn score_tokens(&self, text: &str) -> (u32, u32) {
        let mut positive = 0;
        let mut negative = 0;
        let mut negated = false;

        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();

            if self.negators.contains(token.as_str()) {
                negated = true;
                continue;
            }

            let polarity = if self.positive.contains(token.as_str()) {
                Some(true)
            } else if self.negative.contains(token.as_str()) {
                Some(false)
            } else {
                None
            };

            if let Some(is_positive) = polarity {
                if is_positive != negated {
                    positive += 1;
                } else {
                    negative += 1;
                }
                negated = false;
            }
        }

        (positive, negative)
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentModel for LexiconModel {
    fn predict(&self, text: &str) -> Result<RawPrediction> {
        let (positive, negative) = self.score_tokens(text);
        let total = positive + negative;

        if total == 0 || positive == negative {
            return Ok(RawPrediction::new("neutral", 0.5));
        }

        // Margin of the dominant side, mapped into [0.5, 0.95]
        let margin = (positive as f64 - negative as f64).abs() / total as f64;
        let score = 0.5 + 0.45 * margin;

        let label = if positive > negative { "pos" } else { "neg" };
        Ok(RawPrediction::new(label, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_text() {
        let model = LexiconModel::new();
        let prediction = model.predict("I love this, it is great").unwrap();

        assert_eq!(prediction.raw_label, "pos");
        assert!((prediction.score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_negation_flips() {
        let model = LexiconModel::new();
        let prediction = model.predict("This is not good").unwrap();

        assert_eq!(prediction.raw_label, "neg");
    }

    #[test]
    fn test_mixed_text() {
        let model = LexiconModel::new();
        let prediction = model.predict("Great screen, terrible battery, awful support").unwrap();

        // one positive vs two negative
        assert_eq!(prediction.raw_label, "neg");
        assert!((prediction.score - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_no_sentiment_words() {
        let model = LexiconModel::new();
        let prediction = model.predict("The package arrived on Tuesday").unwrap();

        assert_eq!(prediction.raw_label, "neutral");
        assert_eq!(prediction.score, 0.5);
    }
}
