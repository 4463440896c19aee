//! Prediction data structures flowing through the ensemble

use crate::models::labels::SentimentLabel;
use serde::{Deserialize, Serialize};

/// Output of one model for one text, in the model's own vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Model-specific label ("LABEL_0", "POSITIVE", "neg", ...)
    pub raw_label: String,
    /// Model's self-reported confidence (0.0 - 1.0)
    pub score: f64,
}

impl RawPrediction {
    pub fn new(raw_label: impl Into<String>, score: f64) -> Self {
        Self {
            raw_label: raw_label.into(),
            score,
        }
    }

    /// Map onto the shared vocabulary.
    pub fn normalize(&self) -> NormalizedPrediction {
        NormalizedPrediction {
            label: SentimentLabel::normalize(&self.raw_label),
            confidence: self.score,
        }
    }
}

/// One model's vote after label normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPrediction {
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl NormalizedPrediction {
    pub fn new(label: SentimentLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Final answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Winning label
    pub label: SentimentLabel,
    /// Final confidence after voting and the unanimity bonus
    pub confidence: f64,
}
