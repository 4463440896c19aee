//! Classification request/response payloads

use crate::error::ValidationError;
use crate::types::prediction::EnsembleResult;
use serde::{Deserialize, Serialize};

/// Text to classify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Reject empty (or whitespace-only) text and text over `max_len` characters.
    pub fn validate(&self, max_len: usize) -> Result<&str, ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let len = self.text.chars().count();
        if len > max_len {
            return Err(ValidationError::TooLong { len, max: max_len });
        }

        Ok(&self.text)
    }
}

/// Final label and confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub label: String,
    pub confidence: f64,
}

impl From<&EnsembleResult> for AnalyzeResponse {
    fn from(result: &EnsembleResult) -> Self {
        Self {
            label: result.label.to_string(),
            confidence: result.confidence,
        }
    }
}

/// Failure reply on the NATS request path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
