//! Request log record published after each successful classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// Unique record identifier
    pub record_id: String,

    /// Text as submitted by the caller
    pub text: String,

    /// Final label
    pub label: String,

    /// Final confidence (0.0 - 1.0)
    pub confidence: f64,

    /// Classification timestamp
    pub timestamp: DateTime<Utc>,
}

impl SentimentRecord {
    /// Create a new record stamped with the current time
    pub fn new(text: String, label: String, confidence: f64) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            text,
            label,
            confidence,
            timestamp: Utc::now(),
        }
    }
}
