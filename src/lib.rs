//! Sentiment Ensemble Service Library
//!
//! Classifies short text as Positive, Negative or Neutral by running every
//! loaded model on normalized input and combining their answers with
//! confidence-weighted voting.

pub mod api;
pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod models;
pub mod normalizer;
pub mod producer;
pub mod service;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{ClassifyError, PoolError, ValidationError};
pub use models::inference::InferenceEngine;
pub use models::labels::SentimentLabel;
pub use normalizer::TextNormalizer;
pub use service::SentimentService;
pub use types::{EnsembleResult, SentimentRecord};
