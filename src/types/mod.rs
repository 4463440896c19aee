//! Type definitions for the sentiment service

pub mod prediction;
pub mod record;
pub mod request;

pub use prediction::{EnsembleResult, NormalizedPrediction, RawPrediction};
pub use record::SentimentRecord;
pub use request::{AnalyzeRequest, AnalyzeResponse};
