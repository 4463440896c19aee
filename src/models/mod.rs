//! Sentiment model backends and the ensemble built from them

pub mod aggregator;
pub mod inference;
pub mod labels;
pub mod lexicon;
pub mod loader;
pub mod onnx;
pub mod pool;

pub use aggregator::VoteAggregator;
pub use inference::InferenceEngine;
pub use labels::SentimentLabel;
pub use loader::ModelLoader;
pub use pool::{ModelEntry, ModelPool};

use crate::types::prediction::RawPrediction;

/// A loaded classifier: text in, label and score out.
///
/// This is all the ensemble needs from a backend, so any classifier that
/// satisfies it can join the pool.
pub trait SentimentModel: Send + Sync {
    fn predict(&self, text: &str) -> anyhow::Result<RawPrediction>;
}
