//! Multi-model inference engine for sentiment classification

use crate::config::AppConfig;
use crate::error::ClassifyError;
use crate::models::aggregator::VoteAggregator;
use crate::models::loader::ModelLoader;
use crate::models::pool::{ModelPool, PrimaryStatus};
use crate::normalizer::TextNormalizer;
use crate::types::prediction::{EnsembleResult, NormalizedPrediction};
use crate::types::record::SentimentRecord;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Outcome of one model for one request
#[derive(Debug, Clone)]
pub struct ModelOutcome {
    /// Model name
    pub model: String,
    /// Normalized vote, or the reason the model was excluded
    pub result: std::result::Result<NormalizedPrediction, String>,
}

/// Result of model inference
#[derive(Debug, Clone)]
pub struct PredictionResult {
    /// Ensemble answer
    pub ensemble: EnsembleResult,
    /// Per-model outcomes in invocation order
    pub outcomes: Vec<ModelOutcome>,
}

impl PredictionResult {
    /// Votes that took part in the ensemble
    pub fn predictions(&self) -> Vec<NormalizedPrediction> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect()
    }

    /// Names of models excluded from this request
    pub fn failed_models(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.model.as_str())
            .collect()
    }

    /// Whether every participating model voted for the same label
    pub fn is_unanimous(&self) -> bool {
        let mut labels = self.outcomes.iter().filter_map(|o| o.result.as_ref().ok());
        match labels.next() {
            Some(first) => labels.all(|p| p.label == first.label),
            None => false,
        }
    }

    /// Convert to a log record for the submitted text
    pub fn to_record(&self, text: &str) -> SentimentRecord {
        SentimentRecord::new(
            text.to_string(),
            self.ensemble.label.to_string(),
            self.ensemble.confidence,
        )
    }
}

/// Normalizer, model pool and aggregator wired together
pub struct InferenceEngine {
    normalizer: TextNormalizer,
    pool: ModelPool,
    aggregator: VoteAggregator,
    closed: AtomicBool,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut loader = ModelLoader::from_config(&config.models);
        let pool = ModelPool::load(&config.models.entries, &mut loader)?;

        info!(
            models = ?pool.model_names(),
            primary = ?pool.primary_model(),
            degraded = pool.is_degraded(),
            "Inference engine initialized"
        );

        Ok(Self::from_pool(pool))
    }

    /// Create an inference engine over an already loaded pool
    pub fn from_pool(pool: ModelPool) -> Self {
        Self {
            normalizer: TextNormalizer::new(),
            pool,
            aggregator: VoteAggregator::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Classify text, returning only the ensemble answer
    pub fn classify(&self, text: &str) -> std::result::Result<EnsembleResult, ClassifyError> {
        self.predict(text).map(|p| p.ensemble)
    }

    /// Normalize the text, run every model, and vote
    pub fn predict(&self, text: &str) -> std::result::Result<PredictionResult, ClassifyError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClassifyError::ShuttingDown);
        }
        if self.pool.is_empty() {
            return Err(ClassifyError::NoModelAvailable);
        }

        let normalized = self.normalizer.normalize(text);
        let outcomes = self.run_models(&normalized);

        let predictions: Vec<NormalizedPrediction> = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().cloned())
            .collect();

        let ensemble = self
            .aggregator
            .aggregate(&predictions)
            .ok_or(ClassifyError::AllModelsFailed {
                attempted: outcomes.len(),
            })?;

        debug!(
            label = %ensemble.label,
            confidence = ensemble.confidence,
            votes = predictions.len(),
            models = outcomes.len(),
            "Ensemble inference complete"
        );

        Ok(PredictionResult { ensemble, outcomes })
    }

    /// Run every model sequentially on already-normalized text
    fn run_models(&self, text: &str) -> Vec<ModelOutcome> {
        self.pool
            .entries()
            .iter()
            .map(|entry| {
                let result = entry
                    .model
                    .predict(text)
                    .and_then(|raw| {
                        if raw.score.is_finite() && (0.0..=1.0).contains(&raw.score) {
                            Ok(raw.normalize())
                        } else {
                            Err(anyhow::anyhow!("score {} outside [0, 1]", raw.score))
                        }
                    })
                    .map_err(|e| {
                        error!(model = %entry.name, error = %e, "Model inference failed");
                        e.to_string()
                    });

                ModelOutcome {
                    model: entry.name.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Get the number of loaded models
    pub fn model_count(&self) -> usize {
        self.pool.len()
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        self.pool.model_names()
    }

    pub fn primary_model(&self) -> Option<&str> {
        self.pool.primary_model()
    }

    pub fn primary_status(&self) -> PrimaryStatus {
        self.pool.primary_status()
    }

    pub fn is_degraded(&self) -> bool {
        self.pool.is_degraded()
    }

    /// Stop accepting requests; later calls fail with `ShuttingDown`
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Inference engine closed to new requests");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close and release the model pool
    pub fn shutdown(self) {
        self.close();
        self.pool.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::models::labels::SentimentLabel;
    use crate::models::SentimentModel;
    use crate::types::prediction::RawPrediction;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    enum Behaviour {
        Answer(&'static str, f64),
        Fail,
    }

    struct ScriptedModel {
        behaviour: Behaviour,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl SentimentModel for ScriptedModel {
        fn predict(&self, text: &str) -> anyhow::Result<RawPrediction> {
            self.seen.lock().unwrap().push(text.to_string());
            match self.behaviour {
                Behaviour::Answer(label, score) => Ok(RawPrediction::new(label, score)),
                Behaviour::Fail => Err(anyhow!("model crashed")),
            }
        }
    }

    fn engine(models: Vec<(&'static str, Behaviour)>) -> (InferenceEngine, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let configs: Vec<ModelConfig> = models.iter().map(|(n, _)| ModelConfig::lexicon(n)).collect();
        let mut behaviours: Vec<Behaviour> = models.into_iter().map(|(_, b)| b).collect();
        behaviours.reverse();

        let pool = ModelPool::load_with(&configs, |_| {
            let behaviour = behaviours.pop().ok_or_else(|| anyhow!("no behaviour"))?;
            Ok(Box::new(ScriptedModel {
                behaviour,
                seen: seen.clone(),
            }) as Box<dyn SentimentModel>)
        })
        .unwrap();

        (InferenceEngine::from_pool(pool), seen)
    }

    #[test]
    fn test_single_model_unchanged() {
        let (engine, _) = engine(vec![("only", Behaviour::Answer("LABEL_1", 0.64))]);
        let result = engine.classify("meh").unwrap();

        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence, 0.64);
    }

    #[test]
    fn test_unanimous_across_vocabularies() {
        let (engine, _) = engine(vec![
            ("distilbert", Behaviour::Answer("POSITIVE", 0.8)),
            ("roberta", Behaviour::Answer("LABEL_2", 0.9)),
        ]);
        let prediction = engine.predict("love it").unwrap();

        assert_eq!(prediction.ensemble.label, SentimentLabel::Positive);
        assert!((prediction.ensemble.confidence - 0.935).abs() < 1e-9);
        assert!(prediction.is_unanimous());
    }

    #[test]
    fn test_split_vote() {
        let (engine, _) = engine(vec![
            ("a", Behaviour::Answer("positive", 0.9)),
            ("b", Behaviour::Answer("negative", 0.95)),
            ("c", Behaviour::Answer("pos", 0.6)),
        ]);
        let prediction = engine.predict("it's complicated").unwrap();

        assert_eq!(prediction.ensemble.label, SentimentLabel::Positive);
        assert!((prediction.ensemble.confidence - 0.75).abs() < 1e-9);
        assert!(!prediction.is_unanimous());
    }

    #[test]
    fn test_partial_failure_tolerated() {
        let (engine, _) = engine(vec![
            ("broken", Behaviour::Fail),
            ("working", Behaviour::Answer("neg", 0.7)),
        ]);
        let prediction = engine.predict("awful").unwrap();

        assert_eq!(prediction.ensemble.label, SentimentLabel::Negative);
        assert_eq!(prediction.ensemble.confidence, 0.7);
        assert_eq!(prediction.failed_models(), vec!["broken"]);
        assert_eq!(prediction.predictions().len(), 1);
    }

    #[test]
    fn test_all_models_failed() {
        let (engine, _) = engine(vec![("a", Behaviour::Fail), ("b", Behaviour::Fail)]);

        assert_eq!(
            engine.classify("anything"),
            Err(ClassifyError::AllModelsFailed { attempted: 2 })
        );
    }

    #[test]
    fn test_invalid_score_excluded() {
        let (engine, _) = engine(vec![
            ("overconfident", Behaviour::Answer("positive", 1.7)),
            ("nan", Behaviour::Answer("positive", f64::NAN)),
            ("sane", Behaviour::Answer("negative", 0.6)),
        ]);
        let prediction = engine.predict("hmm").unwrap();

        assert_eq!(prediction.ensemble.label, SentimentLabel::Negative);
        assert_eq!(prediction.failed_models(), vec!["overconfident", "nan"]);
    }

    #[test]
    fn test_models_see_normalized_text() {
        let (engine, seen) = engine(vec![
            ("a", Behaviour::Answer("positive", 0.9)),
            ("b", Behaviour::Answer("positive", 0.9)),
        ]);
        engine.classify("  I   can't believe it!!! ").unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|t| t == "I can not believe it!"));
    }

    #[test]
    fn test_closed_engine_rejects() {
        let (engine, _) = engine(vec![("a", Behaviour::Answer("positive", 0.9))]);
        engine.close();

        assert!(engine.is_closed());
        assert_eq!(engine.classify("hi"), Err(ClassifyError::ShuttingDown));
        engine.shutdown();
    }

    #[test]
    fn test_engine_from_default_config() {
        let engine = InferenceEngine::new(&AppConfig::default()).unwrap();

        assert_eq!(engine.model_names(), vec!["lexicon"]);
        assert_eq!(engine.primary_status(), PrimaryStatus::Loaded);

        let result = engine.classify("This is not good at all").unwrap();
        assert_eq!(result.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_record_from_prediction() {
        let (engine, _) = engine(vec![("a", Behaviour::Answer("positive", 0.9))]);
        let prediction = engine.predict("great").unwrap();
        let record = prediction.to_record("great");

        assert_eq!(record.text, "great");
        assert_eq!(record.label, "Positive");
        assert_eq!(record.confidence, 0.9);
    }
}
