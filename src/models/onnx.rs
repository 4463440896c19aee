//! Pretrained transformer classifier exported to ONNX
//!
//! A model directory holds three files:
//! - `model.onnx`: sequence-classification graph producing logits
//! - `tokenizer.json`: HuggingFace tokenizer
//! - `config.json`: optional, its `id2label` table names the logit indices

use super::SentimentModel;
use crate::types::prediction::RawPrediction;
use anyhow::{anyhow, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const CONFIG_FILE: &str = "config.json";

/// The part of a HuggingFace `config.json` we care about
#[derive(Debug, Deserialize)]
struct ClassifierConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// ONNX Runtime backed sentiment classifier
pub struct OnnxSentimentModel {
    /// Model name
    name: String,
    /// ONNX Runtime session; running it needs exclusive access
    session: Mutex<Session>,
    /// Tokenizer with truncation configured
    tokenizer: Tokenizer,
    /// Label for each logit index
    labels: Vec<String>,
    /// Output holding the logits
    output_name: String,
    /// Whether the graph declares a `token_type_ids` input (BERT-style)
    uses_token_type_ids: bool,
}

impl OnnxSentimentModel {
    /// Load a model directory.
    pub fn load<P: AsRef<Path>>(
        dir: P,
        name: &str,
        onnx_threads: usize,
        max_sequence_length: usize,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);

        if !model_path.exists() {
            anyhow::bail!("Model file not found: {}", model_path.display());
        }

        info!(model = %name, path = %dir.display(), threads = onnx_threads, "Loading ONNX model");

        let mut tokenizer = Tokenizer::from_file(dir.join(TOKENIZER_FILE))
            .map_err(|e| anyhow!("Failed to load tokenizer for {}: {}", name, e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let labels = load_labels(&dir.join(CONFIG_FILE))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(&model_path)
            .context(format!("Failed to load model from {:?}", model_path))?;

        let uses_token_type_ids = session.inputs.iter().any(|i| i.name == "token_type_ids");

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("logits"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "logits".to_string());

        info!(
            model = %name,
            output = %output_name,
            labels = ?labels,
            token_type_ids = uses_token_type_ids,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            tokenizer,
            labels,
            output_name,
            uses_token_type_ids,
        })
    }

    fn label_for(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index))
    }
}

impl SentimentModel for OnnxSentimentModel {
    fn predict(&self, text: &str) -> Result<RawPrediction> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        let as_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
        let shape = vec![1_i64, encoding.get_ids().len() as i64];

        let input_ids = Tensor::from_array((shape.clone(), as_i64(encoding.get_ids())))
            .context("Failed to create input_ids tensor")?;
        let attention_mask = Tensor::from_array((shape.clone(), as_i64(encoding.get_attention_mask())))
            .context("Failed to create attention_mask tensor")?;

        let logits: Vec<f32> = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow!("Lock error: {}", e))?;

            let outputs = if self.uses_token_type_ids {
                let token_type_ids = Tensor::from_array((shape, as_i64(encoding.get_type_ids())))
                    .context("Failed to create token_type_ids tensor")?;
                session.run(ort::inputs![
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask,
                    "token_type_ids" => token_type_ids
                ])?
            } else {
                session.run(ort::inputs![
                    "input_ids" => input_ids,
                    "attention_mask" => attention_mask
                ])?
            };

            let output = outputs
                .get(self.output_name.as_str())
                .ok_or_else(|| anyhow!("Model output {} missing", self.output_name))?;
            let (_, data) = output.try_extract_tensor::<f32>()?;
            data.to_vec()
        };

        let (index, probability) = softmax_argmax(&logits)
            .ok_or_else(|| anyhow!("Model {} returned no logits", self.name))?;

        let raw_label = self.label_for(index);
        debug!(model = %self.name, label = %raw_label, score = probability, "ONNX prediction");

        Ok(RawPrediction::new(raw_label, probability as f64))
    }
}

/// Read `id2label` into an index-ordered label list. A missing file yields
/// an empty list, and indices then fall back to `LABEL_<i>`.
fn load_labels(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ClassifierConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    labels_from_id2label(&config.id2label)
}

fn labels_from_id2label(id2label: &HashMap<String, String>) -> Result<Vec<String>> {
    let mut indexed = id2label
        .iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|i| (i, label.clone()))
                .with_context(|| format!("Invalid id2label key: {}", id))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    let size = indexed.last().map(|(i, _)| i + 1).unwrap_or(0);
    let mut labels: Vec<String> = (0..size).map(|i| format!("LABEL_{}", i)).collect();
    for (i, label) in indexed {
        labels[i] = label;
    }

    Ok(labels)
}

/// Numerically stable softmax; returns the winning index and its probability.
fn softmax_argmax(logits: &[f32]) -> Option<(usize, f32)> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max_logit).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, &e)| (i, e / sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_argmax() {
        let (index, probability) = softmax_argmax(&[-1.2, 3.4]).unwrap();
        assert_eq!(index, 1);
        assert!(probability > 0.98 && probability < 1.0);

        let (index, probability) = softmax_argmax(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(index, 0);
        assert!((probability - 1.0 / 3.0).abs() < 1e-6);

        assert!(softmax_argmax(&[]).is_none());
    }

    #[test]
    fn test_labels_from_id2label() {
        let mut id2label = HashMap::new();
        id2label.insert("1".to_string(), "POSITIVE".to_string());
        id2label.insert("0".to_string(), "NEGATIVE".to_string());

        let labels = labels_from_id2label(&id2label).unwrap();
        assert_eq!(labels, vec!["NEGATIVE", "POSITIVE"]);
    }

    #[test]
    fn test_labels_with_gap() {
        let mut id2label = HashMap::new();
        id2label.insert("2".to_string(), "positive".to_string());

        let labels = labels_from_id2label(&id2label).unwrap();
        assert_eq!(labels, vec!["LABEL_0", "LABEL_1", "positive"]);
    }

    #[test]
    fn test_missing_model_dir() {
        let result = OnnxSentimentModel::load("/nonexistent/sentiment-model", "missing", 1, 512);
        assert!(result.is_err());
    }
}
