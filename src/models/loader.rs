//! Model loader: turns a model configuration into a ready backend

use crate::config::{ModelConfig, ModelKind, ModelsConfig};
use crate::models::lexicon::LexiconModel;
use crate::models::onnx::OnnxSentimentModel;
use crate::models::SentimentModel;
use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

/// Loader for ensemble members
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Token limit per input
    max_sequence_length: usize,
    /// ONNX Runtime is initialized on the first ONNX model
    runtime_ready: bool,
}

impl ModelLoader {
    /// Create a loader with the given ONNX settings
    pub fn new(onnx_threads: usize, max_sequence_length: usize) -> Self {
        Self {
            onnx_threads,
            max_sequence_length,
            runtime_ready: false,
        }
    }

    /// Create a loader from the models section of the configuration
    pub fn from_config(config: &ModelsConfig) -> Self {
        Self::new(config.onnx_threads, config.max_sequence_length)
    }

    /// Load a single model
    pub fn load_model(&mut self, config: &ModelConfig) -> Result<Box<dyn SentimentModel>> {
        match config.kind {
            ModelKind::Lexicon => {
                info!(model = %config.name, "Lexicon model ready");
                Ok(Box::new(LexiconModel::new()))
            }
            ModelKind::Onnx => {
                let path = config
                    .path
                    .as_deref()
                    .ok_or_else(|| anyhow!("ONNX model {} has no path configured", config.name))?;

                if !Path::new(path).is_dir() {
                    anyhow::bail!("Model directory not found: {}", path);
                }

                self.init_runtime()?;
                let model = OnnxSentimentModel::load(
                    path,
                    &config.name,
                    self.onnx_threads,
                    self.max_sequence_length,
                )?;
                Ok(Box::new(model))
            }
        }
    }

    fn init_runtime(&mut self) -> Result<()> {
        if !self.runtime_ready {
            ort::init().with_name("sentiment-ensemble").commit()?;
            info!(onnx_threads = self.onnx_threads, "ONNX Runtime initialized");
            self.runtime_ready = true;
        }
        Ok(())
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(1, 512)
    }
}
