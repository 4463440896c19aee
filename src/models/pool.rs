//! Model pool: the set of ensemble members loaded at startup

use crate::config::ModelConfig;
use crate::error::PoolError;
use crate::models::loader::ModelLoader;
use crate::models::SentimentModel;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// A loaded ensemble member
pub struct ModelEntry {
    /// Unique model name
    pub name: String,
    /// Loaded backend
    pub model: Box<dyn SentimentModel>,
    /// Whether this is the designated primary model
    pub is_primary: bool,
}

/// Outcome of loading the designated primary model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryStatus {
    /// No model was marked primary
    NotConfigured,
    Loaded,
    /// The primary failed to load; the service runs degraded
    Failed,
}

/// Loaded models in configuration order.
///
/// Built once, read-only afterwards, so it can be shared across concurrent
/// requests without locking.
pub struct ModelPool {
    entries: Vec<ModelEntry>,
    primary_status: PrimaryStatus,
}

impl ModelPool {
    /// Load every configured model with the given loader.
    pub fn load(configs: &[ModelConfig], loader: &mut ModelLoader) -> Result<Self, PoolError> {
        Self::load_with(configs, |config| loader.load_model(config))
    }

    /// Load every configured model in order using `load_model`.
    ///
    /// A model that fails to load is skipped. When that model is the primary,
    /// loading still continues but the pool is marked degraded. Only an empty
    /// result is fatal.
    pub fn load_with<F>(configs: &[ModelConfig], mut load_model: F) -> Result<Self, PoolError>
    where
        F: FnMut(&ModelConfig) -> anyhow::Result<Box<dyn SentimentModel>>,
    {
        let mut entries = Vec::with_capacity(configs.len());
        let mut seen = HashSet::new();
        let mut primary_status = PrimaryStatus::NotConfigured;

        for config in configs {
            if !seen.insert(config.name.as_str()) {
                warn!(model = %config.name, "Duplicate model name, skipping");
                continue;
            }

            let is_primary = config.primary && primary_status == PrimaryStatus::NotConfigured;
            if config.primary && !is_primary {
                warn!(model = %config.name, "Another model is already primary, loading as secondary");
            }

            match load_model(config) {
                Ok(model) => {
                    if is_primary {
                        primary_status = PrimaryStatus::Loaded;
                    }
                    entries.push(ModelEntry {
                        name: config.name.clone(),
                        model,
                        is_primary,
                    });
                }
                Err(e) if is_primary => {
                    primary_status = PrimaryStatus::Failed;
                    error!(
                        model = %config.name,
                        error = %e,
                        "Primary model failed to load, service will run degraded"
                    );
                }
                Err(e) => {
                    warn!(model = %config.name, error = %e, "Failed to load model, skipping");
                }
            }
        }

        if entries.is_empty() {
            return Err(PoolError::Empty {
                attempted: configs.len(),
            });
        }

        info!(
            count = entries.len(),
            primary = ?primary_status,
            "Loaded {} of {} models",
            entries.len(),
            configs.len()
        );

        Ok(Self {
            entries,
            primary_status,
        })
    }

    /// Loaded models in invocation order
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Get the number of loaded models
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Name of the loaded primary model
    pub fn primary_model(&self) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.is_primary)
            .map(|e| e.name.as_str())
    }

    pub fn primary_status(&self) -> PrimaryStatus {
        self.primary_status
    }

    /// True when the configured primary model is missing
    pub fn is_degraded(&self) -> bool {
        self.primary_status == PrimaryStatus::Failed
    }

    /// Release every loaded model.
    pub fn shutdown(mut self) {
        let count = self.entries.len();
        self.entries.clear();
        info!(count = count, "Model pool released");
    }
}
