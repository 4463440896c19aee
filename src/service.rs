//! Request handling shared by the HTTP and NATS front doors
//!
//! Validates input, runs the blocking ensemble off the async runtime,
//! records metrics, then stores the request and publishes it to the
//! record subject.

use crate::error::{ClassifyError, ValidationError};
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::producer::RecordProducer;
use crate::store::RecordStore;
use crate::types::request::{AnalyzeRequest, AnalyzeResponse};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Why a request produced no label
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("inference task failed: {0}")]
    Internal(String),
}

/// Shared classification service
#[derive(Clone)]
pub struct SentimentService {
    engine: Arc<InferenceEngine>,
    metrics: Arc<ServiceMetrics>,
    recorder: Option<RecordProducer>,
    store: Option<Arc<dyn RecordStore>>,
    max_text_length: usize,
}

impl SentimentService {
    pub fn new(
        engine: Arc<InferenceEngine>,
        metrics: Arc<ServiceMetrics>,
        recorder: Option<RecordProducer>,
        max_text_length: usize,
    ) -> Self {
        Self {
            engine,
            metrics,
            recorder,
            store: None,
            max_text_length,
        }
    }

    /// Store every successful classification in `store`
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn engine(&self) -> &Arc<InferenceEngine> {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Validate, classify and record one request
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, ServiceError> {
        if let Err(e) = request.validate(self.max_text_length) {
            self.metrics.record_rejection();
            debug!(error = %e, "Request rejected");
            return Err(e.into());
        }

        let start_time = Instant::now();
        let engine = self.engine.clone();
        let text = request.text;

        // Models block while they run
        let (text, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = engine.predict(&text);
            (text, outcome)
        })
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let processing_time = start_time.elapsed();

        let prediction = match outcome {
            Ok(prediction) => prediction,
            Err(e) => {
                self.metrics.record_failure(processing_time);
                error!(error = %e, "Classification failed");
                return Err(e.into());
            }
        };

        self.metrics.record_prediction(processing_time, &prediction);

        if self.store.is_some() || self.recorder.is_some() {
            let record = prediction.to_record(&text);

            if let Some(store) = &self.store {
                if let Err(e) = store.save(&record).await {
                    warn!(
                        record_id = %record.record_id,
                        error = %e,
                        "Failed to store sentiment record"
                    );
                }
            }

            if let Some(recorder) = &self.recorder {
                if let Err(e) = recorder.publish(&record).await {
                    warn!(
                        record_id = %record.record_id,
                        error = %e,
                        "Failed to publish sentiment record"
                    );
                }
            }
        }

        debug!(
            label = %prediction.ensemble.label,
            confidence = prediction.ensemble.confidence,
            processing_time_us = processing_time.as_micros(),
            "Request classified"
        );

        Ok(AnalyzeResponse::from(&prediction.ensemble))
    }
}
