//! Performance metrics and statistics tracking for the sentiment service.

use crate::models::inference::PredictionResult;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for service performance
pub struct ServiceMetrics {
    /// Requests answered with a label
    pub requests_classified: AtomicU64,
    /// Requests where no model produced a vote
    pub requests_failed: AtomicU64,
    /// Requests rejected by input validation
    pub requests_rejected: AtomicU64,
    /// Requests where every surviving model agreed
    pub unanimous_votes: AtomicU64,
    /// Final labels
    labels: RwLock<HashMap<String, u64>>,
    /// Per-model inference failures
    model_failures: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            requests_classified: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            unanimous_votes: AtomicU64::new(0),
            labels: RwLock::new(HashMap::new()),
            model_failures: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful classification
    pub fn record_prediction(&self, processing_time: Duration, prediction: &PredictionResult) {
        self.requests_classified.fetch_add(1, Ordering::Relaxed);

        if prediction.predictions().len() > 1 && prediction.is_unanimous() {
            self.unanimous_votes.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut labels) = self.labels.write() {
            *labels.entry(prediction.ensemble.label.to_string()).or_insert(0) += 1;
        }

        self.record_model_failures(prediction.failed_models());
        self.record_processing_time(processing_time);
    }

    /// Record a request that no model could answer
    pub fn record_failure(&self, processing_time: Duration) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);
    }

    /// Record a request rejected before inference
    pub fn record_rejection(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_model_failures(&self, models: Vec<&str>) {
        if models.is_empty() {
            return;
        }
        if let Ok(mut failures) = self.model_failures.write() {
            for model in models {
                *failures.entry(model.to_string()).or_insert(0) += 1;
            }
        }
    }

    fn record_processing_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted: Vec<u64> = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (classifications per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_classified.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Fraction of multi-model votes that were unanimous
    pub fn get_unanimity_rate(&self) -> f64 {
        let classified = self.requests_classified.load(Ordering::Relaxed);
        if classified == 0 {
            return 0.0;
        }
        self.unanimous_votes.load(Ordering::Relaxed) as f64 / classified as f64
    }

    pub fn get_labels(&self) -> HashMap<String, u64> {
        self.labels.read().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn get_model_failures(&self) -> HashMap<String, u64> {
        self.model_failures
            .read()
            .map(|f| f.clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_classified: self.requests_classified.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            unanimity_rate: self.get_unanimity_rate(),
            throughput: self.get_throughput(),
            labels: self.get_labels(),
            model_failures: self.get_model_failures(),
            processing: self.get_processing_stats(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let processing = &snapshot.processing;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║           SENTIMENT ENSEMBLE - METRICS SUMMARY               ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Classified: {:>8}  │  Failed: {:>6}  │  Rejected: {:>6} ║",
            snapshot.requests_classified, snapshot.requests_failed, snapshot.requests_rejected
        );
        info!(
            "║ Throughput: {:>6.1} req/s  │  Unanimous votes: {:>5.1}%       ║",
            snapshot.throughput,
            snapshot.unanimity_rate * 100.0
        );
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Labels:                                                      ║");
        for (label, count) in &snapshot.labels {
            let pct = if snapshot.requests_classified > 0 {
                (*count as f64 / snapshot.requests_classified as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)", label, count, pct);
        }
        if !snapshot.model_failures.is_empty() {
            info!("║ Model failures:                                              ║");
            for (model, count) in &snapshot.model_failures {
                info!("║   {:20}: {:>6}", model, count);
            }
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable view of the metrics, served by the HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_classified: u64,
    pub requests_failed: u64,
    pub requests_rejected: u64,
    pub unanimity_rate: f64,
    pub throughput: f64,
    pub labels: HashMap<String, u64>,
    pub model_failures: HashMap<String, u64>,
    pub processing: ProcessingStats,
    pub uptime_secs: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::ModelOutcome;
    use crate::models::labels::SentimentLabel;
    use crate::types::prediction::{EnsembleResult, NormalizedPrediction};

    fn prediction(labels: &[Option<SentimentLabel>]) -> PredictionResult {
        let outcomes: Vec<ModelOutcome> = labels
            .iter()
            .enumerate()
            .map(|(i, label)| ModelOutcome {
                model: format!("model{}", i),
                result: match label {
                    Some(label) => Ok(NormalizedPrediction::new(label.clone(), 0.8)),
                    None => Err("failed".to_string()),
                },
            })
            .collect();

        PredictionResult {
            ensemble: EnsembleResult {
                label: SentimentLabel::Positive,
                confidence: 0.8,
            },
            outcomes,
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(
            Duration::from_micros(100),
            &prediction(&[Some(SentimentLabel::Positive), Some(SentimentLabel::Positive)]),
        );
        metrics.record_prediction(
            Duration::from_micros(200),
            &prediction(&[Some(SentimentLabel::Positive), None]),
        );
        metrics.record_failure(Duration::from_micros(50));
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_classified, 2);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.requests_rejected, 1);
        assert_eq!(snapshot.labels.get("Positive"), Some(&2));
        assert_eq!(snapshot.model_failures.get("model1"), Some(&1));
        assert_eq!(snapshot.processing.count, 3);
    }

    #[test]
    fn test_unanimity_rate() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(
            Duration::from_micros(100),
            &prediction(&[Some(SentimentLabel::Positive), Some(SentimentLabel::Positive)]),
        );
        metrics.record_prediction(
            Duration::from_micros(100),
            &prediction(&[Some(SentimentLabel::Positive), Some(SentimentLabel::Negative)]),
        );

        assert!((metrics.get_unanimity_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_processing_stats_empty() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);
    }
}
