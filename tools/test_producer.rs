//! Test Request Producer
//!
//! Sends sample texts to the service over NATS request-reply and reports
//! latency and error rate.
//!
//! Usage: test_producer [nats_url] [subject] [count] [delay_ms]

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const SAMPLE_TEXTS: &[&str] = &[
    "I absolutely love this product! It's amazing!",
    "This is the worst experience I've ever had.",
    "The service was okay, nothing special.",
    "Fantastic quality and great customer support!",
    "Terrible product, complete waste of money.",
    "It's fine, meets my basic requirements.",
    "Outstanding innovation, highly recommended!",
    "Poor quality control, very disappointed.",
    "Average performance, could be improved.",
    "Hate everything about this service.",
    "Love the user interface and features.",
    "Neutral opinion, works as expected.",
    "Buggy software, needs major fixes.",
    "I can't believe how good this is",
    "It wasn't bad, but it wasn't great either",
];

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeReply {
    label: Option<String>,
    confidence: Option<f64>,
    error: Option<String>,
}

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Pick a sample, sometimes with the noise the normalizer is meant to remove
    fn generate(&mut self) -> AnalyzeRequest {
        let base = SAMPLE_TEXTS.choose(&mut self.rng).copied().unwrap_or("okay");

        let text = match self.rng.gen_range(0..4) {
            0 => base.replace('!', "!!!"),
            1 => format!("  {}   ", base.replace(' ', "  ")),
            2 => base.to_uppercase(),
            _ => base.to_string(),
        };

        AnalyzeRequest { text }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("sentiment.analyze");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(50);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = async_nats::connect(nats_url).await?;
    info!("Connected to NATS");

    let mut generator = RequestGenerator::new();
    let mut latencies_us: Vec<u64> = Vec::with_capacity(count as usize);
    let mut errors = 0u64;

    for i in 0..count {
        let request = generator.generate();
        let payload = serde_json::to_vec(&request)?;

        let start = Instant::now();
        match client.request(subject.to_string(), payload.into()).await {
            Ok(message) => {
                latencies_us.push(start.elapsed().as_micros() as u64);

                match serde_json::from_slice::<AnalyzeReply>(&message.payload) {
                    Ok(AnalyzeReply {
                        label: Some(label),
                        confidence: Some(confidence),
                        ..
                    }) if (0.0..=1.0).contains(&confidence) => {
                        if i % 10 == 0 {
                            info!(text = %request.text, label = %label, confidence = confidence, "Sample reply");
                        }
                    }
                    Ok(reply) => {
                        errors += 1;
                        warn!(error = ?reply.error, "Service returned an error");
                    }
                    Err(e) => {
                        errors += 1;
                        warn!(error = %e, "Malformed reply");
                    }
                }
            }
            Err(e) => {
                errors += 1;
                warn!(error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    latencies_us.sort_unstable();
    let percentile = |p: f64| -> u64 {
        if latencies_us.is_empty() {
            return 0;
        }
        let index = ((latencies_us.len() as f64 * p) as usize).min(latencies_us.len() - 1);
        latencies_us[index]
    };

    info!(
        sent = count,
        errors = errors,
        error_rate = format!("{:.1}%", errors as f64 / count.max(1) as f64 * 100.0),
        p50_us = percentile(0.50),
        p95_us = percentile(0.95),
        p99_us = percentile(0.99),
        "Completed"
    );

    Ok(())
}
