//! Sentiment Ensemble Service - Main Entry Point
//!
//! Loads the model pool, then serves classification over HTTP and, when
//! enabled, over NATS request-reply. Every successful classification is
//! published as a record for the logging subscriber.

use anyhow::{Context, Result};
use sentiment_ensemble::{
    api,
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ServiceMetrics},
    models::inference::InferenceEngine,
    producer::RecordProducer,
    service::SentimentService,
    store::{PgRecordStore, RecordStore},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(&path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;

    info!("Starting Sentiment Ensemble Service");
    info!(
        "Max text length: {}, configured models: {}",
        config.http.max_text_length,
        config.models.entries.len()
    );

    // Loading blocks until every configured model was attempted
    let engine = Arc::new(InferenceEngine::new(&config).context("Model pool failed to start")?);
    info!(
        "Inference engine initialized with {} models: {:?}",
        engine.model_count(),
        engine.model_names()
    );
    if engine.is_degraded() {
        warn!("Primary model unavailable, serving with the remaining models");
    }

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());
    if config.pipeline.metrics_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
        tokio::spawn(reporter.start());
    }

    // NATS is optional: without it there is no record logging and no
    // request-reply subject, classification itself is unaffected
    let nats = if config.nats.enabled {
        match async_nats::connect(&config.nats.url).await {
            Ok(client) => {
                info!("Connected to NATS at {}", config.nats.url);
                Some(client)
            }
            Err(e) => {
                error!(url = %config.nats.url, error = %e, "NATS unavailable, records will not be published");
                None
            }
        }
    } else {
        None
    };

    let recorder = nats
        .as_ref()
        .map(|client| RecordProducer::new(client.clone(), &config.nats.record_subject));
    if let Some(recorder) = &recorder {
        info!("Publishing records to: {}", recorder.subject());
    }

    let store = if config.database.enabled {
        match PgRecordStore::connect(&config.database.url, config.database.max_connections).await {
            Ok(store) => {
                info!("Storing request log in PostgreSQL");
                Some(Arc::new(store))
            }
            Err(e) => {
                error!(error = %e, "Database unavailable, requests will not be stored");
                None
            }
        }
    } else {
        None
    };

    let mut service = SentimentService::new(
        engine.clone(),
        metrics.clone(),
        recorder,
        config.http.max_text_length,
    );
    if let Some(store) = &store {
        service = service.with_store(store.clone() as Arc<dyn RecordStore>);
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let consumer_task = nats.map(|client| {
        let consumer = RequestConsumer::new(
            client,
            &config.nats.request_subject,
            config.pipeline.workers,
        );
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = consumer.run(service, shutdown_rx).await {
                error!(error = %e, "NATS request consumer stopped");
            }
        })
    });

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .context("Invalid HTTP bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", addr);

    let shutdown_engine = engine.clone();
    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
            shutdown_engine.close();
            let _ = shutdown_tx.send(true);
        })
        .await?;

    // The consumer returns once its in-flight requests are answered
    if let Some(task) = consumer_task {
        if let Err(e) = task.await {
            error!(error = %e, "NATS request consumer panicked");
        }
    }

    if let Some(store) = &store {
        store.close().await;
    }

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    match Arc::try_unwrap(engine) {
        Ok(engine) => engine.shutdown(),
        Err(_) => warn!("Inference engine still referenced, models released on exit"),
    }

    Ok(())
}

/// Initialize logging: `RUST_LOG` wins, otherwise the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "sentiment_ensemble={},tower_http=info",
            logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
