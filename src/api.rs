//! HTTP API
//!
//! - `POST /analyze`: `{"text": "..."}` → `{"label": "...", "confidence": 0.93}`
//! - `GET /health`: readiness and pool introspection
//! - `GET /metrics`: metrics snapshot

use crate::error::{ClassifyError, ValidationError};
use crate::metrics::MetricsSnapshot;
use crate::models::pool::PrimaryStatus;
use crate::service::{SentimentService, ServiceError};
use crate::types::request::{AnalyzeRequest, AnalyzeResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP-facing error
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Unavailable(ClassifyError),
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => ApiError::Validation(e),
            ServiceError::Classify(e) => ApiError::Unavailable(e),
            ServiceError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_count: usize,
    models: Vec<String>,
    primary: Option<String>,
    primary_model: PrimaryStatus,
}

/// Build the router over a shared service
pub fn router(service: SentimentService) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn analyze(
    State(service): State<SentimentService>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let response = service.analyze(request).await?;
    Ok(Json(response))
}

async fn health(State(service): State<SentimentService>) -> (StatusCode, Json<HealthResponse>) {
    let engine = service.engine();

    let (status, code) = if engine.is_closed() {
        ("shutting_down", StatusCode::SERVICE_UNAVAILABLE)
    } else if engine.is_degraded() {
        ("degraded", StatusCode::OK)
    } else {
        ("healthy", StatusCode::OK)
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model_count: engine.model_count(),
        models: engine.model_names(),
        primary: engine.primary_model().map(str::to_string),
        primary_model: engine.primary_status(),
    };

    (code, Json(body))
}

async fn metrics(State(service): State<SentimentService>) -> Json<MetricsSnapshot> {
    Json(service.metrics().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::metrics::ServiceMetrics;
    use crate::models::inference::InferenceEngine;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, SentimentService) {
        let engine = InferenceEngine::new(&AppConfig::default()).unwrap();
        let service = SentimentService::new(
            Arc::new(engine),
            Arc::new(ServiceMetrics::new()),
            None,
            20,
        );
        (router(service.clone()), service)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_analyze(text: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "text": text }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let (app, _) = app();
        let response = app.oneshot(post_analyze("terrible, just awful")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["label"], "Negative");
        assert!(body["confidence"].as_f64().unwrap() > 0.5);
    }

    #[tokio::test]
    async fn test_analyze_validation() {
        let (app, _) = app();

        let response = app.clone().oneshot(post_analyze("")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_analyze("this text is longer than twenty characters"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_analyze_when_closed() {
        let (app, service) = app();
        service.engine().close();

        let response = app.oneshot(post_analyze("fine")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["model_count"], 1);
        assert_eq!(body["models"][0], "lexicon");
        assert_eq!(body["primary"], "lexicon");
        assert_eq!(body["primary_model"], "loaded");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _) = app();
        app.clone().oneshot(post_analyze("great")).await.unwrap();

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        let body = body_json(response).await;
        assert_eq!(body["requests_classified"], 1);
        assert_eq!(body["labels"]["Positive"], 1);
    }
}
