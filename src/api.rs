//! HTTP surface for the graphfeed gateway.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /ingest` – Build an immutable job record from text plus optional metadata and append
//!   it to the durable queue. Returns the record with a `queued` status marker.
//! - `GET /health` – Report the connectivity state of the queue dependency.
//! - `GET /` – Static liveness descriptor.
//! - `GET /metrics` – Observe ingestion counters.
//!
//! Handlers are generic over [`IngestApi`] so tests can substitute a stub service.

use crate::metrics::MetricsSnapshot;
use crate::queue::{IngestError, JobRecord, QueueStatus};
use crate::service::IngestApi;
use axum::{
    Json, Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route("/ingest", post(ingest::<S>))
        .route("/health", get(health::<S>))
        .route("/", get(root))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Request body for the `POST /ingest` endpoint.
#[derive(Deserialize)]
struct IngestRequest {
    /// Text payload handed to the downstream pipeline. Required; empty text
    /// is accepted, content validation is a downstream concern.
    text: String,
    /// Optional metadata attached to the job record.
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Success response for the `POST /ingest` endpoint.
#[derive(Serialize)]
struct IngestResponse {
    /// Always `queued`: the job was durably accepted, not processed.
    status: &'static str,
    /// The record as it was appended to the queue.
    job: JobRecord,
}

/// Accept a submission and append it to the durable queue.
///
/// A malformed body (including an absent `text` field) is rejected before the
/// service is consulted, so no append happens for invalid input.
async fn ingest<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, AppError>
where
    S: IngestApi,
{
    let Json(request) = payload
        .map_err(|rejection| IngestError::InvalidInput(rejection.body_text()))?;

    let job = service.enqueue(request.text, request.metadata).await?;
    tracing::info!(enqueued_at = %job.enqueued_at, "Ingest request queued");
    Ok(Json(IngestResponse {
        status: "queued",
        job,
    }))
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    queue: QueueStatus,
}

/// Report liveness plus the queue dependency state.
async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: IngestApi,
{
    Json(HealthResponse {
        status: "healthy",
        queue: service.queue_status(),
    })
}

/// Static liveness descriptor for `GET /`.
async fn root() -> Json<Value> {
    Json(json!({ "service": "graphfeed", "status": "running" }))
}

/// Return a concise metrics snapshot with ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: IngestApi,
{
    Json(service.metrics_snapshot())
}

struct AppError(IngestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IngestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IngestError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::metrics::MetricsSnapshot;
    use crate::queue::{IngestError, JobRecord, QueueStatus};
    use crate::service::IngestApi;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Map, Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn ingest_route_queues_submission() {
        let service = Arc::new(StubIngestService::connected());
        let app = create_router(service.clone());

        let payload = json!({
            "text": "hello world",
            "metadata": { "source": "test" }
        });

        let response = app
            .oneshot(post_ingest(payload))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["status"], "queued");
        assert_eq!(json["job"]["text"], "hello world");
        assert_eq!(json["job"]["metadata"]["source"], "test");
        assert!(json["job"]["enqueued_at"].as_str().is_some());

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "hello world");
        assert_eq!(calls[0].metadata["source"], "test");
    }

    #[tokio::test]
    async fn missing_text_is_a_client_error_without_append() {
        let service = Arc::new(StubIngestService::connected());
        let app = create_router(service.clone());

        let response = app
            .oneshot(post_ingest(json!({ "metadata": {} })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn queue_outage_maps_to_service_unavailable() {
        let service = Arc::new(StubIngestService::disconnected());
        let app = create_router(service.clone());

        let response = app
            .oneshot(post_ingest(json!({ "text": "x" })))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json body");
        assert!(
            json["detail"]
                .as_str()
                .expect("detail string")
                .contains("Queue unavailable")
        );
    }

    #[tokio::test]
    async fn concurrent_submissions_each_append_once() {
        let service = Arc::new(StubIngestService::connected());
        let app = create_router(service.clone());

        let mut handles = Vec::new();
        for n in 0..8 {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                app.oneshot(post_ingest(json!({ "text": format!("job-{n}") })))
                    .await
                    .expect("router response")
                    .status()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.expect("task"), StatusCode::OK);
        }

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 8);
        let mut texts: Vec<_> = calls.into_iter().map(|call| call.text).collect();
        texts.sort();
        texts.dedup();
        assert_eq!(texts.len(), 8);
    }

    #[tokio::test]
    async fn health_reports_queue_state() {
        let service = Arc::new(StubIngestService::disconnected());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["queue"], "disconnected");
    }

    #[tokio::test]
    async fn root_reports_running_service() {
        let service = Arc::new(StubIngestService::connected());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["service"], "graphfeed");
        assert_eq!(json["status"], "running");
    }

    fn post_ingest(payload: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/ingest")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[derive(Clone, Debug)]
    struct EnqueueCall {
        text: String,
        metadata: Map<String, Value>,
    }

    struct StubIngestService {
        calls: Arc<Mutex<Vec<EnqueueCall>>>,
        status: QueueStatus,
    }

    impl StubIngestService {
        fn connected() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                status: QueueStatus::Connected,
            }
        }

        fn disconnected() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                status: QueueStatus::Disconnected,
            }
        }

        async fn recorded_calls(&self) -> Vec<EnqueueCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl IngestApi for StubIngestService {
        async fn enqueue(
            &self,
            text: String,
            metadata: Map<String, Value>,
        ) -> Result<JobRecord, IngestError> {
            if self.status == QueueStatus::Disconnected {
                return Err(IngestError::DependencyUnavailable(
                    "queue connection not established".into(),
                ));
            }
            let record = JobRecord {
                text: text.clone(),
                metadata: metadata.clone(),
                enqueued_at: "2025-01-01T00:00:00Z".into(),
            };
            self.calls.lock().await.push(EnqueueCall { text, metadata });
            Ok(record)
        }

        fn queue_status(&self) -> QueueStatus {
            self.status
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                jobs_enqueued: 0,
                enqueue_failures: 0,
            }
        }
    }
}
