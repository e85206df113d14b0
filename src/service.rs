//! Ingestion service shared by the HTTP surface.

use crate::config::get_config;
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::queue::{IngestError, JobRecord, QueueProducer, QueueStatus};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Abstraction over the ingestion path used by external surfaces.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Build a job record for the submission and append it to the durable queue.
    async fn enqueue(
        &self,
        text: String,
        metadata: Map<String, Value>,
    ) -> Result<JobRecord, IngestError>;

    /// Report the connectivity state of the queue dependency.
    fn queue_status(&self) -> QueueStatus;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Coordinates the enqueue path: record construction, queue append, metrics.
///
/// The service owns the long-lived queue connection handle so every concurrent
/// request reuses it. Construct the service once near process start and share
/// it through an `Arc`.
pub struct IngestService {
    producer: QueueProducer,
    metrics: Arc<IngestMetrics>,
}

impl IngestService {
    /// Build a new ingestion service, connecting to the queue as configured.
    ///
    /// A failed queue connection leaves the service in a degraded state that
    /// still serves traffic; every enqueue then reports unavailability.
    pub async fn new() -> Self {
        let config = get_config();
        let producer = QueueProducer::connect(&config.redis_url, &config.queue_name).await;
        Self {
            producer,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn enqueue(
        &self,
        text: String,
        metadata: Map<String, Value>,
    ) -> Result<JobRecord, IngestError> {
        match self.producer.enqueue(text, metadata).await {
            Ok(record) => {
                self.metrics.record_enqueued();
                Ok(record)
            }
            Err(err) => {
                if matches!(err, IngestError::DependencyUnavailable(_)) {
                    self.metrics.record_failure();
                }
                Err(err)
            }
        }
    }

    fn queue_status(&self) -> QueueStatus {
        self.producer.status()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
