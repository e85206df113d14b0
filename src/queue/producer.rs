//! Producer-side access to the durable Redis job list.

use crate::queue::types::{IngestError, JobRecord, QueueStatus, current_timestamp_rfc3339};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::time::timeout;

/// Bound on a single queue append before it is surfaced as unavailability.
const APPEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Appends job records to the head of a named durable list.
///
/// The connection handle is opened once at startup and shared by every
/// in-flight request; Redis serializes concurrent `LPUSH` calls, so no
/// locking is needed on this side. A producer without a handle stays usable
/// and reports every enqueue as `DependencyUnavailable`.
pub struct QueueProducer {
    pub(crate) conn: Option<ConnectionManager>,
    pub(crate) queue_key: String,
}

impl QueueProducer {
    /// Attempt to connect to Redis, degrading to a disconnected producer on failure.
    ///
    /// Startup must not be blocked by the queue being down; the handle is
    /// simply absent and `/health` reports `disconnected` until restart.
    pub async fn connect(redis_url: &str, queue_key: &str) -> Self {
        let conn = match redis::Client::open(redis_url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(conn) => {
                    tracing::info!(url = %redis_url, queue = %queue_key, "Connected to Redis queue");
                    Some(conn)
                }
                Err(err) => {
                    tracing::warn!(url = %redis_url, error = %err, "Failed to connect to Redis; ingestion degraded");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(url = %redis_url, error = %err, "Invalid Redis URL; ingestion degraded");
                None
            }
        };

        Self {
            conn,
            queue_key: queue_key.to_string(),
        }
    }

    /// Construct a producer with no queue connection.
    pub fn disconnected(queue_key: &str) -> Self {
        Self {
            conn: None,
            queue_key: queue_key.to_string(),
        }
    }

    /// Report whether a connection handle to the queue service is established.
    pub fn status(&self) -> QueueStatus {
        if self.conn.is_some() {
            QueueStatus::Connected
        } else {
            QueueStatus::Disconnected
        }
    }

    /// Build a job record, stamp it, and append it to the head of the queue.
    ///
    /// The append is a single atomic `LPUSH`; a FIFO consumer popping from the
    /// tail observes records from this producer in enqueue order. No retry is
    /// performed here.
    pub async fn enqueue(
        &self,
        text: String,
        metadata: Map<String, Value>,
    ) -> Result<JobRecord, IngestError> {
        let Some(conn) = self.conn.as_ref() else {
            return Err(IngestError::DependencyUnavailable(
                "queue connection not established".into(),
            ));
        };

        let record = build_job_record(text, metadata);
        let payload = serde_json::to_string(&record)
            .map_err(|err| IngestError::InvalidInput(format!("unserializable job record: {err}")))?;

        let mut conn = conn.clone();
        match timeout(
            APPEND_TIMEOUT,
            conn.lpush::<_, _, ()>(&self.queue_key, payload),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::debug!(queue = %self.queue_key, "Job appended");
                Ok(record)
            }
            Ok(Err(err)) => Err(IngestError::DependencyUnavailable(format!(
                "queue append failed: {err}"
            ))),
            Err(_) => Err(IngestError::DependencyUnavailable(
                "queue append timed out".into(),
            )),
        }
    }
}

/// Construct the immutable record for a submission, stamping the current time.
pub(crate) fn build_job_record(text: String, metadata: Map<String, Value>) -> JobRecord {
    JobRecord {
        text,
        metadata,
        enqueued_at: current_timestamp_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[test]
    fn job_record_preserves_inputs_and_stamps_now() {
        let mut metadata = Map::new();
        metadata.insert("source".into(), json!("test"));

        let before = OffsetDateTime::now_utc();
        let record = build_job_record("hello world".into(), metadata.clone());
        let after = OffsetDateTime::now_utc();

        assert_eq!(record.text, "hello world");
        assert_eq!(record.metadata, metadata);

        let stamped =
            OffsetDateTime::parse(&record.enqueued_at, &Rfc3339).expect("rfc3339 timestamp");
        assert!(stamped >= before && stamped <= after);
    }

    #[test]
    fn empty_text_is_accepted() {
        // Content validation is a downstream concern; only absence is a client error.
        let record = build_job_record(String::new(), Map::new());
        assert_eq!(record.text, "");
        assert!(record.metadata.is_empty());
    }

    #[tokio::test]
    async fn enqueue_without_connection_reports_unavailable() {
        let producer = QueueProducer::disconnected("graphfeed:jobs");
        assert_eq!(producer.status(), QueueStatus::Disconnected);

        let err = producer
            .enqueue("x".into(), Map::new())
            .await
            .expect_err("enqueue without a handle");
        assert!(matches!(err, IngestError::DependencyUnavailable(_)));
    }
}
