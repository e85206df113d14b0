//! Shared types used by the queue producer and the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

/// Errors surfaced by the ingestion path.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The caller omitted or malformed a required request field.
    #[error("Invalid ingest request: {0}")]
    InvalidInput(String),
    /// The queue dependency is not established or rejected the append.
    #[error("Queue unavailable: {0}")]
    DependencyUnavailable(String),
}

/// Immutable unit of work pushed onto the durable queue.
///
/// The record is built by the producer at enqueue time and never rewritten;
/// the downstream pipeline pops and destroys it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Raw text payload to be processed downstream.
    pub text: String,
    /// Caller-supplied metadata attached to the job.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// RFC 3339 UTC timestamp stamped by the producer at enqueue time.
    pub enqueued_at: String,
}

/// Connectivity state of the queue dependency reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// A connection handle to the queue service is established.
    Connected,
    /// No connection handle is available; ingestion returns 503.
    Disconnected,
}

/// Current timestamp formatted for job records.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
