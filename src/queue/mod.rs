//! Durable job queue integration.

pub mod producer;
pub mod types;

pub use producer::QueueProducer;
pub use types::{IngestError, JobRecord, QueueStatus};
