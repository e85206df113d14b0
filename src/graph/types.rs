//! Shared types used by the graph store client.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors returned while talking to the Neo4j HTTP API.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Neo4j URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Neo4j responded with an unexpected status code.
    #[error("Unexpected Neo4j response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Neo4j.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Neo4j accepted the request but reported a statement error.
    #[error("Cypher statement failed ({code}): {message}")]
    Cypher {
        /// Neo4j status code, e.g. `Neo.ClientError.Schema.IndexAlreadyExists`.
        code: String,
        /// Human-readable message attached to the failure.
        message: String,
    },
}

/// Schema object describing the similarity index the pipeline writes into.
///
/// Dimensionality and similarity function are fixed to match the embedding
/// model the downstream consumer uses; they are never caller-supplied.
#[derive(Debug, Clone, Copy)]
pub struct IndexDescriptor {
    /// Stable index identifier.
    pub name: &'static str,
    /// Node label the index applies to.
    pub label: &'static str,
    /// Node property holding the embedding vector.
    pub property: &'static str,
    /// Vector dimensionality expected by the embedding model.
    pub dimensions: u64,
    /// Similarity function used for nearest-neighbour lookups.
    pub similarity: &'static str,
}

impl IndexDescriptor {
    /// Descriptor for the entity-embedding lookup index.
    pub const fn entity_embeddings() -> Self {
        Self {
            name: "entity_embeddings",
            label: "Entity",
            property: "embedding",
            dimensions: 768,
            similarity: "cosine",
        }
    }
}

/// Result of the startup provisioning routine.
///
/// Provisioning never propagates an error; failures are folded into this
/// value so the caller can log them and keep serving ingestion traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The index was missing and has been created.
    Created,
    /// An index with matching parameters already exists.
    AlreadyExists,
    /// An index with the same name exists but its parameters differ.
    Conflict(String),
    /// The graph store could not be reached or rejected the statement.
    Failed(String),
}

/// Parameters observed on an index that already exists in the store.
#[derive(Debug, Clone, Default)]
pub(crate) struct ExistingIndex {
    pub(crate) dimensions: Option<u64>,
    pub(crate) similarity: Option<String>,
}

impl ExistingIndex {
    /// An observed parameter conflicts only when it is present and differs;
    /// absent options cannot prove a mismatch.
    pub(crate) fn matches(&self, descriptor: &IndexDescriptor) -> bool {
        let dimensions_ok = self
            .dimensions
            .map(|dims| dims == descriptor.dimensions)
            .unwrap_or(true);
        let similarity_ok = self
            .similarity
            .as_deref()
            .map(|sim| sim.eq_ignore_ascii_case(descriptor.similarity))
            .unwrap_or(true);
        dimensions_ok && similarity_ok
    }
}

#[derive(Deserialize)]
pub(crate) struct CypherResponse {
    #[serde(default)]
    pub(crate) results: Vec<CypherResult>,
    #[serde(default)]
    pub(crate) errors: Vec<CypherFailure>,
}

#[derive(Deserialize)]
pub(crate) struct CypherResult {
    #[serde(default)]
    pub(crate) data: Vec<CypherRow>,
}

#[derive(Deserialize)]
pub(crate) struct CypherRow {
    #[serde(default)]
    pub(crate) row: Vec<Value>,
}

#[derive(Deserialize)]
pub(crate) struct CypherFailure {
    pub(crate) code: String,
    pub(crate) message: String,
}
