//! HTTP client wrapper for the Neo4j transactional Cypher API.

use crate::config::get_config;
use crate::graph::types::{
    CypherResponse, ExistingIndex, GraphError, IndexDescriptor, ProvisionOutcome,
};
use serde_json::{Value, json};
use std::time::Duration;

/// Bound on each schema statement round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Lightweight HTTP client for Neo4j schema operations.
///
/// The client is scoped to the startup provisioning routine; dropping it
/// releases the underlying connection pool on every exit path.
pub struct GraphService {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) database: String,
}

/// Ensure the entity-embedding index exists, folding every failure into the outcome.
///
/// Invoked once during startup; the caller logs the outcome and continues
/// serving ingestion traffic regardless of what happened here.
pub async fn provision_entity_index() -> ProvisionOutcome {
    match GraphService::new() {
        Ok(service) => service.ensure_entity_index().await,
        Err(err) => ProvisionOutcome::Failed(err.to_string()),
    }
}

impl GraphService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, GraphError> {
        let config = get_config();
        let client = reqwest::Client::builder()
            .user_agent("graphfeed/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base_url = normalize_base_url(&config.neo4j_url).map_err(GraphError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            database = %config.neo4j_database,
            has_credentials = !config.neo4j_username.is_empty(),
            "Initialized Neo4j HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            username: config.neo4j_username.clone(),
            password: config.neo4j_password.clone(),
            database: config.neo4j_database.clone(),
        })
    }

    /// Ensure the entity-embedding index exists with its fixed parameters.
    ///
    /// Safe to run on every restart: an index that already exists with
    /// matching parameters is a no-op success, a parameter mismatch is a
    /// warning outcome, and any transport or statement failure is reported
    /// without propagating.
    pub async fn ensure_entity_index(&self) -> ProvisionOutcome {
        let descriptor = IndexDescriptor::entity_embeddings();
        match self.ensure_index(&descriptor).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(index = descriptor.name, error = %err, "Index provisioning failed");
                ProvisionOutcome::Failed(err.to_string())
            }
        }
    }

    async fn ensure_index(
        &self,
        descriptor: &IndexDescriptor,
    ) -> Result<ProvisionOutcome, GraphError> {
        match self.vector_index(descriptor.name).await? {
            Some(existing) => {
                if existing.matches(descriptor) {
                    tracing::debug!(index = descriptor.name, "Vector index already present");
                    Ok(ProvisionOutcome::AlreadyExists)
                } else {
                    Ok(ProvisionOutcome::Conflict(format!(
                        "index '{}' exists with dimensions {:?} / similarity {:?}, expected {} / {}",
                        descriptor.name,
                        existing.dimensions,
                        existing.similarity,
                        descriptor.dimensions,
                        descriptor.similarity
                    )))
                }
            }
            None => {
                self.create_vector_index(descriptor).await?;
                tracing::info!(
                    index = descriptor.name,
                    dimensions = descriptor.dimensions,
                    similarity = descriptor.similarity,
                    "Vector index created"
                );
                Ok(ProvisionOutcome::Created)
            }
        }
    }

    /// Look up a vector index by name, returning its observed parameters.
    async fn vector_index(&self, name: &str) -> Result<Option<ExistingIndex>, GraphError> {
        let rows = self
            .run_statement(
                "SHOW VECTOR INDEXES YIELD name, options WHERE name = $name RETURN name, options",
                json!({ "name": name }),
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        Ok(Some(parse_index_options(row.get(1))))
    }

    /// Issue the idempotent index-creation statement for the descriptor.
    async fn create_vector_index(&self, descriptor: &IndexDescriptor) -> Result<(), GraphError> {
        // Schema identifiers cannot be parameterized in Cypher; the
        // descriptor is compile-time constant, so interpolation is safe.
        let statement = format!(
            "CREATE VECTOR INDEX {name} IF NOT EXISTS \
             FOR (n:{label}) ON (n.{property}) \
             OPTIONS {{indexConfig: {{\
             `vector.dimensions`: {dimensions}, \
             `vector.similarity_function`: '{similarity}'}}}}",
            name = descriptor.name,
            label = descriptor.label,
            property = descriptor.property,
            dimensions = descriptor.dimensions,
            similarity = descriptor.similarity,
        );

        self.run_statement(&statement, json!({})).await?;
        Ok(())
    }

    /// Execute a single auto-committed Cypher statement and return its rows.
    async fn run_statement(
        &self,
        statement: &str,
        parameters: Value,
    ) -> Result<Vec<Vec<Value>>, GraphError> {
        let url = format!(
            "{}/db/{}/tx/commit",
            self.base_url.trim_end_matches('/'),
            self.database
        );
        let body = json!({
            "statements": [
                { "statement": statement, "parameters": parameters }
            ]
        });

        let mut request = self.client.post(url).json(&body);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = GraphError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Neo4j request failed");
            return Err(error);
        }

        let payload: CypherResponse = response.json().await?;
        if let Some(failure) = payload.errors.into_iter().next() {
            return Err(GraphError::Cypher {
                code: failure.code,
                message: failure.message,
            });
        }

        Ok(payload
            .results
            .into_iter()
            .flat_map(|result| result.data)
            .map(|row| row.row)
            .collect())
    }
}

/// Extract dimensionality and similarity function from a `SHOW INDEXES` options column.
fn parse_index_options(options: Option<&Value>) -> ExistingIndex {
    let config = options
        .and_then(|value| value.get("indexConfig"))
        .and_then(Value::as_object);

    let Some(config) = config else {
        return ExistingIndex::default();
    };

    ExistingIndex {
        dimensions: config.get("vector.dimensions").and_then(Value::as_u64),
        similarity: config
            .get("vector.similarity_function")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
