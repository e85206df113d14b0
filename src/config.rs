use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the graphfeed gateway.
///
/// Every field has a default suitable for a co-located deployment, so a bare
/// environment still produces a working configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Connection URL for the Redis instance backing the job queue.
    pub redis_url: String,
    /// Name of the durable list that ingestion jobs are pushed onto.
    pub queue_name: String,
    /// Base URL of the Neo4j HTTP API.
    pub neo4j_url: String,
    /// Username presented to Neo4j; may be empty to skip authentication.
    pub neo4j_username: String,
    /// Password presented to Neo4j; may be empty.
    pub neo4j_password: String,
    /// Neo4j database the schema statements run against.
    pub neo4j_database: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, applying defaults where unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            redis_url: load_env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            queue_name: load_env_or("QUEUE_NAME", "graphfeed:jobs"),
            neo4j_url: load_env_or("NEO4J_URL", "http://127.0.0.1:7474"),
            neo4j_username: load_env_or("NEO4J_USERNAME", "neo4j"),
            neo4j_password: env::var("NEO4J_PASSWORD").unwrap_or_default(),
            neo4j_database: load_env_or("NEO4J_DATABASE", "neo4j"),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env_or(key: &str, default: &str) -> String {
    load_env_optional(key).unwrap_or_else(|| default.to_string())
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        redis_url = %config.redis_url,
        queue = %config.queue_name,
        neo4j_url = %config.neo4j_url,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
