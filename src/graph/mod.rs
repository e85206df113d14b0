//! Neo4j graph store integration for similarity-index provisioning.

pub mod client;
pub mod types;

pub use client::{GraphService, provision_entity_index};
pub use types::{GraphError, IndexDescriptor, ProvisionOutcome};
