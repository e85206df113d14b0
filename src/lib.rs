#![deny(missing_docs)]

//! Core library for the graphfeed ingestion gateway.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Graph store integration and similarity-index provisioning.
pub mod graph;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Durable job queue integration.
pub mod queue;
/// Ingestion service shared by the HTTP surface.
pub mod service;
