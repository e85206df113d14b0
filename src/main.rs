use graphfeed::graph::{self, ProvisionOutcome};
use graphfeed::{api, config, logging, service};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();

    // Provisioning is best-effort: ingestion must come up even when the
    // graph store is unreachable or the index parameters disagree.
    match graph::provision_entity_index().await {
        ProvisionOutcome::Created => tracing::info!("Entity embedding index created"),
        ProvisionOutcome::AlreadyExists => {
            tracing::info!("Entity embedding index already present");
        }
        ProvisionOutcome::Conflict(reason) => {
            tracing::warn!(reason = %reason, "Entity embedding index has conflicting parameters");
        }
        ProvisionOutcome::Failed(reason) => {
            tracing::warn!(reason = %reason, "Index provisioning failed; serving without it");
        }
    }

    let app = api::create_router(Arc::new(service::IngestService::new().await));

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8000..=8099;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8000-8099",
    ))
}
