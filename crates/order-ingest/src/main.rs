//! # Order Ingest
//!
//! Runs the whole pipeline in one process: a demo publisher feeds the bus, the subscriber
//! validates and dead-letters, the order service deduplicates and stores, and the read API
//! serves what was stored.
//!
//! ```bash
//! cargo run -p order-ingest -- --config crates/order-ingest/config.example.toml
//! curl localhost:8080/orders
//! ```
//!
//! SIGINT or SIGTERM starts a graceful shutdown.

use ingest_framework::logging::setup_tracing;
use order_ingest::api;
use order_ingest::config::AppConfig;
use order_ingest::lifecycle::{OrderSystem, StartupError};
use order_ingest::storage::{MemoryStore, OrderStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;

    // Setup tracing once for the entire application
    setup_tracing(&config.logging.level, config.logging.format);

    info!("Starting order ingest");

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let store: Arc<dyn OrderStore> = Arc::new(MemoryStore::new());
    let system = OrderSystem::start(&config, store).await?;

    let cancel = system.cancel_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });

    let served = api::serve(
        listener,
        system.router(),
        system.cancel_token(),
        config.server.shutdown_grace(),
    )
    .await;

    // Shutdown system gracefully
    system.shutdown().await;

    served.map_err(StartupError::Serve)?;
    info!("Order ingest stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received"),
        _ = terminate => info!("SIGTERM received"),
    }
}
