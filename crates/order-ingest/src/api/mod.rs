//! # Read API
//!
//! HTTP read-back of ingested orders, served with axum.
//!
//! | Route | Success | Errors |
//! |-------|---------|--------|
//! | `GET /order/{id}` | 200, the order | 400 malformed id, 404 unknown id, 500 storage failure |
//! | `GET /orders` | 200, every order | 500 storage failure |
//!
//! Errors share one envelope:
//!
//! ```json
//! {"message": "order 6f1c... is not found", "statusCode": 404, "statusMessage": "Not Found"}
//! ```

pub mod error;
pub mod handlers;
pub mod router;

pub use error::{ApiError, ErrorBody};
pub use router::router;

use crate::service::OrderService;
use axum::Router;
use ingest_framework::Metrics;
use std::future::IntoFuture;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OrderService>,
    pub metrics: Arc<dyn Metrics>,
}

/// Serves `router` until `cancel` fires, then waits at most `grace` for in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
    grace: Duration,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening");
    }

    let shutdown = cancel.clone();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        finished = &mut server => return finished.map_err(io::Error::other)?,
        _ = cancel.cancelled() => {}
    }

    match time::timeout(grace, &mut server).await {
        Ok(finished) => {
            info!("Server drained");
            finished.map_err(io::Error::other)?
        }
        Err(_) => {
            warn!(grace_ms = grace.as_millis() as u64, "Grace period elapsed, dropping open connections");
            server.abort();
            Ok(())
        }
    }
}
