//! # System Lifecycle & Orchestration
//!
//! Each component of the pipeline is simple on its own; wiring them together is where the
//! complexity lives. [`OrderSystem`] is the conductor that builds, starts and stops them.
//!
//! ## Startup Order
//!
//! 1. **Shared components**: metrics registry, LRU cache, message bus.
//! 2. **Service**: [`OrderService`](crate::service::OrderService), then `init` to warm the
//!    cache from storage before any order arrives.
//! 3. **Tasks**, each holding a clone of one [`CancellationToken`](tokio_util::sync::CancellationToken):
//!
//! ```text
//!   publish loop ──► [topic] ──► subscriber pump ──► channel ──► processing loop
//!   health loop (bus + storage probes)
//! ```
//!
//! The pump is started before the processing loop so that the channel exists; the publish
//! loop is started last so nothing is published before someone is listening.
//!
//! ## Graceful Shutdown
//!
//! 1. **Cancel the token**: every loop observes it at its next suspension point.
//! 2. **Loops clean up**: the publisher and the subscriber close their bus connections, and the
//!    subscriber drops the channel sender.
//! 3. **Await completion**: [`OrderSystem::shutdown`] joins every task, then logs the final
//!    metric counters.
//!
//! A record the pump was blocked on when the token fired is not committed and is delivered
//! again on the next start.

pub mod order_system;

pub use order_system::*;

use crate::config::ConfigError;
use thiserror::Error;

/// Anything that stops the process from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
