//! # Observability & Tracing
//!
//! This module provides the tracing infrastructure for the whole pipeline.
//!
//! The [`setup_tracing`] function initializes structured logging with the `tracing` crate.
//! Every long-lived task runs inside its own span (`publisher`, `subscriber`, `order_service`,
//! `health`), so each line carries the component that produced it.
//!
//! ## Configuration
//!
//! - `RUST_LOG` wins when set; otherwise the configured level applies.
//! - `compact` (default) hides the module path and shows spans inline.
//! - `json` emits one object per line for log shippers.
//!
//! ```bash
//! RUST_LOG=info cargo run -- --config config.example.toml
//! RUST_LOG=ingest_framework=debug cargo run -- --config config.example.toml
//! ```
//!
//! With `debug` enabled, every polled record is logged once on arrival:
//!
//! ```text
//! DEBUG subscriber: Received uid="6f1c..." offset=41 bytes=1187
//! INFO subscriber: Dead-lettered uid="broken" dlq_offset=3
//! INFO order_service: Order accepted uid=6f1c...
//! ```

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Installs the global subscriber. Call once, from `main`.
pub fn setup_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false); // Spans already name the component

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
