//! # Ingest Framework
//!
//! This crate provides the payload-agnostic building blocks of an event-ingestion pipeline:
//! a message-bus publisher and subscriber with dead-letter routing, a bounded LRU cache,
//! liveness probes and metrics. Domain crates plug in a concrete [`Payload`] type and a
//! storage backend; everything between the bus and the service is written once, here.
//!
//! ## Pipeline at a Glance
//!
//! ```text
//!  Publisher ──► [topic] ──► Subscriber ──► bounded channel (10) ──► service
//!                               │
//!                               └──► [dead-letter topic]   (decode / validation failures)
//! ```
//!
//! - **Publisher**: serializes values to canonical JSON and writes them to the topic, either
//!   on demand or on a fixed timer.
//! - **Subscriber**: one pump task per consumer. Polls, decodes, validates, forwards or
//!   dead-letters, then commits. Forward progress is guaranteed: every classified record is
//!   committed exactly once.
//! - **Cache**: [`LruCache`] behind the [`Cache`] trait, one exclusive lock per operation.
//! - **Health**: [`HealthMonitor`] pings the bus and storage on a timer and sets status gauges.
//!
//! ## Quick Start
//!
//! ```rust
//! use ingest_framework::memory::{MemoryBus, OffsetReset};
//! use ingest_framework::{MetricsRegistry, Payload, Publisher, Subscriber};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct Reading { sensor: String, celsius: f32 }
//!
//! #[derive(Debug)]
//! struct TooHot;
//! impl std::fmt::Display for TooHot {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "too hot") }
//! }
//! impl std::error::Error for TooHot {}
//!
//! impl Payload for Reading {
//!     type Key = String;
//!     type Error = TooHot;
//!     fn key(&self) -> String { self.sensor.clone() }
//!     fn validate(&self) -> Result<(), TooHot> {
//!         if self.celsius > 100.0 { Err(TooHot) } else { Ok(()) }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = MemoryBus::new();
//!     let metrics = Arc::new(MetricsRegistry::new());
//!     let cancel = CancellationToken::new();
//!
//!     let subscriber: Subscriber<Reading, _, _> = Subscriber::new(
//!         bus.consumer("readings", "svc", OffsetReset::Earliest, 10),
//!         bus.producer("readings.dlq"),
//!         metrics,
//!     );
//!     let (mut readings, pump) = subscriber.subscribe(cancel.clone());
//!
//!     let publisher = Publisher::new(bus.producer("readings"));
//!     let reading = Reading { sensor: "s1".into(), celsius: 21.5 };
//!     publisher.publish("s1", &reading).await.unwrap();
//!
//!     let received = readings.recv().await.unwrap();
//!     assert_eq!(received.sensor, "s1");
//!
//!     cancel.cancel();
//!     pump.await.unwrap();
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each loop (publish, pump, health) runs in its own Tokio task and stops on one shared
//!   [`CancellationToken`](tokio_util::sync::CancellationToken).
//! - Bus connections are owned by exactly one task; nothing else calls them.
//! - The cache is the only structure shared between tasks, guarded by a single lock.
//!
//! ## Testing
//!
//! The [`memory`] transport is fully inspectable (`records`, `committed`) and supports fault
//! injection (`set_reachable`, `set_writable`), so the whole pipeline can be tested in-process.

pub mod cache;
pub mod error;
pub mod health;
pub mod logging;
pub mod memory;
pub mod message;
pub mod metrics;
pub mod payload;
pub mod publisher;
pub mod subscriber;
pub mod transport;

// Re-export core types for convenience
pub use cache::{Cache, LruCache};
pub use error::{BoxError, BrokerError, RejectReason};
pub use health::{HealthMonitor, Probe};
pub use message::Record;
pub use metrics::{Counter, Gauge, Metrics, MetricsRegistry};
pub use payload::Payload;
pub use publisher::Publisher;
pub use subscriber::{Subscriber, OUTPUT_CAPACITY};
pub use transport::{Consumer, Producer};
