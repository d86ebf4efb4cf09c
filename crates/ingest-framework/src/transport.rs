//! # Transport Traits
//!
//! The pipeline talks to the message bus only through these two traits. A connection is
//! owned by exactly one task (the publish loop, or the subscriber pump) and is closed once,
//! by its owner, at shutdown.

use crate::error::BrokerError;
use crate::message::Record;
use async_trait::async_trait;

/// Reading side of a bus connection, bound to one topic and one consumer group.
#[async_trait]
pub trait Consumer: Send + 'static {
    /// Fetches the next batch of records in offset order.
    ///
    /// Waits a bounded amount of time for new data and may return an empty batch.
    async fn poll(&mut self) -> Result<Vec<Record>, BrokerError>;

    /// Marks `record` (and everything before it) as processed for this group.
    async fn commit(&mut self, record: &Record) -> Result<(), BrokerError>;

    /// Liveness check against the bus.
    async fn ping(&self) -> Result<(), BrokerError>;

    /// Releases the connection. Later calls fail with [`BrokerError::Closed`].
    async fn close(&mut self);
}

/// Writing side of a bus connection, bound to one default topic.
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    /// Synchronously appends one record and returns the offset it was written at.
    async fn produce(&self, key: &[u8], value: &[u8]) -> Result<u64, BrokerError>;

    /// Liveness check against the bus.
    async fn ping(&self) -> Result<(), BrokerError>;

    /// Releases the connection. Later calls fail with [`BrokerError::Closed`].
    async fn close(&mut self);
}
