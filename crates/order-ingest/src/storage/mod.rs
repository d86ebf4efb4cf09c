//! # Order Storage
//!
//! The storage contract the service depends on, plus two implementations:
//!
//! - [`MemoryStore`]: the in-process store used by the binary and by integration tests.
//! - [`MockStore`]: an expectation-based fake for isolating [`OrderService`](crate::service::OrderService).
//!
//! ## Contract
//!
//! | Operation | Success | Distinguished failure |
//! |-----------|---------|-----------------------|
//! | `add_order` | `true` if a row was created, `false` if the UID already existed | none: a conflict is not an error |
//! | `get_order` | the order | [`StorageError::NotFound`] |
//! | `list` | every order | none |
//! | `ping` | store reachable | none |
//!
//! Any other failure is [`StorageError::Unavailable`].

pub mod memory;
pub mod mock;

pub use memory::MemoryStore;
pub use mock::MockStore;

use crate::model::Order;
use async_trait::async_trait;
use ingest_framework::{BoxError, Probe};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("order {0} not found")]
    NotFound(Uuid),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable order storage.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Idempotent insert. Returns whether a new row was created.
    async fn add_order(&self, order: &Order) -> Result<bool, StorageError>;

    async fn get_order(&self, id: Uuid) -> Result<Order, StorageError>;

    async fn list(&self) -> Result<Vec<Order>, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}

/// Exposes any [`OrderStore`] to the health monitor.
pub struct StoreProbe<S: ?Sized> {
    store: Arc<S>,
}

impl<S: OrderStore + ?Sized> StoreProbe<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: OrderStore + ?Sized> Probe for StoreProbe<S> {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn ping(&self) -> Result<(), BoxError> {
        self.store.ping().await.map_err(Into::into)
    }
}
