//! # Order Service
//!
//! Sits between the subscriber's output channel, the cache and storage.
//!
//! ## Write path
//!
//! ```text
//! order ──► cache hit? ──yes──► duplicate (skip storage and cache)
//!               │no
//!               ▼
//!          store.add_order ──false──► duplicate (cache untouched)
//!               │true
//!               ▼
//!          Accepted += 1, cache.set
//! ```
//!
//! The subscriber has already committed the offset when an order arrives here, so a storage
//! failure drops the order: storage writes are at-most-once.
//!
//! ## Read path
//!
//! [`OrderService::get`] is read-through: a miss loads from storage and populates the cache.
//! [`OrderService::list`] always goes to storage.

use crate::model::Order;
use crate::storage::{OrderStore, StorageError};
use ingest_framework::{Cache, Counter, Metrics};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("order {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Storage(other),
        }
    }
}

/// What happened to one order on the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Inserted,
    /// Already handled by this process (cache hit).
    DuplicateCached,
    /// Storage already had the UID.
    DuplicateStored,
    /// Storage rejected the insert; the order is dropped.
    Failed,
}

pub type OrderCache = dyn Cache<Uuid, Order>;

/// Orchestrates dedup, persistence and caching of orders.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<OrderCache>,
    metrics: Arc<dyn Metrics>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<OrderCache>, metrics: Arc<dyn Metrics>) -> Self {
        Self { store, cache, metrics }
    }

    /// Seeds the cache with every stored order. A storage failure leaves the cache cold.
    pub async fn init(&self) {
        self.metrics.increment(Counter::StorageReads);
        match self.store.list().await {
            Ok(orders) => {
                for order in orders {
                    self.cache.set(order.order_uid, order);
                }
                info!(size = self.cache.len(), "Cache warmed");
            }
            Err(e) => error!(error = %e, "Cache warm-up failed, starting cold"),
        }
    }

    /// Spawns the processing loop. It ends when the channel closes or `cancel` fires.
    ///
    /// On cancellation the channel is closed and the orders already buffered in it are still
    /// processed, since their offsets are committed.
    pub fn run(self: Arc<Self>, mut orders: mpsc::Receiver<Order>, cancel: CancellationToken) -> JoinHandle<()> {
        let span = tracing::info_span!("order_service");
        tokio::spawn(
            async move {
                info!("Order service started");
                loop {
                    let order = tokio::select! {
                        _ = cancel.cancelled() => {
                            self.drain(&mut orders).await;
                            break;
                        }
                        order = orders.recv() => order,
                    };
                    let Some(order) = order else {
                        info!("Input channel closed");
                        break;
                    };
                    self.process_order(order).await;
                }
                info!("Order service stopped");
            }
            .instrument(span),
        )
    }

    async fn drain(&self, orders: &mut mpsc::Receiver<Order>) {
        orders.close();
        let mut drained = 0usize;
        while let Some(order) = orders.recv().await {
            self.process_order(order).await;
            drained += 1;
        }
        if drained > 0 {
            info!(drained, "Processed buffered orders before stopping");
        }
    }

    pub async fn process_order(&self, order: Order) -> ProcessOutcome {
        let uid = order.order_uid;

        if self.cache.get(&uid).is_some() {
            self.metrics.increment(Counter::CacheHits);
            warn!(%uid, "Duplicate order, already cached");
            return ProcessOutcome::DuplicateCached;
        }
        self.metrics.increment(Counter::CacheMisses);

        self.metrics.increment(Counter::StorageWrites);
        let inserted = match self.store.add_order(&order).await {
            Ok(inserted) => inserted,
            Err(e) => {
                error!(%uid, error = %e, "Failed to store order");
                return ProcessOutcome::Failed;
            }
        };

        if !inserted {
            warn!(%uid, "Duplicate order, already stored");
            return ProcessOutcome::DuplicateStored;
        }

        info!(%uid, "Order accepted");
        self.metrics.increment(Counter::Accepted);
        self.cache.set(uid, order);
        ProcessOutcome::Inserted
    }

    /// Read-through lookup.
    pub async fn get(&self, id: Uuid) -> Result<Order, ServiceError> {
        if let Some(order) = self.cache.get(&id) {
            self.metrics.increment(Counter::CacheHits);
            return Ok(order);
        }
        self.metrics.increment(Counter::CacheMisses);

        self.metrics.increment(Counter::StorageReads);
        let order = self.store.get_order(id).await?;
        self.cache.set(id, order.clone());
        Ok(order)
    }

    pub async fn list(&self) -> Result<Vec<Order>, ServiceError> {
        self.metrics.increment(Counter::StorageReads);
        Ok(self.store.list().await?)
    }
}
