use super::{OrderStore, StorageError};
use crate::model::Order;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-process order table keyed by UID.
///
/// `set_available(false)` makes every call fail with [`StorageError::Unavailable`], which is
/// how tests simulate an outage.
pub struct MemoryStore {
    orders: RwLock<HashMap<Uuid, Order>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    fn check(&self) -> Result<(), StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn add_order(&self, order: &Order) -> Result<bool, StorageError> {
        self.check()?;
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_uid) {
            debug!(uid = %order.order_uid, "Insert skipped, key exists");
            return Ok(false);
        }
        orders.insert(order.order_uid, order.clone());
        Ok(true)
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, StorageError> {
        self.check()?;
        self.orders
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Order>, StorageError> {
        self.check()?;
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        orders.sort_by(|a, b| {
            a.date_created
                .cmp(&b.date_created)
                .then_with(|| a.order_uid.cmp(&b.order_uid))
        });
        Ok(orders)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::demo_order;
    use chrono::Duration;

    #[tokio::test]
    async fn test_add_order_is_idempotent() {
        let store = MemoryStore::new();
        let (_, order) = demo_order();

        assert!(store.add_order(&order).await.unwrap());
        assert!(!store.add_order(&order).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.get_order(id).await, Err(StorageError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_list_ordered_by_creation_time() {
        let store = MemoryStore::new();
        let (_, mut newer) = demo_order();
        let (_, mut older) = demo_order();
        older.date_created = newer.date_created - Duration::hours(1);
        newer.date_created += Duration::seconds(1);

        store.add_order(&newer).await.unwrap();
        store.add_order(&older).await.unwrap();

        let uids: Vec<Uuid> = store.list().await.unwrap().iter().map(|o| o.order_uid).collect();
        assert_eq!(uids, vec![older.order_uid, newer.order_uid]);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryStore::new();
        let (_, order) = demo_order();
        store.set_available(false);

        assert!(matches!(store.add_order(&order).await, Err(StorageError::Unavailable(_))));
        assert!(matches!(store.list().await, Err(StorageError::Unavailable(_))));
        assert!(store.ping().await.is_err());

        store.set_available(true);
        assert!(store.ping().await.is_ok());
        assert!(store.is_empty().await);
    }
}
