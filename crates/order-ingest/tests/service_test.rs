use ingest_framework::{Cache, Counter, LruCache, MetricsRegistry};
use order_ingest::generator::demo_order;
use order_ingest::model::Order;
use order_ingest::service::{OrderService, ProcessOutcome, ServiceError};
use order_ingest::storage::{MockStore, StorageError};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Fixture {
    store: Arc<MockStore>,
    cache: Arc<LruCache<Uuid, Order>>,
    metrics: Arc<MetricsRegistry>,
    service: Arc<OrderService>,
}

fn fixture(capacity: usize) -> Fixture {
    let store = Arc::new(MockStore::new());
    let cache: Arc<LruCache<Uuid, Order>> =
        Arc::new(LruCache::new(NonZeroUsize::new(capacity).unwrap()));
    let metrics = Arc::new(MetricsRegistry::new());
    let service = Arc::new(OrderService::new(store.clone(), cache.clone(), metrics.clone()));
    Fixture {
        store,
        cache,
        metrics,
        service,
    }
}

/// The same order processed twice in one run: one insert, one cache population.
#[tokio::test]
async fn test_duplicate_order_processed_once() {
    let f = fixture(10);
    let (_, order) = demo_order();

    // Only one expectation: a second add_order call would panic.
    f.store.expect_add(order.order_uid).return_ok(true);

    assert_eq!(f.service.process_order(order.clone()).await, ProcessOutcome::Inserted);
    assert_eq!(f.service.process_order(order.clone()).await, ProcessOutcome::DuplicateCached);

    f.store.verify();
    assert_eq!(f.cache.len(), 1);
    assert_eq!(f.metrics.counter(Counter::Accepted), 1);
    assert_eq!(f.metrics.counter(Counter::StorageWrites), 1);
    assert_eq!(f.metrics.counter(Counter::CacheHits), 1);
}

#[tokio::test]
async fn test_storage_duplicate_leaves_cache_untouched() {
    let f = fixture(10);
    let (_, order) = demo_order();
    f.store.expect_add(order.order_uid).return_ok(false);

    assert_eq!(f.service.process_order(order).await, ProcessOutcome::DuplicateStored);

    f.store.verify();
    assert!(f.cache.is_empty());
    assert_eq!(f.metrics.counter(Counter::Accepted), 0);
}

#[tokio::test]
async fn test_storage_failure_drops_order() {
    let f = fixture(10);
    let (_, order) = demo_order();
    f.store
        .expect_add(order.order_uid)
        .return_err(StorageError::Unavailable("connection reset".to_string()));

    assert_eq!(f.service.process_order(order).await, ProcessOutcome::Failed);

    f.store.verify();
    assert!(f.cache.is_empty());
}

/// Cold cache: one storage read and one cache write; the second lookup never reaches storage.
#[tokio::test]
async fn test_get_reads_through_once() {
    let f = fixture(10);
    let (_, order) = demo_order();
    let id = order.order_uid;
    f.store.expect_get(id).return_ok(order.clone());

    assert_eq!(f.service.get(id).await.unwrap(), order);
    assert_eq!(f.cache.len(), 1);
    assert_eq!(f.service.get(id).await.unwrap(), order);

    f.store.verify();
    assert_eq!(f.metrics.counter(Counter::StorageReads), 1);
    assert_eq!(f.metrics.counter(Counter::CacheMisses), 1);
    assert_eq!(f.metrics.counter(Counter::CacheHits), 1);
}

#[tokio::test]
async fn test_get_not_found_is_distinguished() {
    let f = fixture(10);
    let id = Uuid::new_v4();
    f.store.expect_get(id).return_err(StorageError::NotFound(id));

    let err = f.service.get(id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(missing) if missing == id));
    assert!(f.cache.is_empty());

    let other = Uuid::new_v4();
    f.store
        .expect_get(other)
        .return_err(StorageError::Unavailable("timeout".to_string()));
    let err = f.service.get(other).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(StorageError::Unavailable(_))));

    f.store.verify();
}

#[tokio::test]
async fn test_list_passes_through_without_caching() {
    let f = fixture(10);
    let (_, a) = demo_order();
    let (_, b) = demo_order();
    f.store.expect_list().return_ok(vec![a.clone(), b.clone()]);

    assert_eq!(f.service.list().await.unwrap(), vec![a, b]);

    f.store.verify();
    assert!(f.cache.is_empty());
}

#[tokio::test]
async fn test_init_warms_cache() {
    let f = fixture(2);
    let orders: Vec<Order> = (0..3).map(|_| demo_order().1).collect();
    f.store.expect_list().return_ok(orders.clone());

    f.service.init().await;

    f.store.verify();
    // Capacity 2: the first order was evicted by the last.
    assert_eq!(f.cache.len(), 2);
    assert_eq!(f.cache.get(&orders[0].order_uid), None);
    assert_eq!(f.cache.keys(), vec![orders[2].order_uid, orders[1].order_uid]);
}

#[tokio::test]
async fn test_init_failure_starts_cold() {
    let f = fixture(10);
    f.store
        .expect_list()
        .return_err(StorageError::Unavailable("down".to_string()));

    f.service.init().await;

    f.store.verify();
    assert!(f.cache.is_empty());
}

#[tokio::test]
async fn test_run_drains_channel_until_closed() {
    let f = fixture(10);
    let (_, first) = demo_order();
    let (_, second) = demo_order();
    let first_uid = first.order_uid;
    f.store.expect_add(first_uid).return_ok(true);
    f.store.expect_add(second.order_uid).return_ok(true);

    let (sender, receiver) = mpsc::channel(10);
    let handle = f.service.clone().run(receiver, CancellationToken::new());

    sender.send(first.clone()).await.unwrap();
    sender.send(second.clone()).await.unwrap();
    sender.send(first).await.unwrap();
    drop(sender);
    handle.await.unwrap();

    f.store.verify();
    assert_eq!(f.metrics.counter(Counter::Accepted), 2);
    // The duplicate lookup promoted the first order.
    assert_eq!(f.cache.keys(), vec![first_uid, second.order_uid]);
}

#[tokio::test]
async fn test_cancelled_run_drains_buffered_orders() {
    let f = fixture(10);
    let (sender, receiver) = mpsc::channel(10);
    let mut uids = Vec::new();
    for _ in 0..3 {
        let (_, order) = demo_order();
        f.store.expect_add(order.order_uid).return_ok(true);
        uids.push(order.order_uid);
        sender.send(order).await.unwrap();
    }

    let cancel = CancellationToken::new();
    cancel.cancel();
    f.service.clone().run(receiver, cancel).await.unwrap();

    f.store.verify();
    assert_eq!(f.metrics.counter(Counter::Accepted), 3);
    // The receiver is closed: nothing more can be handed over.
    let (_, late) = demo_order();
    assert!(sender.send(late).await.is_err());
}
