use super::StartupError;
use crate::api::{self, AppState};
use crate::config::{AppConfig, ConfigError};
use crate::generator::demo_order;
use crate::model::Order;
use crate::service::OrderService;
use crate::storage::{OrderStore, StoreProbe};
use axum::Router;
use ingest_framework::memory::{MemoryBus, OffsetReset};
use ingest_framework::{HealthMonitor, LruCache, MetricsRegistry, Publisher, Subscriber};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Owns every running component of the ingest pipeline.
pub struct OrderSystem {
    bus: MemoryBus,
    metrics: Arc<MetricsRegistry>,
    service: Arc<OrderService>,
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl OrderSystem {
    /// Builds and starts the pipeline on top of `store`.
    pub async fn start(config: &AppConfig, store: Arc<dyn OrderStore>) -> Result<Self, StartupError> {
        let capacity = NonZeroUsize::new(config.cache.size).ok_or(ConfigError::InvalidValue {
            field: "cache.size",
            reason: "must be > 0".to_string(),
        })?;

        let metrics = Arc::new(MetricsRegistry::new());
        let cache: Arc<LruCache<Uuid, Order>> = Arc::new(LruCache::new(capacity));
        let bus = MemoryBus::new();
        let cancel = CancellationToken::new();

        let service = Arc::new(OrderService::new(store.clone(), cache, metrics.clone()));
        service.init().await;

        let broker = &config.broker;
        let subscriber: Subscriber<Order, _, _> = Subscriber::new(
            bus.consumer(
                broker.topic.as_str(),
                broker.group_id.as_str(),
                OffsetReset::from_first_offset(broker.first_offset),
                broker.poll_batch,
            ),
            bus.producer(broker.topic_dlq.as_str()),
            metrics.clone(),
        )
        .with_poll_retry(broker.poll_retry());
        let (orders, pump) = subscriber.subscribe(cancel.clone());

        let processing = service.clone().run(orders, cancel.clone());

        let health = HealthMonitor::new(
            Arc::new(bus.clone()),
            Arc::new(StoreProbe::new(store)),
            metrics.clone(),
            config.health.interval(),
        )
        .spawn(cancel.clone());

        let publisher = Publisher::new(bus.producer(broker.topic.as_str()));
        let publish = publisher.interval_publish(demo_order, broker.publish_interval(), cancel.clone());

        info!(
            topic = %broker.topic,
            topic_dlq = %broker.topic_dlq,
            cache_size = capacity.get(),
            "Order system started"
        );

        Ok(Self {
            bus,
            metrics,
            service,
            cancel,
            handles: vec![
                ("subscriber", pump),
                ("order_service", processing),
                ("health", health),
                ("publisher", publish),
            ],
        })
    }

    pub fn bus(&self) -> &MemoryBus {
        &self.bus
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn service(&self) -> &Arc<OrderService> {
        &self.service
    }

    /// The token every task stops on. Cancelling it starts shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The read API bound to this system's service and metrics.
    pub fn router(&self) -> Router {
        api::router(AppState {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
        })
    }

    /// Cancels every task and waits for all of them to finish.
    pub async fn shutdown(self) {
        info!("Shutdown");
        self.cancel.cancel();

        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "Task ended abnormally");
            }
        }

        for (name, value) in self.metrics.snapshot() {
            info!(counter = name, value, "Final metrics");
        }
        info!("Order system stopped");
    }
}
