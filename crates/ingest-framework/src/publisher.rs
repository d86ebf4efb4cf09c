//! # Publisher
//!
//! Writes serialized values to the configured topic, either one at a time with
//! [`Publisher::publish`] or on a fixed period with [`Publisher::interval_publish`].

use crate::error::BrokerError;
use crate::transport::Producer;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

/// Producer-side wrapper that owns one bus connection.
pub struct Publisher<P: Producer> {
    producer: P,
}

impl<P: Producer> Publisher<P> {
    pub fn new(producer: P) -> Self {
        Self { producer }
    }

    /// Encodes `value` as JSON and writes it keyed by `key`.
    ///
    /// Returns the encoded size. Transport errors are returned unchanged.
    pub async fn publish<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
    ) -> Result<usize, BrokerError> {
        let bytes = serde_json::to_vec(value)?;
        self.producer.produce(key.as_bytes(), &bytes).await?;
        Ok(bytes.len())
    }

    /// Spawns a loop that publishes `next()` every `interval` until `cancel` fires.
    ///
    /// Each tick waits a full interval, then acts; the loop does not catch up on missed
    /// ticks. A failed publish is logged and the loop carries on.
    pub fn interval_publish<V, F>(
        self,
        mut next: F,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()>
    where
        V: Serialize + Send + Sync + 'static,
        F: FnMut() -> (String, V) + Send + 'static,
    {
        let span = tracing::info_span!("publisher");
        tokio::spawn(
            async move {
                info!(interval_ms = interval.as_millis() as u64, "Publisher started");

                let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }

                    let (key, value) = next();
                    match self.publish(&key, &value).await {
                        Ok(bytes) => info!(uid = %key, bytes, "Published"),
                        Err(e) => error!(uid = %key, error = %e, "Publish failed"),
                    }
                }

                self.close().await;
                info!("Publisher stopped");
            }
            .instrument(span),
        )
    }

    /// Closes the underlying connection.
    pub async fn close(mut self) {
        self.producer.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_publish_returns_encoded_size() {
        let bus = MemoryBus::new();
        let publisher = Publisher::new(bus.producer("orders"));

        let value = json!({"order_uid": "abc"});
        let size = publisher.publish("abc", &value).await.unwrap();

        let records = bus.records("orders");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, b"abc");
        assert_eq!(records[0].value.len(), size);
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&records[0].value).unwrap(), value);
    }

    #[tokio::test]
    async fn test_publish_surfaces_transport_error() {
        let bus = MemoryBus::new();
        let publisher = Publisher::new(bus.producer("orders"));
        bus.set_reachable(false);

        let result = publisher.publish("abc", &1u32).await;
        assert!(matches!(result, Err(BrokerError::Transport(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_publish_survives_failures() {
        let bus = MemoryBus::new();
        let publisher = Publisher::new(bus.producer("orders"));
        let cancel = CancellationToken::new();
        let counter = Arc::new(AtomicU32::new(0));

        let calls = counter.clone();
        let handle = publisher.interval_publish(
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                (format!("key-{n}"), n)
            },
            Duration::from_secs(1),
            cancel.clone(),
        );

        // Nothing before the first full interval.
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(1000)).await; // t = 1.5s
        assert_eq!(bus.records("orders").len(), 1);

        bus.set_reachable(false);
        time::sleep(Duration::from_millis(1000)).await; // t = 2.5s, publish fails
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        bus.set_reachable(true);
        time::sleep(Duration::from_millis(1000)).await; // t = 3.5s
        assert_eq!(bus.records("orders").len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
