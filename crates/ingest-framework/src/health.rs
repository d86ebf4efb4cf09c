//! # Health Monitor
//!
//! Periodic liveness probes for the pipeline's external collaborators. Every tick launches the
//! bus probe and the storage probe concurrently, each bounded by half the tick interval, and
//! records each outcome on its own status gauge (1 = up, 0 = down or timed out).
//!
//! Rounds never overlap: the next tick is only awaited after both probes of the current round
//! have finished.

use crate::error::BoxError;
use crate::metrics::{Gauge, Metrics};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

/// Something that can be pinged for liveness.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), BoxError>;
}

/// Runs the bus and storage probes on a fixed period.
pub struct HealthMonitor {
    bus: Arc<dyn Probe>,
    storage: Arc<dyn Probe>,
    metrics: Arc<dyn Metrics>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(
        bus: Arc<dyn Probe>,
        storage: Arc<dyn Probe>,
        metrics: Arc<dyn Metrics>,
        interval: Duration,
    ) -> Self {
        Self {
            bus,
            storage,
            metrics,
            interval,
        }
    }

    /// Spawns the monitor loop. It stops when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel).instrument(tracing::info_span!("health")))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Health monitor started");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.round().await;
        }

        info!("Health monitor stopped");
    }

    /// One probe round: both probes in parallel, each with its own timeout and gauge.
    pub async fn round(&self) {
        let timeout = self.interval / 2;
        tokio::join!(
            check(self.bus.as_ref(), Gauge::BusStatus, timeout, self.metrics.as_ref()),
            check(self.storage.as_ref(), Gauge::StorageStatus, timeout, self.metrics.as_ref()),
        );
    }
}

async fn check(probe: &dyn Probe, gauge: Gauge, timeout: Duration, metrics: &dyn Metrics) {
    let status = match time::timeout(timeout, probe.ping()).await {
        Ok(Ok(())) => {
            debug!(probe = probe.name(), "Probe ok");
            1
        }
        Ok(Err(e)) => {
            warn!(probe = probe.name(), error = %e, "Probe failed");
            0
        }
        Err(_) => {
            warn!(probe = probe.name(), timeout_ms = timeout.as_millis() as u64, "Probe timed out");
            0
        }
    };
    metrics.set_gauge(gauge, status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsRegistry;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubProbe {
        healthy: AtomicBool,
        hang: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubProbe {
        fn new(healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(healthy),
                hang: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Probe for StubProbe {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn ping(&self) -> Result<(), BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err("down".into())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_probe_sets_its_own_gauge() {
        let bus = StubProbe::new(true);
        let storage = StubProbe::new(false);
        let metrics = Arc::new(MetricsRegistry::new());
        let monitor = HealthMonitor::new(
            bus.clone(),
            storage.clone(),
            metrics.clone(),
            Duration::from_secs(2),
        );

        monitor.round().await;
        assert_eq!(metrics.gauge(Gauge::BusStatus), 1);
        assert_eq!(metrics.gauge(Gauge::StorageStatus), 0);

        storage.healthy.store(true, Ordering::SeqCst);
        bus.hang.store(true, Ordering::SeqCst);
        monitor.round().await;
        assert_eq!(metrics.gauge(Gauge::BusStatus), 0);
        assert_eq!(metrics.gauge(Gauge::StorageStatus), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_waits_interval_before_first_round() {
        let bus = StubProbe::new(true);
        let storage = StubProbe::new(true);
        let metrics = Arc::new(MetricsRegistry::new());
        let cancel = CancellationToken::new();
        let handle = HealthMonitor::new(
            bus.clone(),
            storage.clone(),
            metrics.clone(),
            Duration::from_secs(10),
        )
        .spawn(cancel.clone());

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(bus.calls.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(21)).await;
        assert_eq!(bus.calls.load(Ordering::SeqCst), 2);
        assert_eq!(storage.calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
