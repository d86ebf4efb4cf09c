//! # Metrics
//!
//! Components receive an `Arc<dyn Metrics>` at construction instead of touching global state.
//! [`MetricsRegistry`] owns its own `prometheus::Registry`, so two instances never share
//! series; tests read values back directly.

use prometheus::{IntCounter, IntGauge, Opts, Registry};

/// Monotonic counters pushed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Read API requests.
    Requests,
    /// Payloads newly persisted by the consuming service.
    Accepted,
    /// Records routed to the dead-letter topic.
    DeadLettered,
    CacheHits,
    CacheMisses,
    StorageReads,
    StorageWrites,
}

impl Counter {
    pub const ALL: [Counter; 7] = [
        Counter::Requests,
        Counter::Accepted,
        Counter::DeadLettered,
        Counter::CacheHits,
        Counter::CacheMisses,
        Counter::StorageReads,
        Counter::StorageWrites,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Requests => "requests_total",
            Counter::Accepted => "accepted_total",
            Counter::DeadLettered => "dead_lettered_total",
            Counter::CacheHits => "cache_hits_total",
            Counter::CacheMisses => "cache_misses_total",
            Counter::StorageReads => "storage_reads_total",
            Counter::StorageWrites => "storage_writes_total",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Counter::Requests => "Read API requests",
            Counter::Accepted => "Payloads newly persisted",
            Counter::DeadLettered => "Records routed to the dead-letter topic",
            Counter::CacheHits => "Cache lookups that found the key",
            Counter::CacheMisses => "Cache lookups that missed",
            Counter::StorageReads => "Storage read calls",
            Counter::StorageWrites => "Storage write calls",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Status gauges set by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    BusStatus,
    StorageStatus,
}

impl Gauge {
    pub const ALL: [Gauge; 2] = [Gauge::BusStatus, Gauge::StorageStatus];

    pub fn name(self) -> &'static str {
        match self {
            Gauge::BusStatus => "bus_status",
            Gauge::StorageStatus => "storage_status",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Gauge::BusStatus => "Message bus reachability (1 up, 0 down)",
            Gauge::StorageStatus => "Storage reachability (1 up, 0 down)",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub trait Metrics: Send + Sync {
    fn increment(&self, counter: Counter);

    fn set_gauge(&self, gauge: Gauge, value: i64);
}

/// Prometheus-backed counters and gauges, registered in a per-instance registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    counters: Vec<IntCounter>,
    gauges: Vec<IntGauge>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let registry = Registry::new();

        let counters: Vec<IntCounter> = Counter::ALL
            .iter()
            .map(|c| IntCounter::with_opts(Opts::new(c.name(), c.help())).expect("counter metric"))
            .collect();
        let gauges: Vec<IntGauge> = Gauge::ALL
            .iter()
            .map(|g| IntGauge::with_opts(Opts::new(g.name(), g.help())).expect("gauge metric"))
            .collect();

        for counter in &counters {
            registry
                .register(Box::new(counter.clone()))
                .expect("register counter");
        }
        for gauge in &gauges {
            registry
                .register(Box::new(gauge.clone()))
                .expect("register gauge");
        }

        Self {
            registry,
            counters,
            gauges,
        }
    }

    /// The underlying registry, for an exporter to gather from.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters[counter.index()].get()
    }

    pub fn gauge(&self, gauge: Gauge) -> i64 {
        self.gauges[gauge.index()].get()
    }

    /// Every counter as `(name, value)`, in declaration order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        Counter::ALL
            .iter()
            .map(|c| (c.name(), self.counter(*c)))
            .collect()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("counters", &self.snapshot())
            .finish()
    }
}

impl Metrics for MetricsRegistry {
    fn increment(&self, counter: Counter) {
        self.counters[counter.index()].inc();
    }

    fn set_gauge(&self, gauge: Gauge, value: i64) {
        self.gauges[gauge.index()].set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_registry_counts() {
        let registry = MetricsRegistry::new();
        registry.increment(Counter::Accepted);
        registry.increment(Counter::Accepted);
        registry.increment(Counter::DeadLettered);
        registry.set_gauge(Gauge::BusStatus, 1);

        assert_eq!(registry.counter(Counter::Accepted), 2);
        assert_eq!(registry.counter(Counter::DeadLettered), 1);
        assert_eq!(registry.counter(Counter::Requests), 0);
        assert_eq!(registry.gauge(Gauge::BusStatus), 1);
        assert_eq!(registry.gauge(Gauge::StorageStatus), 0);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), Counter::ALL.len());
        assert!(snapshot.contains(&("accepted_total", 2)));
    }

    #[test]
    fn test_registries_are_isolated() {
        let first = MetricsRegistry::new();
        let second = MetricsRegistry::new();
        first.increment(Counter::CacheHits);

        assert_eq!(first.counter(Counter::CacheHits), 1);
        assert_eq!(second.counter(Counter::CacheHits), 0);
    }

    #[test]
    fn test_registry_exposes_prometheus_families() {
        let registry = MetricsRegistry::new();
        registry.increment(Counter::StorageWrites);
        registry.set_gauge(Gauge::StorageStatus, 1);

        let families = registry.registry().gather();
        assert_eq!(families.len(), Counter::ALL.len() + Gauge::ALL.len());

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("storage_writes_total 1"));
        assert!(text.contains("storage_status 1"));
        assert!(text.contains("dead_lettered_total 0"));
    }
}
