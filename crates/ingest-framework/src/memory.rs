//! # In-Memory Bus
//!
//! `MemoryBus` is an in-process message bus implementing the [`Consumer`] and [`Producer`]
//! traits. It keeps append-only topics, per-group committed offsets and an offset-reset
//! policy, so the pipeline behaves against it exactly as it would against a broker:
//! records are re-delivered to a group until they are committed.
//!
//! ## Retention
//!
//! Offsets are absolute and never reused. A topic releases every record below the lowest
//! offset committed by its groups, and never holds more than the retention limit
//! (oldest records are dropped first, like a size-bounded broker log).
//!
//! ## When to use it
//!
//! | Use case | Why |
//! |----------|-----|
//! | **Single-process deployment** | No external broker to operate |
//! | **Tests** | Deterministic, inspectable topics and offsets |
//! | **Failure injection** | `set_reachable` / `set_writable` simulate outages |
//!
//! ## Example
//!
//! ```rust
//! use ingest_framework::memory::{MemoryBus, OffsetReset};
//! use ingest_framework::{Consumer, Producer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = MemoryBus::new();
//!     let producer = bus.producer("orders");
//!     let mut consumer = bus.consumer("orders", "svc", OffsetReset::Earliest, 10);
//!
//!     producer.produce(b"k1", b"{}").await.unwrap();
//!     let batch = consumer.poll().await.unwrap();
//!     assert_eq!(batch.len(), 1);
//!
//!     consumer.commit(&batch[0]).await.unwrap();
//!     assert_eq!(bus.committed("orders", "svc"), Some(1));
//! }
//! ```

use crate::error::{BoxError, BrokerError};
use crate::health::Probe;
use crate::message::Record;
use crate::transport::{Consumer, Producer};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_RETENTION: usize = 10_000;

/// Where a consumer group without a committed offset starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    /// From the first record still in the topic.
    Earliest,
    /// Only records produced after the consumer was created.
    #[default]
    Latest,
}

impl OffsetReset {
    pub fn from_first_offset(first_offset: bool) -> Self {
        if first_offset {
            OffsetReset::Earliest
        } else {
            OffsetReset::Latest
        }
    }
}

/// Retained suffix of a topic log. `base` is the offset of the first retained record.
#[derive(Default)]
struct TopicLog {
    base: u64,
    records: VecDeque<Record>,
}

impl TopicLog {
    fn end(&self) -> u64 {
        self.base + self.records.len() as u64
    }

    fn push(&mut self, key: &[u8], value: &[u8]) -> u64 {
        let offset = self.end();
        self.records.push_back(Record::new(key, value, offset));
        offset
    }

    /// Drops every record with an offset below `offset`.
    fn release_below(&mut self, offset: u64) {
        while self.base < offset && self.records.pop_front().is_some() {
            self.base += 1;
        }
    }

    fn truncate_to(&mut self, limit: usize) {
        let excess = self.records.len().saturating_sub(limit);
        self.release_below(self.base + excess as u64);
    }
}

#[derive(Default)]
struct BusState {
    topics: HashMap<String, TopicLog>,
    committed: HashMap<(String, String), u64>,
    /// Lowest offset each known group may still read: its start position, then its commit.
    low_water: HashMap<(String, String), u64>,
    unwritable: HashSet<String>,
    unreachable: bool,
}

impl BusState {
    fn check_reachable(&self) -> Result<(), BrokerError> {
        if self.unreachable {
            return Err(BrokerError::Transport("bus unreachable".to_string()));
        }
        Ok(())
    }

    /// Releases the prefix of `topic` that every known group has committed past.
    fn release_committed(&mut self, topic: &str) {
        let lowest = self
            .low_water
            .iter()
            .filter(|((t, _), _)| t == topic)
            .map(|(_, offset)| *offset)
            .min();
        if let (Some(lowest), Some(log)) = (lowest, self.topics.get_mut(topic)) {
            log.release_below(lowest);
        }
    }
}

/// Cloneable handle to a shared in-process bus.
#[derive(Clone)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
    notify: Arc<Notify>,
    poll_timeout: Duration,
    retention: usize,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::default())),
            notify: Arc::new(Notify::new()),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            retention: DEFAULT_RETENTION,
        }
    }

    /// Maximum number of records a topic keeps, committed or not.
    pub fn with_retention(mut self, max_records: usize) -> Self {
        self.retention = max_records.max(1);
        self
    }

    /// How long an empty `poll` waits for new records before returning an empty batch.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a producer whose default topic is `topic`.
    pub fn producer(&self, topic: impl Into<String>) -> MemoryProducer {
        MemoryProducer {
            bus: self.clone(),
            topic: topic.into(),
            closed: false,
        }
    }

    /// Opens a consumer for `topic` in consumer group `group`.
    ///
    /// The start position is the group's committed offset, or `reset` when the
    /// group has never committed on this topic.
    pub fn consumer(
        &self,
        topic: impl Into<String>,
        group: impl Into<String>,
        reset: OffsetReset,
        max_batch: usize,
    ) -> MemoryConsumer {
        let topic = topic.into();
        let group = group.into();
        let position = {
            let mut state = self.lock();
            let position = match state.committed.get(&(topic.clone(), group.clone())) {
                Some(offset) => *offset,
                None => match reset {
                    OffsetReset::Earliest => state.topics.get(&topic).map_or(0, |t| t.base),
                    OffsetReset::Latest => state.topics.get(&topic).map_or(0, TopicLog::end),
                },
            };
            state
                .low_water
                .insert((topic.clone(), group.clone()), position);
            position
        };
        debug!(%topic, %group, position, "Consumer opened");
        MemoryConsumer {
            bus: self.clone(),
            topic,
            group,
            position,
            max_batch: max_batch.max(1),
            closed: false,
        }
    }

    /// Snapshot of the records `topic` still retains.
    pub fn records(&self, topic: &str) -> Vec<Record> {
        self.lock()
            .topics
            .get(topic)
            .map(|log| log.records.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The next offset `group` will read from `topic`, if it ever committed.
    pub fn committed(&self, topic: &str, group: &str) -> Option<u64> {
        self.lock()
            .committed
            .get(&(topic.to_string(), group.to_string()))
            .copied()
    }

    /// Simulates the bus going away (or coming back).
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().unreachable = !reachable;
        self.notify.notify_waiters();
    }

    /// Makes writes to a single topic fail while the rest of the bus stays up.
    pub fn set_writable(&self, topic: &str, writable: bool) {
        let mut state = self.lock();
        if writable {
            state.unwritable.remove(topic);
        } else {
            state.unwritable.insert(topic.to_string());
        }
    }

    pub fn ping(&self) -> Result<(), BrokerError> {
        self.lock().check_reachable()
    }

    fn append(&self, topic: &str, key: &[u8], value: &[u8]) -> Result<u64, BrokerError> {
        let offset = {
            let mut state = self.lock();
            state.check_reachable()?;
            if state.unwritable.contains(topic) {
                return Err(BrokerError::Transport(format!("topic {topic} rejected write")));
            }
            let log = state.topics.entry(topic.to_string()).or_default();
            let offset = log.push(key, value);
            log.truncate_to(self.retention);
            offset
        };
        self.notify.notify_waiters();
        Ok(offset)
    }

    fn fetch(&self, topic: &str, position: u64, max_batch: usize) -> Result<Vec<Record>, BrokerError> {
        let state = self.lock();
        state.check_reachable()?;
        let batch = state
            .topics
            .get(topic)
            .map(|log| {
                // A position behind the retained prefix resumes at the oldest record.
                let skip = position.saturating_sub(log.base) as usize;
                log.records
                    .iter()
                    .skip(skip)
                    .take(max_batch)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(batch)
    }
}

#[async_trait]
impl Probe for MemoryBus {
    fn name(&self) -> &'static str {
        "bus"
    }

    async fn ping(&self) -> Result<(), BoxError> {
        MemoryBus::ping(self).map_err(Into::into)
    }
}

/// Producer half of a [`MemoryBus`] connection.
pub struct MemoryProducer {
    bus: MemoryBus,
    topic: String,
    closed: bool,
}

impl MemoryProducer {
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Producer for MemoryProducer {
    async fn produce(&self, key: &[u8], value: &[u8]) -> Result<u64, BrokerError> {
        if self.closed {
            return Err(BrokerError::Closed);
        }
        self.bus.append(&self.topic, key, value)
    }

    async fn ping(&self) -> Result<(), BrokerError> {
        if self.closed {
            return Err(BrokerError::Closed);
        }
        self.bus.ping()
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

/// Consumer half of a [`MemoryBus`] connection.
pub struct MemoryConsumer {
    bus: MemoryBus,
    topic: String,
    group: String,
    position: u64,
    max_batch: usize,
    closed: bool,
}

#[async_trait]
impl Consumer for MemoryConsumer {
    async fn poll(&mut self) -> Result<Vec<Record>, BrokerError> {
        let deadline = Instant::now() + self.bus.poll_timeout;
        loop {
            if self.closed {
                return Err(BrokerError::Closed);
            }

            // Register interest before looking, so a produce in between is not missed.
            let notified = self.bus.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batch = self.bus.fetch(&self.topic, self.position, self.max_batch)?;
            if let Some(last) = batch.last() {
                self.position = last.offset + 1;
                return Ok(batch);
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => return Ok(Vec::new()),
            }
        }
    }

    async fn commit(&mut self, record: &Record) -> Result<(), BrokerError> {
        if self.closed {
            return Err(BrokerError::Closed);
        }
        let mut state = self.bus.lock();
        state.check_reachable()?;
        let next = record.offset + 1;
        let slot = (self.topic.clone(), self.group.clone());
        let committed = state.committed.entry(slot.clone()).or_insert(0);
        if next > *committed {
            *committed = next;
        }
        let committed = *committed;
        state.low_water.insert(slot, committed);
        state.release_committed(&self.topic);
        Ok(())
    }

    async fn ping(&self) -> Result<(), BrokerError> {
        if self.closed {
            return Err(BrokerError::Closed);
        }
        self.bus.ping()
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
