//! # Subscriber
//!
//! The consuming half of the broker. A single pump task polls the bus, classifies each
//! record and hands valid values to a bounded channel.
//!
//! ## Record lifecycle
//!
//! ```text
//!   polled ──decode──► decoded ──validate──► valid ──send──► forwarded ──► commit
//!     │                   │
//!     └── decode error    └── validation error ──► dead-lettered ──► commit
//! ```
//!
//! Both terminal states commit the record's offset, so the pipeline always makes forward
//! progress and never re-delivers a record it already classified.
//!
//! * **Ordering**: records are handled one at a time, in poll order.
//! * **Backpressure**: the output channel holds [`OUTPUT_CAPACITY`] values. When it is full the
//!   pump waits on `send` before committing, which in turn stops polling.
//! * **Dead letters**: the original key/value bytes are written to the dead-letter topic once.
//!   A failed dead-letter write is logged and the record is dropped; its offset is still committed.

use crate::error::RejectReason;
use crate::message::Record;
use crate::metrics::{Counter, Metrics};
use crate::payload::{accept, Payload};
use crate::transport::{Consumer, Producer};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Capacity of the channel returned by [`Subscriber::subscribe`].
pub const OUTPUT_CAPACITY: usize = 10;

const DEFAULT_POLL_RETRY: Duration = Duration::from_millis(500);

/// Consumer + dead-letter producer pair, generic over the payload it decodes.
///
/// Owns both connections. They are closed exactly once, when the pump exits.
pub struct Subscriber<T, C, P>
where
    T: Payload,
    C: Consumer,
    P: Producer,
{
    consumer: C,
    dead_letter: P,
    metrics: Arc<dyn Metrics>,
    poll_retry: Duration,
    _payload: PhantomData<fn() -> T>,
}

enum Flow {
    Continue,
    Stop,
}

impl<T, C, P> Subscriber<T, C, P>
where
    T: Payload,
    C: Consumer,
    P: Producer,
{
    pub fn new(consumer: C, dead_letter: P, metrics: Arc<dyn Metrics>) -> Self {
        Self {
            consumer,
            dead_letter,
            metrics,
            poll_retry: DEFAULT_POLL_RETRY,
            _payload: PhantomData,
        }
    }

    /// Delay before polling again after a poll-level error.
    pub fn with_poll_retry(mut self, poll_retry: Duration) -> Self {
        self.poll_retry = poll_retry;
        self
    }

    /// Starts the pump and returns the bounded output channel plus the pump's handle.
    ///
    /// The channel closes when the pump exits (cancellation or a dropped receiver).
    pub fn subscribe(self, cancel: CancellationToken) -> (mpsc::Receiver<T>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(OUTPUT_CAPACITY);
        let handle = tokio::spawn(
            self.pump(sender, cancel)
                .instrument(tracing::info_span!("subscriber")),
        );
        (receiver, handle)
    }

    async fn pump(mut self, sender: mpsc::Sender<T>, cancel: CancellationToken) {
        // Extract just the type name (e.g., "Order" instead of "order_ingest::model::order::Order")
        let payload_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(payload_type, "Subscriber started");

        'poll: loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.consumer.poll() => polled,
            };

            let records = match polled {
                Ok(records) => records,
                Err(e) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    error!(error = %e, "Poll failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_retry) => continue,
                    }
                }
            };

            for record in records {
                if let Flow::Stop = self.handle(record, &sender, &cancel).await {
                    break 'poll;
                }
            }
        }

        self.close(sender).await;
    }

    async fn handle(
        &mut self,
        record: Record,
        sender: &mpsc::Sender<T>,
        cancel: &CancellationToken,
    ) -> Flow {
        debug!(uid = %record.key_str(), offset = record.offset, bytes = record.value.len(), "Received");

        match accept::<T>(&record.value) {
            Ok(value) => {
                let sent = tokio::select! {
                    _ = cancel.cancelled() => None,
                    sent = sender.send(value) => Some(sent),
                };
                match sent {
                    // Cancelled while the channel was full: leave the record uncommitted.
                    None => return Flow::Stop,
                    Some(Err(_)) => {
                        warn!(offset = record.offset, "Output channel closed");
                        return Flow::Stop;
                    }
                    Some(Ok(())) => {}
                }
                self.commit(&record).await;
                Flow::Continue
            }
            Err(reason) => {
                self.reject(&record, &reason).await;
                self.commit(&record).await;
                Flow::Continue
            }
        }
    }

    /// Publishes the original bytes to the dead-letter topic. Never retried.
    async fn reject(&mut self, record: &Record, reason: &RejectReason) {
        warn!(uid = %record.key_str(), offset = record.offset, kind = reason.kind(), error = %reason, "Rejected");

        match self.dead_letter.produce(&record.key, &record.value).await {
            Ok(offset) => info!(uid = %record.key_str(), dlq_offset = offset, "Dead-lettered"),
            Err(e) => error!(uid = %record.key_str(), error = %e, "Dead-letter publish failed, dropping record"),
        }
        self.metrics.increment(Counter::DeadLettered);
    }

    async fn commit(&mut self, record: &Record) {
        if let Err(e) = self.consumer.commit(record).await {
            error!(offset = record.offset, error = %e, "Commit failed");
        }
    }

    /// Closes both connections and the output channel.
    async fn close(mut self, sender: mpsc::Sender<T>) {
        self.consumer.close().await;
        self.dead_letter.close().await;
        drop(sender);
        info!("Subscriber stopped");
    }
}
