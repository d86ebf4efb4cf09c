//! # Framework Errors
//!
//! Error types shared by the publisher, the subscriber and the transports.

/// Boxed error used where the concrete type belongs to the caller (payload validation, probes).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the message bus plumbing.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("Bus unreachable: {0}")]
    Transport(String),
    #[error("Connection closed")]
    Closed,
    #[error("Encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a record was routed to the dead-letter topic instead of the output channel.
///
/// Both variants are terminal for the record: it is dead-lettered, its offset is
/// committed and it is never retried.
#[derive(Debug, thiserror::Error)]
pub enum RejectReason {
    #[error("Decode failed: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Validation failed: {0}")]
    Validation(#[source] BoxError),
}

impl RejectReason {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RejectReason::Decode(_) => "decode",
            RejectReason::Validation(_) => "validation",
        }
    }
}
