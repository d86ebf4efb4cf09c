//! # Bus Records
//!
//! This module defines the unit of transfer between a transport and the pipeline.

/// A single record read from (or written to) a topic.
///
/// Offsets are assigned by the transport and increase monotonically per topic.
/// The key and value are opaque bytes; interpretation is up to the [`Payload`](crate::Payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub offset: u64,
}

impl Record {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, offset: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            offset,
        }
    }

    /// Lossy UTF-8 view of the key, for log fields.
    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}
