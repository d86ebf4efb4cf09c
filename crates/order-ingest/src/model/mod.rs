//! # Order Model
//!
//! Wire-format data structures for order events. The same JSON shape travels over the bus
//! and is returned by the read API.
//!
//! [`Order`] implements [`Payload`](ingest_framework::Payload): its key is the order UID and
//! [`Order::validate`] is the check the subscriber runs before forwarding a record.
//!
//! Missing fields decode to their zero value and are then caught by validation, so a
//! half-filled order is reported field by field instead of as an opaque decode error.

pub mod delivery;
pub mod item;
pub mod order;
pub mod payment;

pub use delivery::Delivery;
pub use item::Item;
pub use order::Order;
pub use payment::Payment;

use thiserror::Error;

/// The first rule an order breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the field path, e.g. `phone` becomes `delivery.phone`.
    pub(crate) fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            reason: self.reason,
        }
    }
}

pub(crate) fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "cannot be blank"));
    }
    Ok(())
}

/// Numeric presence check: only zero (the decoded default) is rejected.
pub(crate) fn non_zero(field: &str, value: i64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::new(field, "cannot be blank"));
    }
    Ok(())
}
