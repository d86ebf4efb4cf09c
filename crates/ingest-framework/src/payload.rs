//! # Payload Trait
//!
//! The `Payload` trait defines the contract that every value flowing through the pipeline
//! must implement. The subscriber is written once against this trait and works for any
//! decodable, validatable type: the pump never knows which concrete type it carries.
//!
//! # Provided Methods
//! - [`Payload::decode`] defaults to canonical JSON via `serde_json`.
//! - [`Payload::encode`] is the matching encoder used by the publisher.
//!
//! Only [`Payload::key`] and [`Payload::validate`] must be implemented.

use crate::error::RejectReason;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any value carried over the bus must implement.
///
/// # Associated Types
/// - `Key`: the primary key used by caches and storage. Must be cheap to clone.
/// - `Error`: the detailed validation error returned by [`Payload::validate`].
pub trait Payload: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// The unique identifier for this payload (e.g., Uuid, String, u64).
    type Key: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The validation error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the primary key.
    fn key(&self) -> Self::Key;

    /// Checks the semantic validity of an already well-formed value.
    fn validate(&self) -> Result<(), Self::Error>;

    /// Decodes raw bytes into a value. Canonical JSON by default.
    fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encodes the value for the wire. Canonical JSON by default.
    fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Decodes and validates in one step, classifying the failure.
pub fn accept<T: Payload>(bytes: &[u8]) -> Result<T, RejectReason> {
    let value = T::decode(bytes).map_err(RejectReason::Decode)?;
    value
        .validate()
        .map_err(|e| RejectReason::Validation(Box::new(e)))?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct Ticket {
        id: u32,
        seats: u32,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("seats must be positive")]
    struct NoSeats;

    impl Payload for Ticket {
        type Key = u32;
        type Error = NoSeats;

        fn key(&self) -> u32 {
            self.id
        }

        fn validate(&self) -> Result<(), NoSeats> {
            if self.seats == 0 {
                return Err(NoSeats);
            }
            Ok(())
        }
    }

    #[test]
    fn test_accept_valid() {
        let ticket: Ticket = accept(br#"{"id":7,"seats":2}"#).unwrap();
        assert_eq!(ticket, Ticket { id: 7, seats: 2 });
        assert_eq!(ticket.key(), 7);
    }

    #[test]
    fn test_accept_classifies_failures() {
        let err = accept::<Ticket>(b"{not json").unwrap_err();
        assert_eq!(err.kind(), "decode");

        let err = accept::<Ticket>(br#"{"id":7,"seats":0}"#).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("seats must be positive"));
    }
}
