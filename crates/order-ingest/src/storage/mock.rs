//! # Mock Store
//!
//! An expectation-driven [`OrderStore`] for testing components that sit on top of storage
//! without a real backend.
//!
//! Expectations are queued in order and consumed one per call. A call that does not match the
//! next expectation (wrong operation or wrong UID) panics, and [`MockStore::verify`] panics if
//! any expectation was never consumed.
//!
//! ```rust
//! use order_ingest::storage::{MockStore, OrderStore, StorageError};
//! use uuid::Uuid;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let id = Uuid::new_v4();
//! let mock = MockStore::new();
//! mock.expect_get(id).return_err(StorageError::NotFound(id));
//!
//! assert_eq!(mock.get_order(id).await, Err(StorageError::NotFound(id)));
//! mock.verify();
//! # }
//! ```

use super::{OrderStore, StorageError};
use crate::model::Order;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

enum Expectation {
    Add {
        id: Uuid,
        response: Result<bool, StorageError>,
    },
    Get {
        id: Uuid,
        response: Result<Order, StorageError>,
    },
    List {
        response: Result<Vec<Order>, StorageError>,
    },
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Add { id, .. } => format!("add_order({id})"),
            Expectation::Get { id, .. } => format!("get_order({id})"),
            Expectation::List { .. } => "list()".to_string(),
        }
    }
}

type Queue = Arc<Mutex<VecDeque<Expectation>>>;

fn lock(queue: &Queue) -> MutexGuard<'_, VecDeque<Expectation>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A store whose answers are scripted up front.
#[derive(Default)]
pub struct MockStore {
    expectations: Queue,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects an `add_order` call for `id`.
    pub fn expect_add(&self, id: Uuid) -> AddExpectationBuilder {
        AddExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `get_order` call for `id`.
    pub fn expect_get(&self, id: Uuid) -> GetExpectationBuilder {
        GetExpectationBuilder {
            id,
            expectations: self.expectations.clone(),
        }
    }

    /// Expects a `list` call.
    pub fn expect_list(&self) -> ListExpectationBuilder {
        ListExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if any expectation is still pending.
    pub fn verify(&self) {
        let pending = lock(&self.expectations);
        if !pending.is_empty() {
            let names: Vec<String> = pending.iter().map(Expectation::describe).collect();
            panic!(
                "Not all expectations were met. {} remaining: {}",
                pending.len(),
                names.join(", ")
            );
        }
    }

    fn next(&self, call: &str) -> Expectation {
        match lock(&self.expectations).pop_front() {
            Some(expectation) => expectation,
            None => panic!("Unexpected call {call}: no expectations left"),
        }
    }
}

#[async_trait]
impl OrderStore for MockStore {
    async fn add_order(&self, order: &Order) -> Result<bool, StorageError> {
        let call = format!("add_order({})", order.order_uid);
        match self.next(&call) {
            Expectation::Add { id, response } if id == order.order_uid => response,
            other => panic!("Unexpected call {call}, expected {}", other.describe()),
        }
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, StorageError> {
        let call = format!("get_order({id})");
        match self.next(&call) {
            Expectation::Get { id: expected, response } if expected == id => response,
            other => panic!("Unexpected call {call}, expected {}", other.describe()),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, StorageError> {
        match self.next("list()") {
            Expectation::List { response } => response,
            other => panic!("Unexpected call list(), expected {}", other.describe()),
        }
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Builder for `add_order` expectations.
pub struct AddExpectationBuilder {
    id: Uuid,
    expectations: Queue,
}

impl AddExpectationBuilder {
    /// `inserted` is what the store reports: `false` means the UID already existed.
    pub fn return_ok(self, inserted: bool) {
        lock(&self.expectations).push_back(Expectation::Add {
            id: self.id,
            response: Ok(inserted),
        });
    }

    pub fn return_err(self, error: StorageError) {
        lock(&self.expectations).push_back(Expectation::Add {
            id: self.id,
            response: Err(error),
        });
    }
}

/// Builder for `get_order` expectations.
pub struct GetExpectationBuilder {
    id: Uuid,
    expectations: Queue,
}

impl GetExpectationBuilder {
    pub fn return_ok(self, order: Order) {
        lock(&self.expectations).push_back(Expectation::Get {
            id: self.id,
            response: Ok(order),
        });
    }

    pub fn return_err(self, error: StorageError) {
        lock(&self.expectations).push_back(Expectation::Get {
            id: self.id,
            response: Err(error),
        });
    }
}

/// Builder for `list` expectations.
pub struct ListExpectationBuilder {
    expectations: Queue,
}

impl ListExpectationBuilder {
    pub fn return_ok(self, orders: Vec<Order>) {
        lock(&self.expectations).push_back(Expectation::List {
            response: Ok(orders),
        });
    }

    pub fn return_err(self, error: StorageError) {
        lock(&self.expectations).push_back(Expectation::List {
            response: Err(error),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::demo_order;

    #[tokio::test]
    async fn test_expectations_consumed_in_order() {
        let mock = MockStore::new();
        let (_, order) = demo_order();
        mock.expect_add(order.order_uid).return_ok(true);
        mock.expect_list().return_ok(vec![order.clone()]);

        assert!(mock.add_order(&order).await.unwrap());
        assert_eq!(mock.list().await.unwrap(), vec![order]);
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_panics_on_pending() {
        let mock = MockStore::new();
        mock.expect_list().return_ok(Vec::new());
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected call")]
    async fn test_mismatched_call_panics() {
        let mock = MockStore::new();
        mock.expect_list().return_ok(Vec::new());
        let _ = mock.get_order(Uuid::new_v4()).await;
    }
}
