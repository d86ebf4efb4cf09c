//! The top-level order record and its [`Payload`] implementation.

use super::{non_zero, required, Delivery, Item, Payment, ValidationError};
use chrono::{DateTime, Utc};
use ingest_framework::Payload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer order as it travels over the bus and out of the read API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub order_uid: Uuid,
    pub track_number: String,
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

impl Order {
    /// Checks every rule and returns the first violation, with a dotted field path.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_nil() {
            return Err(ValidationError::new("order_uid", "cannot be blank"));
        }
        required("track_number", &self.track_number)?;
        required("entry", &self.entry)?;
        self.delivery.validate().map_err(|e| e.nested("delivery"))?;
        if self.items.is_empty() {
            return Err(ValidationError::new("items", "cannot be blank"));
        }
        for (i, item) in self.items.iter().enumerate() {
            item.validate().map_err(|e| e.nested(&format!("items[{i}]")))?;
        }
        required("locale", &self.locale)?;
        required("internal_signature", &self.internal_signature)?;
        required("customer_id", &self.customer_id)?;
        required("delivery_service", &self.delivery_service)?;
        required("shardkey", &self.shardkey)?;
        non_zero("sm_id", self.sm_id)?;
        if self.date_created == DateTime::<Utc>::default() {
            return Err(ValidationError::new("date_created", "cannot be blank"));
        }
        required("oof_shard", &self.oof_shard)?;
        Ok(())
    }
}

impl Payload for Order {
    type Key = Uuid;
    type Error = ValidationError;

    fn key(&self) -> Uuid {
        self.order_uid
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Order::validate(self)
    }
}
