use super::{non_zero, required, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: Uuid,
    pub name: String,
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

impl Item {
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_zero("chrt_id", self.chrt_id)?;
        required("track_number", &self.track_number)?;
        required("name", &self.name)?;
        if self.rid.is_nil() {
            return Err(ValidationError::new("rid", "cannot be blank"));
        }
        if self.total_price < 1 {
            return Err(ValidationError::new("total_price", "must be no less than 1"));
        }
        non_zero("nm_id", self.nm_id)?;
        Ok(())
    }
}
