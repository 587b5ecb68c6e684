use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::StoredImage;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityCode {
    Booked,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Undelivered,
    ReturnedToOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub code: ActivityCode,
    // Operator remark; carries no meaning for classification.
    pub note: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub pod_image: Option<StoredImage>,
    // Insertion order; tie-break when two events share date and time.
    pub seq: u64,
}

impl Activity {
    pub fn order_key(&self) -> (NaiveDate, NaiveTime, u64) {
        (self.date, self.time, self.seq)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Delivered,
    Undelivered,
    ReturnedToOrigin,
    Pending,
    Overdue,
}
