use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocketNumber {
    pub prefix: String,
    pub number: u64,
}

impl fmt::Display for DocketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationInfo {
    pub reason: String,
    pub cancelled_by: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub docket_no: DocketNumber,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub booking_date: NaiveDate,
    pub expected_delivery: NaiveDate,
    pub consignor_id: Uuid,
    pub consignee_id: Uuid,
    pub status: LifecycleStatus,
    // Some iff status is Cancelled; only the lifecycle transitions touch this.
    pub cancellation: Option<CancellationInfo>,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    pub fn is_active(&self) -> bool {
        self.status == LifecycleStatus::Active
    }
}
