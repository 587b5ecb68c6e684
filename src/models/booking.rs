use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportMode {
    Surface,
    Rail,
    Air,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BilledTo {
    Consignor,
    Consignee,
    ThirdParty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadType {
    FullLoad,
    PartLoad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingInfo {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub mode: TransportMode,
    pub billed_to: BilledTo,
    pub load_type: LoadType,
    pub created_at: DateTime<Utc>,
}
