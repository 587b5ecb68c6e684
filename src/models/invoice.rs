use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EwayBill {
    pub number: String,
    pub expiry: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub booking_id: Uuid,
    pub consignor_id: Uuid,
    pub consignee_id: Uuid,
    pub invoice_no: String,
    pub declared_value: f64,
    pub eway_bill: Option<EwayBill>,
    pub created_at: DateTime<Utc>,
}
