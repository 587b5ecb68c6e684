use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::StoredImage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoLoader {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub carrier_name: String,
    pub carrier_docket_no: String,
    pub receipt_image: Option<StoredImage>,
    pub linked_by: String,
    pub linked_at: DateTime<Utc>,
}
