use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::compliance::{self, EwayBillHealth, EwayBillState};
use crate::error::AppError;
use crate::models::invoice::Invoice;
use crate::models::shipment::DocketNumber;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/invoices/:id/eway-bill",
            patch(update_eway_expiry).delete(clear_eway_bill),
        )
        .route("/eway-bills/expiring", get(list_expiring))
}

#[derive(Deserialize)]
pub struct UpdateExpiryRequest {
    pub expiry: NaiveDate,
}

async fn update_eway_expiry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExpiryRequest>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = compliance::update_expiry(&state, id, payload.expiry)?;
    Ok(Json(invoice))
}

async fn clear_eway_bill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = compliance::clear(&state, id)?;
    Ok(Json(invoice))
}

#[derive(Serialize)]
pub struct ExpiringEwayBill {
    pub invoice_id: Uuid,
    pub shipment_id: Uuid,
    pub docket_no: DocketNumber,
    pub invoice_no: String,
    pub eway_bill_no: String,
    pub expiry: NaiveDate,
    pub health: EwayBillHealth,
}

/// Bills that are expired or expiring soon on non-cancelled shipments,
/// classified against today on every call.
async fn list_expiring(State(state): State<Arc<AppState>>) -> Json<Vec<ExpiringEwayBill>> {
    let today = Utc::now().date_naive();

    let mut expiring: Vec<ExpiringEwayBill> = state
        .invoices
        .iter()
        .filter_map(|invoice| {
            let bill = invoice.eway_bill.as_ref()?;
            let shipment = state.shipments.get(&invoice.shipment_id)?;
            if !shipment.is_active() {
                return None;
            }

            let health = compliance::classify(bill.expiry, today);
            if health.state == EwayBillState::Valid {
                return None;
            }

            Some(ExpiringEwayBill {
                invoice_id: invoice.id,
                shipment_id: invoice.shipment_id,
                docket_no: shipment.docket_no.clone(),
                invoice_no: invoice.invoice_no.clone(),
                eway_bill_no: bill.number.clone(),
                expiry: bill.expiry,
                health,
            })
        })
        .collect();

    expiring.sort_by_key(|bill| bill.expiry);
    Json(expiring)
}
