use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::builder::{self, CreateShipmentInput, ShipmentAggregate};
use crate::engine::co_loader;
use crate::engine::compliance::{self, EwayBillHealth};
use crate::engine::ledger;
use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::activity::{ActivityCode, DeliveryState};
use crate::models::shipment::{DocketNumber, Shipment};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments", post(create_shipment).get(list_shipments))
        .route("/shipments/:id", get(get_shipment))
        .route("/shipments/:id/cancel", post(cancel_shipment))
        .route("/shipments/:id/restore", post(restore_shipment))
}

#[derive(Serialize)]
pub struct ShipmentSummary {
    pub id: Uuid,
    pub docket_no: DocketNumber,
    pub origin: String,
    pub destination: String,
    pub booking_date: NaiveDate,
    pub expected_delivery: NaiveDate,
    pub current_code: Option<ActivityCode>,
    pub delivery_state: Option<DeliveryState>,
    pub has_co_loader: bool,
    pub eway_bill_health: Option<EwayBillHealth>,
}

fn summarize(state: &AppState, shipment: &Shipment, today: NaiveDate) -> ShipmentSummary {
    let latest = ledger::latest(state, shipment.id);

    let eway_bill_health = state
        .invoices
        .get(&shipment.id)
        .and_then(|invoice| invoice.eway_bill.as_ref().map(|bill| bill.expiry))
        .map(|expiry| compliance::classify(expiry, today));

    ShipmentSummary {
        id: shipment.id,
        docket_no: shipment.docket_no.clone(),
        origin: shipment.origin.clone(),
        destination: shipment.destination.clone(),
        booking_date: shipment.booking_date,
        expected_delivery: shipment.expected_delivery,
        current_code: latest.as_ref().map(|activity| activity.code),
        delivery_state: ledger::delivery_state(shipment, latest.as_ref(), today),
        has_co_loader: co_loader::has_co_loader(state, shipment.id),
        eway_bill_health,
    }
}

async fn create_shipment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateShipmentInput>,
) -> Result<Json<ShipmentAggregate>, AppError> {
    let aggregate = builder::create_shipment(&state, payload)?;
    Ok(Json(aggregate))
}

async fn list_shipments(State(state): State<Arc<AppState>>) -> Json<Vec<ShipmentSummary>> {
    let today = Utc::now().date_naive();

    // Cancelled shipments stay addressable by id but are filtered from listings.
    let mut summaries: Vec<ShipmentSummary> = state
        .shipments
        .iter()
        .filter(|entry| entry.is_active())
        .map(|entry| summarize(&state, entry.value(), today))
        .collect();

    summaries.sort_by(|a, b| b.docket_no.number.cmp(&a.docket_no.number));
    Json(summaries)
}

#[derive(Serialize)]
pub struct ShipmentDetail {
    #[serde(flatten)]
    pub aggregate: ShipmentAggregate,
    pub current_code: Option<ActivityCode>,
    pub delivery_state: Option<DeliveryState>,
    pub eway_bill_health: Option<EwayBillHealth>,
}

async fn get_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentDetail>, AppError> {
    let aggregate = builder::load_aggregate(&state, id)?;
    let today = Utc::now().date_naive();
    let latest = ledger::latest(&state, id);

    let eway_bill_health = aggregate
        .invoice
        .as_ref()
        .and_then(|invoice| invoice.eway_bill.as_ref())
        .map(|bill| compliance::classify(bill.expiry, today));

    Ok(Json(ShipmentDetail {
        current_code: latest.as_ref().map(|activity| activity.code),
        delivery_state: ledger::delivery_state(&aggregate.shipment, latest.as_ref(), today),
        eway_bill_health,
        aggregate,
    }))
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
    pub actor_id: String,
}

async fn cancel_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Shipment>, AppError> {
    let shipment = lifecycle::cancel(&state, id, &payload.reason, &payload.actor_id)?;
    Ok(Json(shipment))
}

async fn restore_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Shipment>, AppError> {
    let shipment = lifecycle::restore(&state, id)?;
    Ok(Json(shipment))
}
