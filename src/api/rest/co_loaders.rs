use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::co_loader::{self, LinkCoLoader};
use crate::error::AppError;
use crate::models::co_loader::CoLoader;
use crate::models::shipment::DocketNumber;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments/:id/co-loader", post(link_co_loader))
        .route("/co-loaders/:id", delete(unlink_co_loader))
        .route("/co-loaders/available", get(list_available))
}

#[derive(Deserialize)]
pub struct LinkCoLoaderRequest {
    pub carrier_name: String,
    pub carrier_docket_no: String,
    pub actor_id: String,
}

async fn link_co_loader(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkCoLoaderRequest>,
) -> Result<Json<CoLoader>, AppError> {
    let co_loader = co_loader::link(
        &state,
        id,
        LinkCoLoader {
            carrier_name: payload.carrier_name,
            carrier_docket_no: payload.carrier_docket_no,
            receipt_image: None,
            actor_id: payload.actor_id,
        },
    )?;

    Ok(Json(co_loader))
}

async fn unlink_co_loader(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    co_loader::unlink(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct AvailableShipment {
    pub id: Uuid,
    pub docket_no: DocketNumber,
    pub origin: String,
    pub destination: String,
    pub booking_date: NaiveDate,
}

async fn list_available(State(state): State<Arc<AppState>>) -> Json<Vec<AvailableShipment>> {
    let mut available: Vec<AvailableShipment> = state
        .shipments
        .iter()
        .filter(|entry| entry.is_active() && !co_loader::has_co_loader(&state, entry.id))
        .map(|entry| AvailableShipment {
            id: entry.id,
            docket_no: entry.docket_no.clone(),
            origin: entry.origin.clone(),
            destination: entry.destination.clone(),
            booking_date: entry.booking_date,
        })
        .collect();

    available.sort_by(|a, b| a.docket_no.number.cmp(&b.docket_no.number));
    Json(available)
}
