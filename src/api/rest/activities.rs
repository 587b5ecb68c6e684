use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::ledger::{self, AppendActivity};
use crate::error::AppError;
use crate::models::activity::{Activity, ActivityCode};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/shipments/:id/activities",
            post(append_activity).get(list_activities),
        )
        .route("/activities/:id", delete(delete_activity))
}

#[derive(Deserialize)]
pub struct AppendActivityRequest {
    pub code: ActivityCode,
    pub note: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

async fn append_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AppendActivityRequest>,
) -> Result<Json<Activity>, AppError> {
    let activity = ledger::append(
        &state,
        id,
        AppendActivity {
            code: payload.code,
            note: payload.note,
            location: payload.location,
            date: payload.date,
            time: payload.time,
            pod_image: None,
        },
    )?;

    Ok(Json(activity))
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Activity>>, AppError> {
    if !state.shipments.contains_key(&id) {
        return Err(AppError::NotFound(format!("shipment {id} not found")));
    }

    Ok(Json(ledger::list_by_shipment(&state, id)))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ledger::delete(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}
