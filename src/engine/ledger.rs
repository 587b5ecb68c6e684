use std::sync::atomic::Ordering;

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::activity::{Activity, ActivityCode, DeliveryState};
use crate::models::shipment::Shipment;
use crate::state::AppState;

pub struct AppendActivity {
    pub code: ActivityCode,
    pub note: Option<String>,
    pub location: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub pod_image: Option<Vec<u8>>,
}

pub fn append(
    state: &AppState,
    shipment_id: Uuid,
    input: AppendActivity,
) -> Result<Activity, AppError> {
    if !state.shipments.contains_key(&shipment_id) {
        return Err(AppError::NotFound(format!("shipment {shipment_id} not found")));
    }

    if input.location.trim().is_empty() {
        return Err(AppError::Validation("location cannot be empty".to_string()));
    }

    let pod_image = match input.pod_image {
        Some(bytes) => Some(state.blobs.store(&bytes)?),
        None => None,
    };

    let activity = Activity {
        id: Uuid::new_v4(),
        shipment_id,
        code: input.code,
        note: input.note,
        location: input.location,
        date: input.date,
        time: input.time,
        pod_image,
        seq: state.activity_seq.fetch_add(1, Ordering::SeqCst),
    };

    state.activities.insert(activity.id, activity.clone());
    let _ = state.activity_events_tx.send(activity.clone());

    state
        .metrics
        .activities_recorded_total
        .with_label_values(&[&format!("{:?}", activity.code)])
        .inc();

    info!(
        shipment_id = %shipment_id,
        activity_id = %activity.id,
        code = ?activity.code,
        "activity recorded"
    );

    Ok(activity)
}

/// Most recent event by (date, time), ties resolved by insertion order.
pub fn latest(state: &AppState, shipment_id: Uuid) -> Option<Activity> {
    state
        .activities
        .iter()
        .filter(|entry| entry.shipment_id == shipment_id)
        .max_by_key(|entry| entry.order_key())
        .map(|entry| entry.value().clone())
}

/// Newest first; every call re-reads current state.
pub fn list_by_shipment(state: &AppState, shipment_id: Uuid) -> Vec<Activity> {
    let mut activities: Vec<Activity> = state
        .activities
        .iter()
        .filter(|entry| entry.shipment_id == shipment_id)
        .map(|entry| entry.value().clone())
        .collect();

    activities.sort_by_key(|activity| std::cmp::Reverse(activity.order_key()));
    activities
}

pub fn delete(state: &AppState, activity_id: Uuid) -> Result<(), AppError> {
    let (_, activity) = state
        .activities
        .remove(&activity_id)
        .ok_or_else(|| AppError::NotFound(format!("activity {activity_id} not found")))?;

    if let Some(image) = &activity.pod_image {
        // Best effort; a failed blob deletion never fails the operation.
        if let Err(err) = state.blobs.delete(&image.deletion_key) {
            warn!(activity_id = %activity_id, error = %err, "failed to delete pod image");
        }
    }

    info!(activity_id = %activity_id, shipment_id = %activity.shipment_id, "activity deleted");
    Ok(())
}

pub fn delivery_state(
    shipment: &Shipment,
    latest: Option<&Activity>,
    today: NaiveDate,
) -> Option<DeliveryState> {
    match latest.map(|activity| activity.code) {
        Some(ActivityCode::Delivered) => return Some(DeliveryState::Delivered),
        Some(ActivityCode::Undelivered) => return Some(DeliveryState::Undelivered),
        Some(ActivityCode::ReturnedToOrigin) => return Some(DeliveryState::ReturnedToOrigin),
        _ => {}
    }

    if !shipment.is_active() {
        return None;
    }

    if shipment.expected_delivery >= today {
        Some(DeliveryState::Pending)
    } else {
        Some(DeliveryState::Overdue)
    }
}
