use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shipment::{CancellationInfo, LifecycleStatus, Shipment};
use crate::state::AppState;

pub fn cancel(
    state: &AppState,
    shipment_id: Uuid,
    reason: &str,
    actor_id: &str,
) -> Result<Shipment, AppError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation(
            "cancellation reason cannot be empty".to_string(),
        ));
    }

    let mut shipment = state
        .shipments
        .get_mut(&shipment_id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id} not found")))?;

    // Current state is re-checked while holding the entry lock; a concurrent
    // transition cannot interleave between the check and the write.
    if shipment.status == LifecycleStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "shipment {shipment_id} is already cancelled"
        )));
    }

    shipment.status = LifecycleStatus::Cancelled;
    shipment.cancellation = Some(CancellationInfo {
        reason: reason.to_string(),
        cancelled_by: actor_id.to_string(),
        cancelled_at: Utc::now(),
    });

    state
        .metrics
        .lifecycle_transitions_total
        .with_label_values(&["cancel"])
        .inc();
    state.metrics.active_shipments.dec();

    info!(shipment_id = %shipment_id, actor_id = %actor_id, "shipment cancelled");
    Ok(shipment.clone())
}

pub fn restore(state: &AppState, shipment_id: Uuid) -> Result<Shipment, AppError> {
    let mut shipment = state
        .shipments
        .get_mut(&shipment_id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id} not found")))?;

    if shipment.status != LifecycleStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "shipment {shipment_id} is not cancelled"
        )));
    }

    shipment.status = LifecycleStatus::Active;
    shipment.cancellation = None;

    state
        .metrics
        .lifecycle_transitions_total
        .with_label_values(&["restore"])
        .inc();
    state.metrics.active_shipments.inc();

    info!(shipment_id = %shipment_id, "shipment restored");
    Ok(shipment.clone())
}
