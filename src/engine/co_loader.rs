use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::co_loader::CoLoader;
use crate::state::AppState;

pub struct LinkCoLoader {
    pub carrier_name: String,
    pub carrier_docket_no: String,
    pub receipt_image: Option<Vec<u8>>,
    pub actor_id: String,
}

pub fn link(state: &AppState, shipment_id: Uuid, input: LinkCoLoader) -> Result<CoLoader, AppError> {
    if input.carrier_name.trim().is_empty() {
        return Err(AppError::Validation("carrier name cannot be empty".to_string()));
    }
    if input.carrier_docket_no.trim().is_empty() {
        return Err(AppError::Validation(
            "carrier docket number cannot be empty".to_string(),
        ));
    }
    if !state.shipments.contains_key(&shipment_id) {
        return Err(AppError::NotFound(format!("shipment {shipment_id} not found")));
    }

    let receipt_image = match input.receipt_image {
        Some(bytes) => Some(state.blobs.store(&bytes)?),
        None => None,
    };

    let co_loader = CoLoader {
        id: Uuid::new_v4(),
        shipment_id,
        carrier_name: input.carrier_name,
        carrier_docket_no: input.carrier_docket_no,
        receipt_image,
        linked_by: input.actor_id,
        linked_at: Utc::now(),
    };

    // The map is keyed by shipment id, so the vacant-entry insert is the
    // uniqueness constraint; losing a race surfaces as Conflict.
    match state.co_loaders.entry(shipment_id) {
        Entry::Occupied(_) => {
            if let Some(image) = &co_loader.receipt_image {
                if let Err(err) = state.blobs.delete(&image.deletion_key) {
                    warn!(shipment_id = %shipment_id, error = %err, "failed to delete orphaned receipt");
                }
            }
            Err(AppError::Conflict(format!(
                "shipment {shipment_id} already has a co-loader"
            )))
        }
        Entry::Vacant(vacant) => {
            vacant.insert(co_loader.clone());
            info!(
                shipment_id = %shipment_id,
                co_loader_id = %co_loader.id,
                carrier = %co_loader.carrier_name,
                "co-loader linked"
            );
            Ok(co_loader)
        }
    }
}

pub fn unlink(state: &AppState, co_loader_id: Uuid) -> Result<(), AppError> {
    let shipment_id = state
        .co_loaders
        .iter()
        .find(|entry| entry.id == co_loader_id)
        .map(|entry| entry.shipment_id)
        .ok_or_else(|| AppError::NotFound(format!("co-loader {co_loader_id} not found")))?;

    let Some((_, co_loader)) = state
        .co_loaders
        .remove_if(&shipment_id, |_, record| record.id == co_loader_id)
    else {
        return Err(AppError::NotFound(format!("co-loader {co_loader_id} not found")));
    };

    if let Some(image) = &co_loader.receipt_image {
        if let Err(err) = state.blobs.delete(&image.deletion_key) {
            warn!(co_loader_id = %co_loader_id, error = %err, "failed to delete receipt image");
        }
    }

    info!(co_loader_id = %co_loader_id, shipment_id = %shipment_id, "co-loader unlinked");
    Ok(())
}

/// Derived flag: a shipment has a co-loader iff a record exists for it.
pub fn has_co_loader(state: &AppState, shipment_id: Uuid) -> bool {
    state.co_loaders.contains_key(&shipment_id)
}
