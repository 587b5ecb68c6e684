use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::invoice::Invoice;
use crate::state::AppState;

const KM_PER_VALIDITY_DAY: f64 = 100.0;
const EXPIRING_SOON_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EwayBillState {
    Expired,
    ExpiringSoon,
    Valid,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EwayBillHealth {
    pub state: EwayBillState,
    pub days: i64,
}

/// One validity day per started 100 km, minimum one day, counted from the
/// booking date.
pub fn compute_expiry(booking_date: NaiveDate, distance_km: f64) -> NaiveDate {
    let days = ((distance_km / KM_PER_VALIDITY_DAY).ceil() as u64).max(1);
    booking_date
        .checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

/// Classified fresh against `as_of` on every call; the result is never stored.
pub fn classify(expiry: NaiveDate, as_of: NaiveDate) -> EwayBillHealth {
    if expiry < as_of {
        return EwayBillHealth {
            state: EwayBillState::Expired,
            days: (as_of - expiry).num_days(),
        };
    }

    let days = (expiry - as_of).num_days();
    let state = if days <= EXPIRING_SOON_WINDOW_DAYS {
        EwayBillState::ExpiringSoon
    } else {
        EwayBillState::Valid
    };

    EwayBillHealth { state, days }
}

/// Manual expiry override, e.g. a regulatory extension. The new date is only
/// reclassified on the next read.
pub fn update_expiry(
    state: &AppState,
    invoice_id: Uuid,
    new_expiry: NaiveDate,
) -> Result<Invoice, AppError> {
    let mut invoice = state
        .invoices
        .iter_mut()
        .find(|entry| entry.id == invoice_id)
        .ok_or_else(|| AppError::NotFound(format!("invoice {invoice_id} not found")))?;

    let Some(eway_bill) = invoice.eway_bill.as_mut() else {
        return Err(AppError::Conflict(format!(
            "invoice {invoice_id} has no e-way bill to update"
        )));
    };

    eway_bill.expiry = new_expiry;
    info!(invoice_id = %invoice_id, expiry = %new_expiry, "e-way bill expiry overridden");

    Ok(invoice.clone())
}

/// Drops the e-way bill fields once the shipment is delivered and the bill is
/// no longer relevant. Clearing an already-cleared invoice is a no-op.
pub fn clear(state: &AppState, invoice_id: Uuid) -> Result<Invoice, AppError> {
    let mut invoice = state
        .invoices
        .iter_mut()
        .find(|entry| entry.id == invoice_id)
        .ok_or_else(|| AppError::NotFound(format!("invoice {invoice_id} not found")))?;

    if invoice.eway_bill.take().is_some() {
        info!(invoice_id = %invoice_id, "e-way bill cleared");
    }

    Ok(invoice.clone())
}
