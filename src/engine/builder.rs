use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::allocator;
use crate::engine::co_loader;
use crate::engine::compliance;
use crate::engine::ledger::{self, AppendActivity};
use crate::error::AppError;
use crate::geo;
use crate::models::activity::{Activity, ActivityCode};
use crate::models::booking::{BilledTo, BookingInfo, LoadType, TransportMode};
use crate::models::invoice::{EwayBill, Invoice};
use crate::models::party::{Party, PartyRef};
use crate::models::shipment::{DocketNumber, LifecycleStatus, Shipment};
use crate::state::AppState;

const ALLOCATE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipmentInput {
    pub consignor: PartyRef,
    pub consignee: PartyRef,
    pub origin: String,
    pub destination: String,
    pub booking_date: NaiveDate,
    pub expected_delivery: NaiveDate,
    pub mode: TransportMode,
    pub billed_to: BilledTo,
    pub load_type: LoadType,
    pub invoice: Option<InvoiceInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceInput {
    pub invoice_no: String,
    pub declared_value: f64,
    pub eway_bill_no: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentAggregate {
    pub shipment: Shipment,
    pub booking: BookingInfo,
    pub invoice: Option<Invoice>,
    pub consignor: Party,
    pub consignee: Party,
    pub activities: Vec<Activity>,
    pub has_co_loader: bool,
}

#[derive(Debug)]
enum Compensation {
    RemoveParty(Uuid),
    RemoveShipment(Uuid),
    RemoveBooking(Uuid),
    RemoveInvoice(Uuid),
}

pub fn create_shipment(
    state: &AppState,
    input: CreateShipmentInput,
) -> Result<ShipmentAggregate, AppError> {
    let start = Instant::now();
    let result = build(state, input);
    let outcome = if result.is_ok() { "success" } else { "error" };

    state
        .metrics
        .create_shipment_latency_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .shipments_created_total
        .with_label_values(&[outcome])
        .inc();

    if result.is_ok() {
        state.metrics.active_shipments.inc();
    }

    result
}

fn build(state: &AppState, input: CreateShipmentInput) -> Result<ShipmentAggregate, AppError> {
    validate(&input)?;

    let mut undo: Vec<Compensation> = Vec::new();
    match run_steps(state, input, &mut undo) {
        Ok(aggregate) => Ok(aggregate),
        Err((step, err)) => {
            warn!(
                step = step,
                error = %err,
                committed = undo.len(),
                "shipment creation failed; compensating committed steps"
            );
            compensate(state, undo);
            Err(AppError::AggregateStep {
                step,
                source: Box::new(err),
            })
        }
    }
}

fn run_steps(
    state: &AppState,
    input: CreateShipmentInput,
    undo: &mut Vec<Compensation>,
) -> Result<ShipmentAggregate, (&'static str, AppError)> {
    let consignor =
        resolve_party(state, input.consignor, undo).map_err(|err| ("consignor", err))?;
    let consignee =
        resolve_party(state, input.consignee, undo).map_err(|err| ("consignee", err))?;

    let docket_no = allocate_with_retry(state).map_err(|err| ("allocate_docket", err))?;
    let distance_km = geo::estimate_km(&input.origin, &input.destination);
    let now = Utc::now();

    let shipment = Shipment {
        id: Uuid::new_v4(),
        docket_no,
        origin: input.origin.trim().to_string(),
        destination: input.destination.trim().to_string(),
        distance_km,
        booking_date: input.booking_date,
        expected_delivery: input.expected_delivery,
        consignor_id: consignor.id,
        consignee_id: consignee.id,
        status: LifecycleStatus::Active,
        cancellation: None,
        created_at: now,
    };
    state.shipments.insert(shipment.id, shipment.clone());
    undo.push(Compensation::RemoveShipment(shipment.id));

    let booking = BookingInfo {
        id: Uuid::new_v4(),
        shipment_id: shipment.id,
        mode: input.mode,
        billed_to: input.billed_to,
        load_type: input.load_type,
        created_at: now,
    };
    state.bookings.insert(shipment.id, booking.clone());
    undo.push(Compensation::RemoveBooking(shipment.id));

    let invoice = input.invoice.map(|inv| {
        let eway_bill = inv.eway_bill_no.map(|number| EwayBill {
            number,
            expiry: compliance::compute_expiry(shipment.booking_date, distance_km),
        });

        let invoice = Invoice {
            id: Uuid::new_v4(),
            shipment_id: shipment.id,
            booking_id: booking.id,
            consignor_id: consignor.id,
            consignee_id: consignee.id,
            invoice_no: inv.invoice_no,
            declared_value: inv.declared_value,
            eway_bill,
            created_at: now,
        };
        state.invoices.insert(shipment.id, invoice.clone());
        undo.push(Compensation::RemoveInvoice(shipment.id));
        invoice
    });

    let seeded = ledger::append(
        state,
        shipment.id,
        AppendActivity {
            code: ActivityCode::Booked,
            note: None,
            location: shipment.origin.clone(),
            date: now.date_naive(),
            time: now.time(),
            pod_image: None,
        },
    )
    .map_err(|err| ("seed_activity", err))?;

    info!(
        shipment_id = %shipment.id,
        docket_no = %shipment.docket_no,
        origin = %shipment.origin,
        destination = %shipment.destination,
        "shipment created"
    );

    Ok(ShipmentAggregate {
        has_co_loader: co_loader::has_co_loader(state, shipment.id),
        shipment,
        booking,
        invoice,
        consignor,
        consignee,
        activities: vec![seeded],
    })
}

fn validate(input: &CreateShipmentInput) -> Result<(), AppError> {
    if input.origin.trim().is_empty() {
        return Err(AppError::Validation("origin cannot be empty".to_string()));
    }
    if input.destination.trim().is_empty() {
        return Err(AppError::Validation("destination cannot be empty".to_string()));
    }
    if input.expected_delivery < input.booking_date {
        return Err(AppError::Validation(
            "expected delivery cannot precede the booking date".to_string(),
        ));
    }

    for party in [&input.consignor, &input.consignee] {
        if let PartyRef::New(new) = party {
            if new.name.trim().is_empty() {
                return Err(AppError::Validation("party name cannot be empty".to_string()));
            }
        }
    }

    if let Some(invoice) = &input.invoice {
        if invoice.invoice_no.trim().is_empty() {
            return Err(AppError::Validation(
                "invoice number cannot be empty".to_string(),
            ));
        }
        if let Some(eway_bill_no) = &invoice.eway_bill_no {
            if eway_bill_no.trim().is_empty() {
                return Err(AppError::Validation(
                    "e-way bill number cannot be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn resolve_party(
    state: &AppState,
    party: PartyRef,
    undo: &mut Vec<Compensation>,
) -> Result<Party, AppError> {
    match party {
        PartyRef::Existing { id } => state
            .parties
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("party {id} not found"))),
        PartyRef::New(new) => {
            let party = Party {
                id: Uuid::new_v4(),
                name: new.name.trim().to_string(),
                address: new.address,
                gstin: new.gstin,
                temporary: new.temporary,
            };
            state.parties.insert(party.id, party.clone());
            undo.push(Compensation::RemoveParty(party.id));
            Ok(party)
        }
    }
}

fn allocate_with_retry(state: &AppState) -> Result<DocketNumber, AppError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match allocator::allocate(state.counter.as_ref()) {
            Ok(docket_no) => return Ok(docket_no),
            Err(err @ AppError::Storage(_)) if attempt < ALLOCATE_ATTEMPTS => {
                warn!(attempt, error = %err, "docket allocation failed; retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

fn compensate(state: &AppState, undo: Vec<Compensation>) {
    for step in undo.into_iter().rev() {
        warn!(step = ?step, "compensating");
        match step {
            Compensation::RemoveParty(id) => {
                state.parties.remove(&id);
            }
            Compensation::RemoveShipment(id) => {
                state.shipments.remove(&id);
            }
            Compensation::RemoveBooking(shipment_id) => {
                state.bookings.remove(&shipment_id);
            }
            Compensation::RemoveInvoice(shipment_id) => {
                state.invoices.remove(&shipment_id);
            }
        }
    }
}

pub fn load_aggregate(state: &AppState, shipment_id: Uuid) -> Result<ShipmentAggregate, AppError> {
    let shipment = state
        .shipments
        .get(&shipment_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id} not found")))?;

    let booking = state
        .bookings
        .get(&shipment_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::Internal(format!("booking missing for shipment {shipment_id}")))?;

    let invoice = state
        .invoices
        .get(&shipment_id)
        .map(|entry| entry.value().clone());

    let consignor = load_party(state, shipment.consignor_id)?;
    let consignee = load_party(state, shipment.consignee_id)?;

    Ok(ShipmentAggregate {
        activities: ledger::list_by_shipment(state, shipment_id),
        has_co_loader: co_loader::has_co_loader(state, shipment_id),
        shipment,
        booking,
        invoice,
        consignor,
        consignee,
    })
}

fn load_party(state: &AppState, party_id: Uuid) -> Result<Party, AppError> {
    state
        .parties
        .get(&party_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::Internal(format!("party {party_id} missing")))
}
