use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::blob::{BlobStore, InMemoryBlobStore};
use crate::engine::allocator::{CounterStore, InMemoryCounter};
use crate::models::activity::Activity;
use crate::models::booking::BookingInfo;
use crate::models::co_loader::CoLoader;
use crate::models::invoice::Invoice;
use crate::models::party::Party;
use crate::models::shipment::Shipment;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub shipments: DashMap<Uuid, Shipment>,
    // Keyed by shipment id; exactly one booking per shipment.
    pub bookings: DashMap<Uuid, BookingInfo>,
    // Keyed by shipment id; zero or one invoice per shipment.
    pub invoices: DashMap<Uuid, Invoice>,
    pub parties: DashMap<Uuid, Party>,
    pub activities: DashMap<Uuid, Activity>,
    // Keyed by shipment id; vacant-entry insertion enforces the 1:1 link.
    pub co_loaders: DashMap<Uuid, CoLoader>,
    pub counter: Arc<dyn CounterStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub activity_seq: AtomicU64,
    pub activity_events_tx: broadcast::Sender<Activity>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(docket_prefix: String, docket_seed: u64, event_buffer_size: usize) -> Self {
        Self::with_collaborators(
            Arc::new(InMemoryCounter::new(docket_prefix, docket_seed)),
            Arc::new(InMemoryBlobStore::new()),
            event_buffer_size,
        )
    }

    pub fn with_collaborators(
        counter: Arc<dyn CounterStore>,
        blobs: Arc<dyn BlobStore>,
        event_buffer_size: usize,
    ) -> Self {
        let (activity_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            shipments: DashMap::new(),
            bookings: DashMap::new(),
            invoices: DashMap::new(),
            parties: DashMap::new(),
            activities: DashMap::new(),
            co_loaders: DashMap::new(),
            counter,
            blobs,
            activity_seq: AtomicU64::new(0),
            activity_events_tx,
            metrics: Metrics::new(),
        }
    }
}
