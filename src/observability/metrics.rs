use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub shipments_created_total: IntCounterVec,
    pub lifecycle_transitions_total: IntCounterVec,
    pub activities_recorded_total: IntCounterVec,
    pub create_shipment_latency_seconds: HistogramVec,
    pub active_shipments: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let shipments_created_total = IntCounterVec::new(
            Opts::new("shipments_created_total", "Total shipment creations by outcome"),
            &["outcome"],
        )
        .expect("valid shipments_created_total metric");

        let lifecycle_transitions_total = IntCounterVec::new(
            Opts::new(
                "lifecycle_transitions_total",
                "Total cancel/restore transitions",
            ),
            &["transition"],
        )
        .expect("valid lifecycle_transitions_total metric");

        let activities_recorded_total = IntCounterVec::new(
            Opts::new("activities_recorded_total", "Total ledger events by code"),
            &["code"],
        )
        .expect("valid activities_recorded_total metric");

        let create_shipment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "create_shipment_latency_seconds",
                "Latency of shipment aggregate creation in seconds",
            ),
            &["outcome"],
        )
        .expect("valid create_shipment_latency_seconds metric");

        let active_shipments = IntGauge::new("active_shipments", "Current number of active shipments")
            .expect("valid active_shipments metric");

        registry
            .register(Box::new(shipments_created_total.clone()))
            .expect("register shipments_created_total");
        registry
            .register(Box::new(lifecycle_transitions_total.clone()))
            .expect("register lifecycle_transitions_total");
        registry
            .register(Box::new(activities_recorded_total.clone()))
            .expect("register activities_recorded_total");
        registry
            .register(Box::new(create_shipment_latency_seconds.clone()))
            .expect("register create_shipment_latency_seconds");
        registry
            .register(Box::new(active_shipments.clone()))
            .expect("register active_shipments");

        Self {
            registry,
            shipments_created_total,
            lifecycle_transitions_total,
            activities_recorded_total,
            create_shipment_latency_seconds,
            active_shipments,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
