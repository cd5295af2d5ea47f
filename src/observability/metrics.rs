use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub location_updates_total: IntCounterVec,
    pub effects_total: IntCounterVec,
    pub oracle_requests_total: IntCounterVec,
    pub oracle_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let location_updates_total = IntCounterVec::new(
            Opts::new(
                "location_updates_total",
                "Validated driver location updates by outcome",
            ),
            &["outcome"],
        )
        .expect("valid location_updates_total metric");

        let effects_total = IntCounterVec::new(
            Opts::new(
                "effects_total",
                "Shipment transition side effects by effect and outcome",
            ),
            &["effect", "outcome"],
        )
        .expect("valid effects_total metric");

        let oracle_requests_total = IntCounterVec::new(
            Opts::new(
                "oracle_requests_total",
                "Routing oracle requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid oracle_requests_total metric");

        let oracle_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "oracle_latency_seconds",
                "Latency of routing oracle requests in seconds",
            ),
            &["endpoint"],
        )
        .expect("valid oracle_latency_seconds metric");

        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(effects_total.clone()))
            .expect("register effects_total");
        registry
            .register(Box::new(oracle_requests_total.clone()))
            .expect("register oracle_requests_total");
        registry
            .register(Box::new(oracle_latency_seconds.clone()))
            .expect("register oracle_latency_seconds");

        Self {
            registry,
            location_updates_total,
            effects_total,
            oracle_requests_total,
            oracle_latency_seconds,
        }
    }

    pub fn observe_oracle(&self, endpoint: &str, outcome: &str, seconds: f64) {
        self.oracle_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
        self.oracle_latency_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
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
