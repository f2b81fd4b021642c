use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // Counters
    pub purchase_posted_total: IntCounterVec,

    // Histograms
    pub http_request_duration_seconds: HistogramVec,

    // Dependency gauges
    pub dep_up: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let purchase_posted_total = IntCounterVec::new(
            Opts::new("retailer_purchase_posted_total", "Purchase bill postings"),
            &["action", "result"], // action: create|edit|delete, result: success|failure
        )
        .expect("metric");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request duration seconds"),
            &["path", "method", "status"],
        )
        .expect("metric");

        let dep_up = IntGaugeVec::new(
            Opts::new("retailer_dependency_up", "Dependency up gauge"),
            &["dep"], // db
        )
        .expect("metric");

        registry
            .register(Box::new(purchase_posted_total.clone()))
            .unwrap();
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .unwrap();
        registry.register(Box::new(dep_up.clone())).unwrap();

        Self {
            registry,
            purchase_posted_total,
            http_request_duration_seconds,
            dep_up,
        }
    }

    pub fn render(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        let mut buf = Vec::new();
        encoder
            .encode(&mf, &mut buf)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buf).map_err(|e| e.to_string())
    }

    pub fn timer() -> Instant {
        Instant::now()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
