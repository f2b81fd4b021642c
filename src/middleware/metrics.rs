use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use std::{sync::Arc, time::Instant};

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct MetricsMiddlewareState {
    pub metrics: Metrics,
}

pub async fn metrics_middleware(
    State(state): State<Arc<MetricsMiddlewareState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // Label by route template rather than raw path: most paths here
    // carry UUIDs and raw paths would make the label set unbounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().to_string();
    let start = Instant::now();

    let res = next.run(req).await;

    let status = res.status().as_u16().to_string();
    let elapsed = start.elapsed().as_secs_f64();

    state
        .metrics
        .http_request_duration_seconds
        .with_label_values(&[&path, &method, &status])
        .observe(elapsed);

    res
}
