//! Prometheus metrics for the API server.
//!
//! Job-level metrics (cache, provider attempts, polling, webhooks) are
//! recorded by the orchestrator; this module covers the HTTP surface.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use vyral_models::Operation;

/// Install the Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "vyral_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vyral_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vyral_http_requests_in_flight";
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vyral_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(path: &str) {
    let labels = [("path", sanitize_path(path))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Keep label cardinality bounded: known routes keep their path, anything
/// else is reported as `other`.
fn sanitize_path(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" => path.to_string(),
        _ => match path.parse::<Operation>() {
            Ok(op) => op.path(),
            Err(_) => "other".to_string(),
        },
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/strategy"), "/strategy");
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/wp-admin/login.php"), "other");
        assert_eq!(sanitize_path("/strategy/123"), "other");
    }
}
