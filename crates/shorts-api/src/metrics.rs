//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "shorts_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "shorts_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "shorts_http_requests_in_flight";

    // Generation metrics
    pub const GENERATION_REQUESTS_TOTAL: &str = "shorts_generation_requests_total";
    pub const GENERATION_DURATION_SECONDS: &str = "shorts_generation_duration_seconds";

    // Render metrics
    pub const RENDER_SUBMISSIONS_TOTAL: &str = "shorts_render_submissions_total";
    pub const RENDER_POLLS_TOTAL: &str = "shorts_render_polls_total";

    // Storage metrics
    pub const OBJECTS_DELETED_TOTAL: &str = "shorts_objects_deleted_total";
    pub const UPLOAD_TICKETS_TOTAL: &str = "shorts_upload_tickets_total";

    // Waveform metrics
    pub const PEAK_EXTRACTIONS_TOTAL: &str = "shorts_peak_extractions_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "shorts_rate_limit_hits_total";
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

/// Record a generation call.
pub fn record_generation(operation: &str, duration_secs: f64) {
    let labels = [("operation", operation.to_string())];
    counter!(names::GENERATION_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a render-backend submission.
pub fn record_render_submission(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::RENDER_SUBMISSIONS_TOTAL, &labels).increment(1);
}

/// Record a render output poll.
pub fn record_render_poll(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RENDER_POLLS_TOTAL, &labels).increment(1);
}

/// Record deleted objects.
pub fn record_objects_deleted(source: &str, count: u64) {
    let labels = [("source", source.to_string())];
    counter!(names::OBJECTS_DELETED_TOTAL, &labels).increment(count);
}

/// Record an issued upload ticket.
pub fn record_upload_ticket() {
    counter!(names::UPLOAD_TICKETS_TOTAL).increment(1);
}

/// Record a waveform peak extraction.
pub fn record_peak_extraction(degraded: bool) {
    let labels = [("degraded", degraded.to_string())];
    counter!(names::PEAK_EXTRACTIONS_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    // Replace UUIDs and numeric IDs with placeholders
    let path = regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .unwrap()
        .replace_all(path, ":id");
    let path = regex_lite::Regex::new(r"/[0-9]+(/|$)")
        .unwrap()
        .replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
