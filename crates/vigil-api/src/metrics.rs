//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vigil_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vigil_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vigil_http_requests_in_flight";

    // Clip pipeline metrics
    pub const CLIPS_GENERATED_TOTAL: &str = "vigil_clips_generated_total";
    pub const CLIPS_FAILED_TOTAL: &str = "vigil_clips_failed_total";
    pub const CLIP_SEGMENTS: &str = "vigil_clip_segments";
    pub const DOWNLOAD_DURATION_SECONDS: &str = "vigil_download_duration_seconds";
    pub const FFMPEG_DURATION_SECONDS: &str = "vigil_ffmpeg_duration_seconds";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "vigil_rate_limit_hits_total";
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

/// Record a highlight clip delivered to the caller.
pub fn record_clip_generated(segments: usize) {
    counter!(names::CLIPS_GENERATED_TOTAL).increment(1);
    histogram!(names::CLIP_SEGMENTS).record(segments as f64);
}

/// Record a failed clip request, labelled by the stage that failed.
pub fn record_clip_failed(stage: &'static str) {
    counter!(names::CLIPS_FAILED_TOTAL, "stage" => stage).increment(1);
}

/// Record source download duration.
pub fn record_download_duration(duration_secs: f64) {
    histogram!(names::DOWNLOAD_DURATION_SECONDS).record(duration_secs);
}

/// Record extraction plus concat time for one clip.
pub fn record_ffmpeg_duration(duration_secs: f64) {
    histogram!(names::FFMPEG_DURATION_SECONDS).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

static UUID_SEGMENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").ok()
});

static NUMERIC_SEGMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").ok());

/// Sanitize path for metrics labels (replace IDs with placeholders).
fn sanitize_path(path: &str) -> String {
    let mut path = path.to_string();
    if let Some(re) = UUID_SEGMENT.as_ref() {
        path = re.replace_all(&path, ":id").into_owned();
    }
    if let Some(re) = NUMERIC_SEGMENT.as_ref() {
        path = re.replace_all(&path, "/:id$1").into_owned();
    }
    path
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/generate-clip"), "/api/generate-clip");
        assert_eq!(
            sanitize_path("/api/clips/550e8400-e29b-41d4-a716-446655440000"),
            "/api/clips/:id"
        );
        assert_eq!(sanitize_path("/api/cameras/42/clips"), "/api/cameras/:id/clips");
    }
}
