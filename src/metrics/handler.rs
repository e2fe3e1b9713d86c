use super::collector::ResolutionMetrics;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use std::sync::Arc;

/// Handler exposing resolution counters in Prometheus text format.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/metrics", get(metrics_handler))
///     .with_state(ResolutionMetrics::global());
/// ```
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<Arc<ResolutionMetrics>>,
) -> Result<Response<Body>, StatusCode> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", encoder.format_type())
        .body(Body::from(buffer))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
