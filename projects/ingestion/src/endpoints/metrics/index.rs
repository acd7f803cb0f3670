use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::IntoResponse,
};
use utils_metrics::ApiCallMetrics;

/// Prometheus text exposition format version served by this endpoint.
const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

/// Axum handler: GET /metrics
///
/// Renders the API-call counters in the Prometheus text format. Always
/// succeeds; the counters are plain atomics shared with the ingestion run.
pub async fn handler(Extension(metrics): Extension<Arc<ApiCallMetrics>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_FORMAT)],
        metrics.prometheus_export(),
    )
}
