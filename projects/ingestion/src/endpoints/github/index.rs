use axum::{http::StatusCode, response::IntoResponse};

/// Axum handler: GET /github
///
/// Placeholder for a future query surface over the stored issues.
pub async fn handler() -> impl IntoResponse {
    (StatusCode::OK, "GitHub functionality")
}
