use axum::{http::StatusCode, response::IntoResponse};

/// Axum handler: GET /stackoverflow
///
/// Placeholder for a future query surface over the stored questions.
pub async fn handler() -> impl IntoResponse {
    (StatusCode::OK, "StackOverflow functionality")
}
