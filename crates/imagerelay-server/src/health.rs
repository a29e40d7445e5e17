use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness check, independent of provider reachability
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
