use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::feed::FeedStatus;
use crate::AppState;

/// Always 200 while the process is up; a failing upstream only degrades.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.feed.snapshot().await;
    let status = match snapshot.status {
        FeedStatus::Failed => "degraded",
        _ => "healthy",
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "feed": snapshot.status,
            "buffer_len": snapshot.buffer_len,
        })),
    )
}
