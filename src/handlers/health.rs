use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::json;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    if state.engine.store_healthy().await {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "message": "Gate API is healthy"
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "message": "Gate store is unreachable"
            })),
        )
    }
}
