use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;

use super::AppState;
use crate::constants::{API_NAME, EMPTY_PLATE};
use crate::error::AppError;
use crate::models::{EntryCheck, ExitRecord, PlateRequest};
use crate::service::{entry_log_view, normalize_plate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/entry", post(check_entry))
        .route("/exit", post(record_exit))
        .route("/history/:plate", get(history))
}

fn required_plate(raw: &str) -> Result<String, AppError> {
    let plate = normalize_plate(raw);
    if plate.is_empty() {
        return Err(AppError::Validation(EMPTY_PLATE.to_string()));
    }
    Ok(plate)
}

async fn check_entry(
    State(state): State<AppState>,
    Json(request): Json<PlateRequest>,
) -> Result<Json<EntryCheck>, AppError> {
    let plate = required_plate(&request.plate_number)?;
    tracing::info!("{} Received entry check for {}", API_NAME, plate);

    Ok(Json(state.engine.check_entry(&plate).await))
}

async fn record_exit(
    State(state): State<AppState>,
    Json(request): Json<PlateRequest>,
) -> Result<Json<ExitRecord>, AppError> {
    let plate = required_plate(&request.plate_number)?;
    tracing::info!("{} Received exit for {}", API_NAME, plate);

    let record = state.engine.record_exit(&plate).await?;
    Ok(Json(record))
}

async fn history(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let plate = required_plate(&plate)?;
    let now = Utc::now();
    let offset = state.engine.rules().display_offset();
    let entries: Vec<_> = state
        .engine
        .history(&plate)
        .await
        .into_iter()
        .map(|log| entry_log_view(log, now, &offset))
        .collect();

    Ok(Json(json!({
        "plateNumber": plate,
        "entries": entries
    })))
}
