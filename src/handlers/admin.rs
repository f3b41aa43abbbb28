use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::AppState;
use crate::constants::{API_NAME, EMPTY_PLATE};
use crate::error::AppError;
use crate::models::{EntryLogView, LogsQuery, PasswordRequest, Vehicle, VehicleRequest};
use crate::service::{entry_log_view, normalize_plate};

pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Routes behind `require_admin`.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(add_vehicle))
        .route("/vehicles/:plate", delete(delete_vehicle))
        .route("/logs", get(list_logs))
}

/// Password setup stays reachable before any password exists.
pub fn password_router() -> Router<AppState> {
    Router::new().route("/password", post(set_password))
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.admin.has_password() {
        return Err(AppError::Forbidden(
            "Admin password not set; create one via POST /api/v1/admin/password".to_string(),
        ));
    }

    let supplied = request
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !state.admin.verify(supplied) {
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    Ok(next.run(request).await)
}

async fn list_vehicles(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    Json(state.engine.list_vehicles().await)
}

async fn add_vehicle(
    State(state): State<AppState>,
    Json(request): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    if normalize_plate(&request.plate_number).is_empty() {
        return Err(AppError::Validation(EMPTY_PLATE.to_string()));
    }

    tracing::info!("{} Adding vehicle {}", API_NAME, request.plate_number);
    let vehicle = state
        .engine
        .add_vehicle(
            &request.plate_number,
            &request.owner_name,
            request.vehicle_type.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Vehicle added successfully",
            "vehicle": vehicle
        })),
    ))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(plate): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.engine.delete_vehicle(&plate).await?;

    Ok(Json(json!({
        "message": "Vehicle removed successfully"
    })))
}

async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Vec<EntryLogView>>, AppError> {
    let Query(query) = query?;
    let now = Utc::now();
    let offset = state.engine.rules().display_offset();
    let logs = state.engine.list_logs(query.limit).await?;

    Ok(Json(
        logs.into_iter().map(|log| entry_log_view(log, now, &offset)).collect(),
    ))
}

async fn set_password(
    State(state): State<AppState>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let first_time = !state.admin.has_password();
    state
        .admin
        .change_password(request.current_password.as_deref(), &request.new_password)?;

    let message = if first_time { "Password set" } else { "Password changed" };
    Ok(Json(json!({ "message": message })))
}
