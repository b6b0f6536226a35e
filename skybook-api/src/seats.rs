use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ValidateSeatRequest {
    pub flight_id: Uuid,
    pub seat_number: String,
    pub ticket_class_id: Uuid,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/seats/{flight_id}", get(seat_map))
        .route("/seats/validate", post(validate_seat))
}

async fn seat_map(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(flight_id) = id?;
    let map = state.seats.resolve_seat_map(flight_id).await?;
    Ok(success(map))
}

async fn validate_seat(
    State(state): State<AppState>,
    payload: Result<Json<ValidateSeatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    state
        .seats
        .validate_seat_selection(request.flight_id, &request.seat_number, request.ticket_class_id)
        .await
        .map_err(AppError::rejected)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Seat {} is available", request.seat_number),
    })))
}
