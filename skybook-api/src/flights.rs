use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    middleware,
    response::IntoResponse,
    routing::put,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{admin_auth_middleware, AdminClaims};
use crate::response::{optional_body, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayFlightRequest {
    pub new_departure: DateTime<Utc>,
    pub new_arrival: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelFlightRequest {
    pub reason: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/flights/{id}/delay", put(delay_flight))
        .route("/flights/{id}/cancel", put(cancel_flight))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

async fn delay_flight(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<DelayFlightRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(flight_id) = id?;
    let Json(request) = payload?;
    let outcome = state
        .lifecycle
        .delay_flight(flight_id, request.new_departure, request.new_arrival)
        .await?;
    Ok(success(outcome))
}

async fn cancel_flight(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let Path(flight_id) = id?;
    let request: CancelFlightRequest = optional_body(&body)?.unwrap_or_default();
    let cancellation = state
        .lifecycle
        .cancel_flight(flight_id, request.reason, claims.employee_id())
        .await?;
    Ok(success(cancellation))
}
