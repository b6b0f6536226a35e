use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use skybook_booking::{BookingRequest, GroupBooking, PassengerBooking};
use skybook_core::BookingError;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{customer_auth_middleware, optional_customer, require_customer, CustomerClaims};
use crate::response::{optional_body, success};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookMultipleRequest {
    pub tickets: Vec<BookingRequest>,
    pub quantity: usize,
}

#[derive(Debug, Deserialize)]
pub struct CancelTicketRequest {
    pub password: Option<String>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let customer_only = Router::new()
        .route("/tickets/{id}/confirm", post(confirm_ticket))
        .route("/tickets/email/{email}", get(tickets_by_email))
        .route_layer(middleware::from_fn_with_state(state, customer_auth_middleware));

    Router::new()
        .route("/tickets/book", post(book_ticket))
        .route("/tickets/book-multiple", post(book_multiple))
        .route("/tickets/book-with-customer", post(book_with_customer))
        .route("/tickets/{id}/cancel", post(cancel_ticket))
        .route("/tickets/code/{code}", get(ticket_by_code))
        .merge(customer_only)
}

async fn book_ticket(
    State(state): State<AppState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let ticket = state.booking.book_ticket(request).await.map_err(AppError::rejected)?;
    Ok((StatusCode::CREATED, success(ticket)))
}

/// The token is optional; when present its customer must own one of the seats.
async fn book_multiple(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BookMultipleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let claims = optional_customer(&headers, &state.auth.secret)?;
    let acting_customer = match &claims {
        Some(claims) => Some(claims.customer_id().ok_or_else(|| {
            AppError::Unauthorized("token subject is not a customer id".to_string())
        })?),
        None => None,
    };

    let group = GroupBooking::from_requests(request.tickets, request.quantity).map_err(AppError::rejected)?;
    let result = state
        .booking
        .book_multiple_tickets(group, acting_customer)
        .await
        .map_err(AppError::rejected)?;
    Ok((StatusCode::CREATED, success(result)))
}

async fn book_with_customer(
    State(state): State<AppState>,
    payload: Result<Json<PassengerBooking>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(booking) = payload?;
    let booked = state.booking.book_with_customers(booking).await.map_err(AppError::rejected)?;
    Ok((StatusCode::CREATED, success(json!({ "tickets": booked }))))
}

/// Either the ticket owner's password in the body or a customer token.
async fn cancel_ticket(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let Path(ticket_id) = id?;
    let request: Option<CancelTicketRequest> = optional_body(&body)?;

    let ticket = match request.and_then(|r| r.password) {
        Some(password) => state.cancellation.cancel_with_password(ticket_id, &password).await?,
        None => {
            let claims = require_customer(&headers, &state.auth.secret)?;
            state.cancellation.cancel_ticket(ticket_id, Some(&claims.email)).await?
        }
    };
    Ok(success(ticket))
}

async fn confirm_ticket(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(ticket_id) = id?;
    let ticket = state.cancellation.confirm_ticket(ticket_id).await?;
    Ok(success(ticket))
}

async fn ticket_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.lookup.find_by_code(&code).await?;
    Ok(success(details))
}

async fn tickets_by_email(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !claims.email.eq_ignore_ascii_case(&email) {
        return Err(BookingError::Forbidden("tickets of another customer".to_string()).into());
    }
    let tickets = state.lookup.find_by_email(&email).await?;
    Ok(success(tickets))
}
