use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skybook_core::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Booking(#[from] BookingError),
    /// Booking-endpoint failure: every logical kind is reported as 400.
    #[error(transparent)]
    Rejected(BookingError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Path(#[from] PathRejection),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn rejected(err: BookingError) -> Self {
        AppError::Rejected(err)
    }
}

fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
        BookingError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn internal(err: &BookingError) -> (StatusCode, String) {
    tracing::error!("Internal Server Error: {}", err);
    let message = if err.is_retryable() {
        "Service temporarily unavailable"
    } else {
        "Internal Server Error"
    };
    (booking_status(err), message.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Booking(err) | AppError::Rejected(err) if err.is_internal() => internal(&err),
            AppError::Booking(err) => (booking_status(&err), err.to_string()),
            AppError::Rejected(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Json(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::Path(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
