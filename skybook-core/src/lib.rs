pub mod aircraft;
pub mod cabin;
pub mod code;
pub mod customer;
pub mod events;
pub mod flight;
pub mod identity;
pub mod ticket;

pub use aircraft::{Aircraft, Cabin, SeatLayout, SeatTotals};
pub use cabin::CabinClass;
pub use flight::{Flight, FlightStatus};
pub use ticket::{Ticket, TicketClass, TicketStatus};

/// Every way a booking-core operation can fail. Each one aborts the enclosing transaction.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Seat {seat} is not valid for {class_name}")]
    InvalidSeat { seat: String, class_name: String },
    #[error("Seat {0} is already booked")]
    SeatTaken(String),
    #[error("Not enough seats available: requested {requested}, available {available}")]
    NoAvailability { requested: i32, available: i32 },
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Ticket {0} is already cancelled")]
    AlreadyCancelled(uuid::Uuid),
    #[error("Cancellation deadline {0} has passed")]
    DeadlinePassed(chrono::DateTime<chrono::Utc>),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Inconsistent booking request: {0}")]
    Inconsistent(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    /// Transient store failures a caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Unavailable(_))
    }

    /// Failures caused by the store rather than by the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, BookingError::Unavailable(_) | BookingError::Storage(_))
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
