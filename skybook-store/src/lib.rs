pub mod announcement_repo;
pub mod app_config;
pub mod catalog_repo;
pub mod code_repo;
pub mod customer_repo;
pub mod database;
pub mod events;
pub mod flight_repo;
pub mod redis_repo;
pub mod ticket_repo;

pub use announcement_repo::AnnouncementRepository;
pub use app_config::Config;
pub use catalog_repo::{AircraftRepository, TicketClassRepository};
pub use code_repo::CodeRepository;
pub use customer_repo::CustomerRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use flight_repo::FlightRepository;
pub use redis_repo::RedisClient;
pub use ticket_repo::{NewTicket, TicketDetails, TicketRepository};

use skybook_core::BookingError;

/// Partial unique index over `(flight_id, seat_number)` of non-cancelled tickets.
pub const ACTIVE_SEAT_INDEX: &str = "tickets_active_seat_idx";

const UNIQUE_VIOLATION: &str = "23505";

/// Classifies a store failure. Connection trouble is retryable; everything else is not.
pub fn db_error(err: sqlx::Error) -> BookingError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::error!("Database unavailable: {}", err);
            BookingError::Unavailable(err.to_string())
        }
        sqlx::Error::Database(db)
            if db.code().as_deref() == Some(UNIQUE_VIOLATION)
                && db.constraint() == Some(ACTIVE_SEAT_INDEX) =>
        {
            BookingError::SeatTaken("requested".to_string())
        }
        _ => {
            tracing::error!("Database error: {}", err);
            BookingError::Storage(err.to_string())
        }
    }
}

/// Like [`db_error`] but names the seat when the active-seat index rejects an insert.
pub fn seat_error(seat_number: &str) -> impl FnOnce(sqlx::Error) -> BookingError + '_ {
    move |err| match db_error(err) {
        BookingError::SeatTaken(_) => BookingError::SeatTaken(seat_number.to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_retryable() {
        assert!(db_error(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(db_error(sqlx::Error::PoolClosed).is_retryable());
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(db_error(sqlx::Error::Io(io)), BookingError::Unavailable(_)));
    }

    #[test]
    fn test_other_failures_are_storage_errors() {
        let err = db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, BookingError::Storage(_)));
        assert!(!err.is_retryable());
        assert!(err.is_internal());

        let err = seat_error("12A")(sqlx::Error::ColumnNotFound("seat".into()));
        assert!(matches!(err, BookingError::Storage(_)));
    }
}
