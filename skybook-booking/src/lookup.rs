use skybook_core::code::is_valid_code;
use skybook_core::{BookingError, BookingResult};
use skybook_store::{DbClient, TicketDetails, TicketRepository};

/// Read-only ticket queries.
#[derive(Clone)]
pub struct TicketLookup {
    db: DbClient,
}

impl TicketLookup {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    /// Exact match on the standardized code, group member codes included.
    pub async fn find_by_code(&self, code: &str) -> BookingResult<TicketDetails> {
        if !is_valid_code(code) {
            return Err(BookingError::Validation(format!("'{}' is not a ticket code", code)));
        }
        TicketRepository::find_details_by_code(&self.db.pool, code)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", code)))
    }

    pub async fn find_by_email(&self, email: &str) -> BookingResult<Vec<TicketDetails>> {
        TicketRepository::find_details_by_email(&self.db.pool, email).await
    }
}
