use chrono::Utc;
use skybook_core::events::EventSink;
use skybook_core::identity::CredentialVerifier;
use skybook_core::{BookingError, BookingResult, Ticket, TicketStatus};
use skybook_shared::models::events::{
    TicketCancelledEvent, TicketConfirmedEvent, TICKET_CANCELLED_TOPIC, TICKET_CONFIRMED_TOPIC,
};
use skybook_shared::redact_email;
use skybook_store::{db_error, CustomerRepository, DbClient, FlightRepository, TicketRepository};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::seat_map::load_ticket_class;

/// Hashing is CPU-bound, so the check runs on the blocking pool.
async fn verify_password(
    verifier: Arc<dyn CredentialVerifier>,
    password: &str,
    password_hash: String,
) -> BookingResult<bool> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verifier.verify(&password, &password_hash))
        .await
        .map_err(|e| BookingError::Storage(format!("credential check failed: {}", e)))
}

/// Ticket state transitions: `PendingPayment -> Confirmed` and `{PendingPayment, Confirmed} -> Cancelled`.
#[derive(Clone)]
pub struct CancellationEngine {
    db: DbClient,
    events: Arc<dyn EventSink>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl CancellationEngine {
    pub fn new(db: DbClient, events: Arc<dyn EventSink>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { db, events, verifier }
    }

    /// Cancels the ticket and returns its seat to the flight's inventory. When
    /// `requester_email` is given it must match the ticket owner's email.
    pub async fn cancel_ticket(&self, ticket_id: Uuid, requester_email: Option<&str>) -> BookingResult<Ticket> {
        let mut tx = self.db.begin().await?;

        // Flight first, then ticket: the same order booking and flight changes use.
        let flight_id = TicketRepository::flight_id_of(&mut *tx, ticket_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", ticket_id)))?;
        FlightRepository::lock(&mut tx, flight_id).await?;
        let (ticket, owner_email) = TicketRepository::lock_with_owner(&mut tx, ticket_id).await?;

        if let Err(e) = ticket.check_cancellable(&owner_email, requester_email, Utc::now()) {
            warn!(
                "Cancellation of ticket {} by {} refused: {}",
                ticket_id,
                requester_email.map(redact_email).unwrap_or_else(|| "staff".to_string()),
                e
            );
            return Err(e);
        }

        let cabin = load_ticket_class(&mut tx, ticket.ticket_class_id).await?.cabin()?;
        let cancelled = TicketRepository::update_status(&mut tx, ticket_id, TicketStatus::Cancelled).await?;
        let available = FlightRepository::adjust_available_seats(&mut tx, ticket.flight_id, cabin, 1).await?;

        tx.commit().await.map_err(db_error)?;

        info!(
            "Ticket {} cancelled: seat {} released, {} {} seats available",
            ticket_id, cancelled.seat_number, available, cabin
        );
        let event = TicketCancelledEvent {
            ticket_id,
            flight_id: cancelled.flight_id,
            seat_number: cancelled.seat_number.clone(),
            timestamp: Utc::now().timestamp(),
        };
        crate::publish(self.events.as_ref(), TICKET_CANCELLED_TOPIC, cancelled.flight_id, &event).await;
        Ok(cancelled)
    }

    /// Owner-verified cancellation without a session: the password is checked against the
    /// owner's stored hash, then the owner's email acts as the requester.
    pub async fn cancel_with_password(&self, ticket_id: Uuid, password: &str) -> BookingResult<Ticket> {
        let (owner_email, password_hash) = CustomerRepository::ticket_owner_credentials(&self.db.pool, ticket_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", ticket_id)))?;

        let verified = match password_hash {
            Some(hash) => verify_password(Arc::clone(&self.verifier), password, hash).await?,
            None => false,
        };
        if !verified {
            warn!("Password check failed for cancellation of ticket {}", ticket_id);
            return Err(BookingError::Forbidden("invalid credentials".to_string()));
        }

        self.cancel_ticket(ticket_id, Some(&owner_email)).await
    }

    pub async fn confirm_ticket(&self, ticket_id: Uuid) -> BookingResult<Ticket> {
        let mut tx = self.db.begin().await?;
        let ticket = TicketRepository::lock(&mut tx, ticket_id).await?;
        let next = ticket.ticket_status.confirm()?;
        let confirmed = TicketRepository::update_status(&mut tx, ticket_id, next).await?;
        tx.commit().await.map_err(db_error)?;

        info!("Ticket {} confirmed", ticket_id);
        let event = TicketConfirmedEvent {
            ticket_id,
            flight_id: confirmed.flight_id,
            timestamp: Utc::now().timestamp(),
        };
        crate::publish(self.events.as_ref(), TICKET_CONFIRMED_TOPIC, confirmed.flight_id, &event).await;
        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `Handle::block_on` panics when called from an async worker thread.
    struct BlockingOnlyVerifier;

    impl CredentialVerifier for BlockingOnlyVerifier {
        fn verify(&self, password: &str, password_hash: &str) -> bool {
            tokio::runtime::Handle::current().block_on(async { password == password_hash })
        }
    }

    #[tokio::test]
    async fn test_password_check_runs_on_blocking_pool() {
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(BlockingOnlyVerifier);
        assert!(verify_password(verifier.clone(), "s3cret", "s3cret".to_string()).await.unwrap());
        assert!(!verify_password(verifier, "s3cret", "other".to_string()).await.unwrap());
    }
}
