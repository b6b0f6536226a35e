//! Transactional booking core: every operation runs in one Postgres transaction that holds
//! the flight row lock (or the ticket row lock for confirmation) until it commits.

pub mod cancellation;
pub mod codes;
pub mod engine;
pub mod lifecycle;
pub mod lookup;
pub mod seat_map;

pub use cancellation::CancellationEngine;
pub use engine::{BookedPassenger, BookingEngine, BookingRequest, GroupBooking, GroupBookingResult, PassengerBooking};
pub use lifecycle::{DelayOutcome, FlightCancellation, FlightLifecycleManager};
pub use lookup::TicketLookup;
pub use seat_map::SeatMapResolver;

use serde::Serialize;
use skybook_core::events::EventSink;
use skybook_shared::models::events::DomainEvent;
use tracing::{error, warn};
use uuid::Uuid;

/// Publishes after commit. Failures are logged; the committed result stands.
pub(crate) async fn publish<T: Serialize + Sync>(sink: &dyn EventSink, topic: &'static str, key: Uuid, body: &T) {
    match DomainEvent::new(topic, key, body) {
        Ok(event) => {
            if let Err(e) = sink.publish(event).await {
                warn!("Failed to publish {} event: {}", topic, e);
            }
        }
        Err(e) => error!("Failed to serialize {} event: {}", topic, e),
    }
}
