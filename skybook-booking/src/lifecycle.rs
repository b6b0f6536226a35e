use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use skybook_core::events::EventSink;
use skybook_core::{BookingError, BookingResult, Flight, FlightStatus, Ticket};
use skybook_shared::models::events::{
    FlightCancelledEvent, FlightDelayedEvent, FLIGHT_CANCELLED_TOPIC, FLIGHT_DELAYED_TOPIC,
};
use skybook_store::{db_error, AnnouncementRepository, DbClient, FlightRepository, TicketRepository};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DelayOutcome {
    pub flight: Flight,
    pub rescheduled_tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightCancellation {
    pub flight: Flight,
    pub cancelled_tickets: Vec<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement_id: Option<Uuid>,
}

/// Schedule changes that cascade into the flight's tickets.
#[derive(Clone)]
pub struct FlightLifecycleManager {
    db: DbClient,
    events: Arc<dyn EventSink>,
    deadline_extension: Duration,
}

impl FlightLifecycleManager {
    pub fn new(db: DbClient, events: Arc<dyn EventSink>, deadline_extension: Duration) -> Self {
        Self { db, events, deadline_extension }
    }

    /// Moves the schedule, marks the flight `Delayed` and pushes every ticket's cancellation
    /// deadline to the new departure plus the configured extension.
    pub async fn delay_flight(
        &self,
        flight_id: Uuid,
        new_departure: DateTime<Utc>,
        new_arrival: DateTime<Utc>,
    ) -> BookingResult<DelayOutcome> {
        if new_arrival <= new_departure {
            return Err(BookingError::Validation(
                "new arrival must be after new departure".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;
        let flight = FlightRepository::lock(&mut tx, flight_id).await?;
        flight.ensure_open("delay")?;

        let flight = FlightRepository::reschedule(&mut tx, flight_id, new_departure, new_arrival).await?;
        let deadline = new_departure + self.deadline_extension;
        let rescheduled_tickets = TicketRepository::shift_deadlines(&mut tx, flight_id, deadline).await?;
        tx.commit().await.map_err(db_error)?;

        info!(
            "Flight {} delayed to {}; {} ticket deadlines moved to {}",
            flight.flight_number,
            new_departure,
            rescheduled_tickets.len(),
            deadline
        );
        let event = FlightDelayedEvent {
            flight_id,
            new_departure,
            new_arrival,
            tickets_rescheduled: rescheduled_tickets.len(),
            timestamp: Utc::now().timestamp(),
        };
        crate::publish(self.events.as_ref(), FLIGHT_DELAYED_TOPIC, flight_id, &event).await;

        Ok(DelayOutcome { flight, rescheduled_tickets })
    }

    /// Administrative cancellation. Every active ticket is cancelled without deadline or
    /// ownership checks, and seat counters are left as they are.
    pub async fn cancel_flight(
        &self,
        flight_id: Uuid,
        reason: Option<String>,
        employee_id: Option<Uuid>,
    ) -> BookingResult<FlightCancellation> {
        let mut tx = self.db.begin().await?;
        let flight = FlightRepository::lock(&mut tx, flight_id).await?;
        if flight.flight_status == FlightStatus::Cancelled {
            return Err(BookingError::InvalidState(format!(
                "flight {} is already cancelled",
                flight.flight_number
            )));
        }

        let flight = FlightRepository::set_status(&mut tx, flight_id, FlightStatus::Cancelled).await?;
        let cancelled_tickets = TicketRepository::cancel_all_active(&mut tx, flight_id).await?;

        let announcement_id = match employee_id {
            Some(employee_id) => {
                let title = format!("Flight {} cancelled", flight.flight_number);
                let content = reason.clone().unwrap_or_default();
                Some(AnnouncementRepository::record_cancellation(&mut tx, &title, &content, employee_id).await?)
            }
            None => None,
        };
        tx.commit().await.map_err(db_error)?;

        info!(
            "Flight {} cancelled with {} active tickets",
            flight.flight_number,
            cancelled_tickets.len()
        );
        if !cancelled_tickets.is_empty() {
            warn!(
                "Flight {}: {} seats were not returned to inventory",
                flight.flight_number,
                cancelled_tickets.len()
            );
        }
        let event = FlightCancelledEvent {
            flight_id,
            reason,
            cancelled_ticket_ids: cancelled_tickets.iter().map(|t| t.id).collect(),
            timestamp: Utc::now().timestamp(),
        };
        crate::publish(self.events.as_ref(), FLIGHT_CANCELLED_TOPIC, flight_id, &event).await;

        Ok(FlightCancellation {
            flight,
            cancelled_tickets,
            announcement_id,
        })
    }
}
