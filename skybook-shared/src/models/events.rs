use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const TICKET_BOOKED_TOPIC: &str = "ticket.booked";
pub const TICKET_CANCELLED_TOPIC: &str = "ticket.cancelled";
pub const TICKET_CONFIRMED_TOPIC: &str = "ticket.confirmed";
pub const FLIGHT_DELAYED_TOPIC: &str = "flight.delayed";
pub const FLIGHT_CANCELLED_TOPIC: &str = "flight.cancelled";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketBookedEvent {
    pub ticket_id: Uuid,
    pub flight_id: Uuid,
    pub customer_id: Uuid,
    pub seat_number: String,
    pub standardized_code: String,
    pub price: f64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketCancelledEvent {
    pub ticket_id: Uuid,
    pub flight_id: Uuid,
    pub seat_number: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketConfirmedEvent {
    pub ticket_id: Uuid,
    pub flight_id: Uuid,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct FlightDelayedEvent {
    pub flight_id: Uuid,
    pub new_departure: DateTime<Utc>,
    pub new_arrival: DateTime<Utc>,
    pub tickets_rescheduled: usize,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct FlightCancelledEvent {
    pub flight_id: Uuid,
    pub reason: Option<String>,
    pub cancelled_ticket_ids: Vec<Uuid>,
    pub timestamp: i64,
}

/// Envelope handed to an event sink: the topic, the partition key and the JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    pub topic: &'static str,
    pub key: String,
    pub payload: String,
}

impl DomainEvent {
    pub fn new<T: serde::Serialize>(topic: &'static str, key: Uuid, body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            topic,
            key: key.to_string(),
            payload: serde_json::to_string(body)?,
        })
    }
}
