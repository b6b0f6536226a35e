use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::cabin::CabinClass;
use crate::{BookingError, BookingResult};

/// Ticket lifecycle: PendingPayment -> Confirmed, and either of those -> Cancelled (terminal).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::PendingPayment => "PendingPayment",
            TicketStatus::Confirmed => "Confirmed",
            TicketStatus::Cancelled => "Cancelled",
        }
    }

    /// Active tickets hold their seat.
    pub fn is_active(&self) -> bool {
        !matches!(self, TicketStatus::Cancelled)
    }

    pub fn confirm(self) -> BookingResult<TicketStatus> {
        match self {
            TicketStatus::PendingPayment => Ok(TicketStatus::Confirmed),
            other => Err(BookingError::InvalidState(format!(
                "ticket is {}, only PendingPayment tickets can be confirmed",
                other
            ))),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingPayment" => Ok(TicketStatus::PendingPayment),
            "Confirmed" => Ok(TicketStatus::Confirmed),
            "Cancelled" => Ok(TicketStatus::Cancelled),
            other => Err(BookingError::Storage(format!("unknown ticket status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketClass {
    pub id: Uuid,
    pub class_name: String,
    /// Multiplier applied to the flight's base price for this class.
    pub coefficient: f64,
}

impl TicketClass {
    pub fn cabin(&self) -> BookingResult<CabinClass> {
        CabinClass::from_class_name(&self.class_name).ok_or_else(|| {
            BookingError::NotFound(format!("Cabin for ticket class '{}'", self.class_name))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub customer_id: Uuid,
    pub ticket_class_id: Uuid,
    pub seat_number: String,
    pub price: f64,
    pub booking_date: DateTime<Utc>,
    pub ticket_status: TicketStatus,
    /// Opaque internal code; the human-facing code maps onto it.
    pub ticket_code: Uuid,
    pub cancellation_deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardized_code: Option<String>,
}

impl Ticket {
    pub fn with_standardized_code(mut self, code: impl Into<String>) -> Self {
        self.standardized_code = Some(code.into());
        self
    }

    /// Customer-initiated cancellation rules, checked in this order: ownership, terminal
    /// state, deadline. `requester_email` is `None` when ownership was established elsewhere.
    pub fn check_cancellable(
        &self,
        owner_email: &str,
        requester_email: Option<&str>,
        now: DateTime<Utc>,
    ) -> BookingResult<()> {
        if let Some(requester) = requester_email {
            if !requester.eq_ignore_ascii_case(owner_email) {
                return Err(BookingError::Forbidden(
                    "email does not match the ticket owner".to_string(),
                ));
            }
        }
        if self.ticket_status == TicketStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled(self.id));
        }
        if now >= self.cancellation_deadline {
            return Err(BookingError::DeadlinePassed(self.cancellation_deadline));
        }
        Ok(())
    }
}
