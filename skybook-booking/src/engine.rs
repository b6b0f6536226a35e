use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skybook_catalog::{FareQuote, SeatLedger, SeatSelection};
use skybook_core::customer::{Customer, PassengerDetails};
use skybook_core::events::EventSink;
use skybook_core::{Aircraft, BookingError, BookingResult, CabinClass, Flight, Ticket, TicketClass, TicketStatus};
use skybook_shared::models::events::{TicketBookedEvent, TICKET_BOOKED_TOPIC};
use skybook_shared::redact_email;
use skybook_store::{db_error, CustomerRepository, DbClient, FlightRepository, NewTicket, TicketRepository};
use sqlx::{Postgres, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::codes::{allocate_group_codes, allocate_unique_code};
use crate::seat_map::{load_aircraft, load_ticket_class};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub flight_id: Uuid,
    pub customer_id: Uuid,
    pub ticket_class_id: Uuid,
    pub seat_number: String,
    pub cancellation_deadline: DateTime<Utc>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSeat {
    pub seat_number: String,
    pub customer_id: Uuid,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Seats booked together under one group code. Every seat shares flight, class and deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBooking {
    pub flight_id: Uuid,
    pub ticket_class_id: Uuid,
    pub cancellation_deadline: DateTime<Utc>,
    pub seats: Vec<GroupSeat>,
}

impl GroupBooking {
    /// Folds per-ticket requests into one group. `quantity` must match the ticket count and
    /// every ticket must agree on flight, class and deadline.
    pub fn from_requests(requests: Vec<BookingRequest>, quantity: usize) -> BookingResult<GroupBooking> {
        if requests.len() != quantity {
            return Err(BookingError::Inconsistent(format!(
                "quantity is {} but {} tickets were sent",
                quantity,
                requests.len()
            )));
        }
        let first = requests
            .first()
            .ok_or_else(|| BookingError::Validation("at least one ticket is required".to_string()))?;
        let (flight_id, ticket_class_id, cancellation_deadline) =
            (first.flight_id, first.ticket_class_id, first.cancellation_deadline);

        if let Some(odd) = requests.iter().find(|r| r.flight_id != flight_id) {
            return Err(BookingError::Inconsistent(format!(
                "ticket for seat {} names another flight",
                odd.seat_number
            )));
        }
        if let Some(odd) = requests.iter().find(|r| r.ticket_class_id != ticket_class_id) {
            return Err(BookingError::Inconsistent(format!(
                "ticket for seat {} names another ticket class",
                odd.seat_number
            )));
        }
        if let Some(odd) = requests.iter().find(|r| r.cancellation_deadline != cancellation_deadline) {
            return Err(BookingError::Inconsistent(format!(
                "ticket for seat {} has another cancellation deadline",
                odd.seat_number
            )));
        }

        Ok(GroupBooking {
            flight_id,
            ticket_class_id,
            cancellation_deadline,
            seats: requests
                .into_iter()
                .map(|r| GroupSeat {
                    seat_number: r.seat_number,
                    customer_id: r.customer_id,
                    price: r.price,
                })
                .collect(),
        })
    }

    pub fn includes_customer(&self, customer_id: Uuid) -> bool {
        self.seats.iter().any(|s| s.customer_id == customer_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupBookingResult {
    pub standardized_code: String,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerSeat {
    #[serde(flatten)]
    pub details: PassengerDetails,
    pub seat_number: String,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Passengers booked on one flight, creating or refreshing their customer records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerBooking {
    pub passengers: Vec<PassengerSeat>,
    pub flight_id: Uuid,
    pub ticket_class_id: Uuid,
    pub cancellation_deadline: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookedPassenger {
    pub ticket: Ticket,
    pub customer: Customer,
}

/// Everything a booking decision reads, loaded while the flight row is locked.
struct LockedFlight {
    flight: Flight,
    class: TicketClass,
    cabin: CabinClass,
    aircraft: Aircraft,
}

impl LockedFlight {
    async fn acquire(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
        ticket_class_id: Uuid,
    ) -> BookingResult<LockedFlight> {
        let flight = FlightRepository::lock(tx, flight_id).await?;
        flight.ensure_open("book seats on")?;
        let class = load_ticket_class(tx, ticket_class_id).await?;
        let cabin = class.cabin()?;
        let aircraft = load_aircraft(tx, &flight).await?;
        Ok(LockedFlight { flight, class, cabin, aircraft })
    }

    fn selection(&self) -> SeatSelection<'_> {
        SeatSelection::new(&self.aircraft.seat_layout, self.cabin, &self.class.class_name)
    }
}

#[derive(Clone)]
pub struct BookingEngine {
    db: DbClient,
    events: Arc<dyn EventSink>,
    max_group_size: usize,
}

impl BookingEngine {
    pub fn new(db: DbClient, events: Arc<dyn EventSink>, max_group_size: usize) -> Self {
        Self { db, events, max_group_size }
    }

    pub async fn book_ticket(&self, request: BookingRequest) -> BookingResult<Ticket> {
        let mut tx = self.db.begin().await?;
        let ticket = match Self::book_in_tx(&mut tx, &request).await {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Booking seat {} on flight {} rejected: {}", request.seat_number, request.flight_id, e);
                return Err(e);
            }
        };
        tx.commit().await.map_err(db_error)?;

        info!(
            "Ticket {} booked: flight {} seat {}",
            ticket.id, ticket.flight_id, ticket.seat_number
        );
        self.publish_booked(&ticket).await;
        Ok(ticket)
    }

    /// One seat, under the flight lock held by `tx`. Locking again inside the same
    /// transaction is a no-op that re-reads the current counters.
    async fn book_in_tx(tx: &mut Transaction<'_, Postgres>, request: &BookingRequest) -> BookingResult<Ticket> {
        let locked = LockedFlight::acquire(tx, request.flight_id, request.ticket_class_id).await?;
        SeatLedger::from_flight(&locked.flight).ensure_available(locked.cabin, 1)?;

        let seats = std::slice::from_ref(&request.seat_number);
        let selection = locked.selection();
        selection.check_in_class(&request.seat_number)?;
        let taken = TicketRepository::taken_seats(&mut **tx, request.flight_id, seats).await?;
        selection.check_all(seats, &taken)?;

        if !CustomerRepository::missing(&mut **tx, &[request.customer_id]).await?.is_empty() {
            return Err(BookingError::NotFound(format!("Customer {}", request.customer_id)));
        }

        let quote = FareQuote::resolve(request.price, &locked.flight, locked.cabin, &locked.class)?;

        let ticket_code = Uuid::new_v4();
        let standardized_code = allocate_unique_code(tx, ticket_code).await?;
        FlightRepository::adjust_available_seats(tx, request.flight_id, locked.cabin, -1).await?;

        let ticket = TicketRepository::insert(
            tx,
            &NewTicket {
                flight_id: request.flight_id,
                customer_id: request.customer_id,
                ticket_class_id: request.ticket_class_id,
                seat_number: request.seat_number.clone(),
                price: quote.price,
                ticket_status: TicketStatus::Confirmed,
                ticket_code,
                cancellation_deadline: request.cancellation_deadline,
            },
        )
        .await?;

        Ok(ticket.with_standardized_code(standardized_code))
    }

    /// Books every seat of the group or none. `acting_customer`, when known, must own one of
    /// the seats.
    pub async fn book_multiple_tickets(
        &self,
        group: GroupBooking,
        acting_customer: Option<Uuid>,
    ) -> BookingResult<GroupBookingResult> {
        if group.seats.is_empty() {
            return Err(BookingError::Validation("at least one ticket is required".to_string()));
        }
        if group.seats.len() > self.max_group_size {
            return Err(BookingError::Validation(format!(
                "at most {} tickets can be booked together",
                self.max_group_size
            )));
        }
        if let Some(customer_id) = acting_customer {
            if !group.includes_customer(customer_id) {
                return Err(BookingError::Forbidden(
                    "the booking must include the authenticated customer".to_string(),
                ));
            }
        }

        let mut tx = self.db.begin().await?;
        let result = match Self::book_group_in_tx(&mut tx, &group).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Group booking of {} seats on flight {} rejected: {}",
                    group.seats.len(),
                    group.flight_id,
                    e
                );
                return Err(e);
            }
        };
        tx.commit().await.map_err(db_error)?;

        info!(
            "Group {} booked: {} tickets on flight {}",
            result.standardized_code,
            result.tickets.len(),
            group.flight_id
        );
        for ticket in &result.tickets {
            self.publish_booked(ticket).await;
        }
        Ok(result)
    }

    async fn book_group_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        group: &GroupBooking,
    ) -> BookingResult<GroupBookingResult> {
        let locked = LockedFlight::acquire(tx, group.flight_id, group.ticket_class_id).await?;
        let quantity = i32::try_from(group.seats.len())
            .map_err(|_| BookingError::Validation("too many tickets".to_string()))?;
        SeatLedger::from_flight(&locked.flight).ensure_available(locked.cabin, quantity)?;

        let seat_numbers: Vec<String> = group.seats.iter().map(|s| s.seat_number.clone()).collect();
        let taken = TicketRepository::taken_seats(&mut **tx, group.flight_id, &seat_numbers).await?;
        locked.selection().check_all(&seat_numbers, &taken)?;

        let customer_ids: Vec<Uuid> = group
            .seats
            .iter()
            .map(|s| s.customer_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let missing = CustomerRepository::missing(&mut **tx, &customer_ids).await?;
        if let Some(customer_id) = missing.first() {
            return Err(BookingError::NotFound(format!("Customer {}", customer_id)));
        }

        let quotes = group
            .seats
            .iter()
            .map(|s| FareQuote::resolve(s.price, &locked.flight, locked.cabin, &locked.class))
            .collect::<BookingResult<Vec<_>>>()?;

        let ticket_codes: Vec<Uuid> = group.seats.iter().map(|_| Uuid::new_v4()).collect();
        let codes = allocate_group_codes(tx, &ticket_codes).await?;
        FlightRepository::adjust_available_seats(tx, group.flight_id, locked.cabin, -quantity).await?;

        let mut inserted = Vec::with_capacity(group.seats.len());
        for ((seat, quote), ticket_code) in group.seats.iter().zip(&quotes).zip(&ticket_codes) {
            let ticket = TicketRepository::insert(
                tx,
                &NewTicket {
                    flight_id: group.flight_id,
                    customer_id: seat.customer_id,
                    ticket_class_id: group.ticket_class_id,
                    seat_number: seat.seat_number.clone(),
                    price: quote.price,
                    ticket_status: TicketStatus::Confirmed,
                    ticket_code: *ticket_code,
                    cancellation_deadline: group.cancellation_deadline,
                },
            )
            .await?;
            inserted.push(ticket);
        }

        let tickets = inserted
            .into_iter()
            .zip(codes.member_codes)
            .map(|(ticket, code)| ticket.with_standardized_code(code))
            .collect();

        Ok(GroupBookingResult {
            standardized_code: codes.group_code,
            tickets,
        })
    }

    /// Upserts each passenger as a customer and books their seat, all in one transaction.
    pub async fn book_with_customers(&self, booking: PassengerBooking) -> BookingResult<Vec<BookedPassenger>> {
        if booking.passengers.is_empty() {
            return Err(BookingError::Validation("at least one passenger is required".to_string()));
        }
        if booking.passengers.len() > self.max_group_size {
            return Err(BookingError::Validation(format!(
                "at most {} passengers can be booked together",
                self.max_group_size
            )));
        }
        for passenger in &booking.passengers {
            passenger.details.validate()?;
        }

        let mut tx = self.db.begin().await?;
        let booked = match Self::book_passengers_in_tx(&mut tx, &booking).await {
            Ok(booked) => booked,
            Err(e) => {
                warn!(
                    "Booking {} passengers on flight {} rejected: {}",
                    booking.passengers.len(),
                    booking.flight_id,
                    e
                );
                return Err(e);
            }
        };
        tx.commit().await.map_err(db_error)?;

        for entry in &booked {
            info!(
                "Ticket {} booked for {} on flight {}",
                entry.ticket.id,
                redact_email(entry.customer.email.expose()),
                entry.ticket.flight_id
            );
            self.publish_booked(&entry.ticket).await;
        }
        Ok(booked)
    }

    async fn book_passengers_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        booking: &PassengerBooking,
    ) -> BookingResult<Vec<BookedPassenger>> {
        let locked = LockedFlight::acquire(tx, booking.flight_id, booking.ticket_class_id).await?;
        let quantity = i32::try_from(booking.passengers.len())
            .map_err(|_| BookingError::Validation("too many passengers".to_string()))?;
        SeatLedger::from_flight(&locked.flight).ensure_available(locked.cabin, quantity)?;

        let mut customers = Vec::with_capacity(booking.passengers.len());
        for index in upsert_order(&booking.passengers) {
            let customer = CustomerRepository::upsert_by_email(tx, &booking.passengers[index].details).await?;
            customers.push((index, customer));
        }
        customers.sort_by_key(|(index, _)| *index);

        let mut booked = Vec::with_capacity(booking.passengers.len());
        for (passenger, (_, customer)) in booking.passengers.iter().zip(customers) {
            let request = BookingRequest {
                flight_id: booking.flight_id,
                customer_id: customer.id,
                ticket_class_id: booking.ticket_class_id,
                seat_number: passenger.seat_number.clone(),
                cancellation_deadline: booking.cancellation_deadline,
                price: passenger.price,
            };
            let ticket = Self::book_in_tx(tx, &request).await?;
            booked.push(BookedPassenger { ticket, customer });
        }
        Ok(booked)
    }

    async fn publish_booked(&self, ticket: &Ticket) {
        let event = TicketBookedEvent {
            ticket_id: ticket.id,
            flight_id: ticket.flight_id,
            customer_id: ticket.customer_id,
            seat_number: ticket.seat_number.clone(),
            standardized_code: ticket.standardized_code.clone().unwrap_or_default(),
            price: ticket.price,
            timestamp: Utc::now().timestamp(),
        };
        crate::publish(self.events.as_ref(), TICKET_BOOKED_TOPIC, ticket.flight_id, &event).await;
    }
}

/// Passenger indices sorted by email. Customer rows are upserted in this order so that
/// concurrent passenger bookings sharing customers lock those rows in the same order.
fn upsert_order(passengers: &[PassengerSeat]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..passengers.len()).collect();
    order.sort_by(|&a, &b| passengers[a].details.email.cmp(&passengers[b].details.email));
    order
}
