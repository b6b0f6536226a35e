use chrono::{DateTime, Utc};
use serde::Serialize;
use skybook_core::{BookingError, BookingResult, FlightStatus, Ticket, TicketStatus};
use skybook_shared::Masked;
use sqlx::{PgExecutor, Postgres, Transaction};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{db_error, seat_error};

/// Ticket columns joined with the human-facing code. Queries alias `tickets` as `t` and
/// `ticket_codes` as `tc`.
const TICKET_COLUMNS: &str = "t.id, t.flight_id, t.customer_id, t.ticket_class_id, t.seat_number, \
     t.price::FLOAT8 AS price, t.booking_date, t.ticket_status, t.ticket_code, \
     t.cancellation_deadline, tc.standardized_code";

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    flight_id: Uuid,
    customer_id: Uuid,
    ticket_class_id: Uuid,
    seat_number: String,
    price: f64,
    booking_date: DateTime<Utc>,
    ticket_status: String,
    ticket_code: Uuid,
    cancellation_deadline: DateTime<Utc>,
    standardized_code: Option<String>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = BookingError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            flight_id: row.flight_id,
            customer_id: row.customer_id,
            ticket_class_id: row.ticket_class_id,
            seat_number: row.seat_number,
            price: row.price,
            booking_date: row.booking_date,
            ticket_status: row.ticket_status.parse()?,
            ticket_code: row.ticket_code,
            cancellation_deadline: row.cancellation_deadline,
            standardized_code: row.standardized_code,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OwnedTicketRow {
    #[sqlx(flatten)]
    ticket: TicketRow,
    owner_email: String,
}

#[derive(sqlx::FromRow)]
struct DetailsRow {
    #[sqlx(flatten)]
    ticket: TicketRow,
    flight_number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    flight_status: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlightInfo {
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub flight_status: FlightStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerContact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: Masked<String>,
    pub phone_number: Option<Masked<String>>,
}

/// Read projection used by code and email lookups.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub flight_info: FlightInfo,
    pub customer: CustomerContact,
}

impl TryFrom<DetailsRow> for TicketDetails {
    type Error = BookingError;

    fn try_from(row: DetailsRow) -> Result<Self, Self::Error> {
        let ticket = Ticket::try_from(row.ticket)?;
        Ok(TicketDetails {
            flight_info: FlightInfo {
                flight_number: row.flight_number,
                departure_time: row.departure_time,
                arrival_time: row.arrival_time,
                flight_status: row.flight_status.parse()?,
            },
            customer: CustomerContact {
                id: ticket.customer_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: Masked::from(row.email),
                phone_number: row.phone_number.map(Masked::from),
            },
            ticket,
        })
    }
}

const DETAILS_QUERY: &str = "FROM tickets t \
     JOIN flights f ON f.id = t.flight_id \
     JOIN customers c ON c.id = t.customer_id \
     LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code";

/// Values of a ticket row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub flight_id: Uuid,
    pub customer_id: Uuid,
    pub ticket_class_id: Uuid,
    pub seat_number: String,
    pub price: f64,
    pub ticket_status: TicketStatus,
    pub ticket_code: Uuid,
    pub cancellation_deadline: DateTime<Utc>,
}

pub struct TicketRepository;

impl TicketRepository {
    /// Seats held by non-cancelled tickets on the flight.
    pub async fn booked_seats<'e, E: PgExecutor<'e>>(executor: E, flight_id: Uuid) -> BookingResult<HashSet<String>> {
        let seats: Vec<String> = sqlx::query_scalar(
            "SELECT seat_number FROM tickets WHERE flight_id = $1 AND ticket_status <> 'Cancelled'",
        )
        .bind(flight_id)
        .fetch_all(executor)
        .await
        .map_err(db_error)?;
        Ok(seats.into_iter().collect())
    }

    /// The subset of `seats` already held by non-cancelled tickets on the flight.
    pub async fn taken_seats<'e, E: PgExecutor<'e>>(
        executor: E,
        flight_id: Uuid,
        seats: &[String],
    ) -> BookingResult<HashSet<String>> {
        let taken: Vec<String> = sqlx::query_scalar(
            "SELECT seat_number FROM tickets \
             WHERE flight_id = $1 AND seat_number = ANY($2) AND ticket_status <> 'Cancelled'",
        )
        .bind(flight_id)
        .bind(seats)
        .fetch_all(executor)
        .await
        .map_err(db_error)?;
        Ok(taken.into_iter().collect())
    }

    pub async fn insert(tx: &mut Transaction<'_, Postgres>, ticket: &NewTicket) -> BookingResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            "INSERT INTO tickets (id, flight_id, customer_id, ticket_class_id, seat_number, price, \
                 booking_date, ticket_status, ticket_code, cancellation_deadline) \
             VALUES ($1, $2, $3, $4, $5, $6::FLOAT8::NUMERIC, NOW(), $7, $8, $9) \
             RETURNING id, flight_id, customer_id, ticket_class_id, seat_number, price::FLOAT8 AS price, \
                 booking_date, ticket_status, ticket_code, cancellation_deadline, \
                 NULL::TEXT AS standardized_code",
        )
        .bind(Uuid::new_v4())
        .bind(ticket.flight_id)
        .bind(ticket.customer_id)
        .bind(ticket.ticket_class_id)
        .bind(&ticket.seat_number)
        .bind(ticket.price)
        .bind(ticket.ticket_status.as_str())
        .bind(ticket.ticket_code)
        .bind(ticket.cancellation_deadline)
        .fetch_one(&mut **tx)
        .await
        .map_err(seat_error(&ticket.seat_number))?;
        Ticket::try_from(row)
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, ticket_id: Uuid) -> BookingResult<Option<Ticket>> {
        let sql = format!(
            "SELECT {} FROM tickets t LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code WHERE t.id = $1",
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(ticket_id)
            .fetch_optional(executor)
            .await
            .map_err(db_error)?
            .map(Ticket::try_from)
            .transpose()
    }

    /// Row-locks the ticket. Fails `NotFound` when absent.
    pub async fn lock(tx: &mut Transaction<'_, Postgres>, ticket_id: Uuid) -> BookingResult<Ticket> {
        let sql = format!(
            "SELECT {} FROM tickets t LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code \
             WHERE t.id = $1 FOR UPDATE OF t",
            TICKET_COLUMNS
        );
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(ticket_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", ticket_id)))?;
        Ticket::try_from(row)
    }

    /// Row-locks the ticket and returns it with its owner's email.
    pub async fn lock_with_owner(
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: Uuid,
    ) -> BookingResult<(Ticket, String)> {
        let sql = format!(
            "SELECT {}, c.email AS owner_email FROM tickets t \
             JOIN customers c ON c.id = t.customer_id \
             LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code \
             WHERE t.id = $1 FOR UPDATE OF t",
            TICKET_COLUMNS
        );
        let row = sqlx::query_as::<_, OwnedTicketRow>(&sql)
            .bind(ticket_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", ticket_id)))?;
        Ok((Ticket::try_from(row.ticket)?, row.owner_email))
    }

    pub async fn flight_id_of<'e, E: PgExecutor<'e>>(executor: E, ticket_id: Uuid) -> BookingResult<Option<Uuid>> {
        sqlx::query_scalar("SELECT flight_id FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(executor)
            .await
            .map_err(db_error)
    }

    pub async fn update_status(
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> BookingResult<Ticket> {
        let sql = format!(
            "WITH updated AS ( \
                 UPDATE tickets SET ticket_status = $1 WHERE id = $2 RETURNING * \
             ) \
             SELECT {} FROM updated t LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code",
            TICKET_COLUMNS
        );
        let row = sqlx::query_as::<_, TicketRow>(&sql)
            .bind(status.as_str())
            .bind(ticket_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookingError::NotFound(format!("Ticket {}", ticket_id)))?;
        Ticket::try_from(row)
    }

    /// Moves the cancellation deadline of every ticket on the flight, whatever its status.
    pub async fn shift_deadlines(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
        deadline: DateTime<Utc>,
    ) -> BookingResult<Vec<Ticket>> {
        let sql = format!(
            "WITH moved AS ( \
                 UPDATE tickets SET cancellation_deadline = $1 WHERE flight_id = $2 RETURNING * \
             ) \
             SELECT {} FROM moved t LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code \
             ORDER BY t.seat_number",
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(deadline)
            .bind(flight_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    /// Cancels every non-cancelled ticket on the flight and returns them.
    pub async fn cancel_all_active(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
    ) -> BookingResult<Vec<Ticket>> {
        let sql = format!(
            "WITH cancelled AS ( \
                 UPDATE tickets SET ticket_status = 'Cancelled' \
                 WHERE flight_id = $1 AND ticket_status <> 'Cancelled' RETURNING * \
             ) \
             SELECT {} FROM cancelled t LEFT JOIN ticket_codes tc ON tc.ticket_code = t.ticket_code \
             ORDER BY t.seat_number",
            TICKET_COLUMNS
        );
        sqlx::query_as::<_, TicketRow>(&sql)
            .bind(flight_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    pub async fn find_details_by_code<'e, E: PgExecutor<'e>>(
        executor: E,
        standardized_code: &str,
    ) -> BookingResult<Option<TicketDetails>> {
        let sql = format!(
            "SELECT {}, f.flight_number, f.departure_time, f.arrival_time, f.flight_status, \
                 c.first_name, c.last_name, c.email, c.phone_number \
             {} WHERE tc.standardized_code = $1",
            TICKET_COLUMNS, DETAILS_QUERY
        );
        sqlx::query_as::<_, DetailsRow>(&sql)
            .bind(standardized_code)
            .fetch_optional(executor)
            .await
            .map_err(db_error)?
            .map(TicketDetails::try_from)
            .transpose()
    }

    /// Tickets of the customer with this email, newest booking first.
    pub async fn find_details_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> BookingResult<Vec<TicketDetails>> {
        let sql = format!(
            "SELECT {}, f.flight_number, f.departure_time, f.arrival_time, f.flight_status, \
                 c.first_name, c.last_name, c.email, c.phone_number \
             {} WHERE LOWER(c.email) = LOWER($1) ORDER BY t.booking_date DESC",
            TICKET_COLUMNS, DETAILS_QUERY
        );
        sqlx::query_as::<_, DetailsRow>(&sql)
            .bind(email)
            .fetch_all(executor)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(TicketDetails::try_from)
            .collect()
    }

    /// Non-cancelled ticket count per ticket class name.
    pub async fn count_active_by_class<'e, E: PgExecutor<'e>>(
        executor: E,
        flight_id: Uuid,
    ) -> BookingResult<Vec<(String, i64)>> {
        sqlx::query_as(
            "SELECT tcl.class_name, COUNT(*) FROM tickets t \
             JOIN ticket_classes tcl ON tcl.id = t.ticket_class_id \
             WHERE t.flight_id = $1 AND t.ticket_status <> 'Cancelled' \
             GROUP BY tcl.class_name",
        )
        .bind(flight_id)
        .fetch_all(executor)
        .await
        .map_err(db_error)
    }
}
