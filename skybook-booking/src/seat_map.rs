use skybook_catalog::{SeatMap, SeatSelection};
use skybook_core::{Aircraft, BookingError, BookingResult, Flight, TicketClass};
use skybook_store::{AircraftRepository, DbClient, FlightRepository, TicketClassRepository, TicketRepository};
use sqlx::PgConnection;
use uuid::Uuid;

pub(crate) async fn load_aircraft(conn: &mut PgConnection, flight: &Flight) -> BookingResult<Aircraft> {
    AircraftRepository::find(conn, flight.aircraft_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Aircraft {}", flight.aircraft_id)))
}

pub(crate) async fn load_ticket_class(conn: &mut PgConnection, class_id: Uuid) -> BookingResult<TicketClass> {
    TicketClassRepository::find(conn, class_id)
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Ticket class {}", class_id)))
}

/// Unlocked reads of seat state. Results are hints: booking re-checks under the flight lock.
#[derive(Clone)]
pub struct SeatMapResolver {
    db: DbClient,
}

impl SeatMapResolver {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    pub async fn resolve_seat_map(&self, flight_id: Uuid) -> BookingResult<SeatMap> {
        let mut conn = self.db.pool.acquire().await.map_err(skybook_store::db_error)?;
        let flight = FlightRepository::find(&mut *conn, flight_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Flight {}", flight_id)))?;
        let aircraft = load_aircraft(&mut conn, &flight).await?;
        let booked = TicketRepository::booked_seats(&mut *conn, flight_id).await?;

        Ok(SeatMap::annotate(&aircraft.seat_layout, &booked))
    }

    pub async fn validate_seat_selection(
        &self,
        flight_id: Uuid,
        seat_number: &str,
        ticket_class_id: Uuid,
    ) -> BookingResult<()> {
        let mut conn = self.db.pool.acquire().await.map_err(skybook_store::db_error)?;
        let flight = FlightRepository::find(&mut *conn, flight_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Flight {}", flight_id)))?;
        let aircraft = load_aircraft(&mut conn, &flight).await?;
        let class = load_ticket_class(&mut conn, ticket_class_id).await?;
        let cabin = class.cabin()?;

        let seats = [seat_number.to_string()];
        let taken = TicketRepository::taken_seats(&mut *conn, flight_id, &seats).await?;
        SeatSelection::new(&aircraft.seat_layout, cabin, &class.class_name).check_all(&seats, &taken)
    }
}
