use skybook_core::{Aircraft, BookingResult, SeatLayout, SeatTotals, TicketClass};
use sqlx::types::Json;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db_error;

#[derive(sqlx::FromRow)]
struct AircraftRow {
    id: Uuid,
    aircraft_type: String,
    manufacturer: Option<String>,
    seat_layout: Json<SeatLayout>,
    total_first_class_seats: i32,
    total_business_class_seats: i32,
    total_economy_class_seats: i32,
}

impl From<AircraftRow> for Aircraft {
    fn from(row: AircraftRow) -> Self {
        Aircraft {
            id: row.id,
            aircraft_type: row.aircraft_type,
            manufacturer: row.manufacturer,
            seat_layout: row.seat_layout.0,
            totals: SeatTotals {
                total_first_class_seats: row.total_first_class_seats,
                total_business_class_seats: row.total_business_class_seats,
                total_economy_class_seats: row.total_economy_class_seats,
            },
        }
    }
}

pub struct AircraftRepository;

impl AircraftRepository {
    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, aircraft_id: Uuid) -> BookingResult<Option<Aircraft>> {
        let row = sqlx::query_as::<_, AircraftRow>(
            "SELECT id, aircraft_type, manufacturer, seat_layout, total_first_class_seats, \
                 total_business_class_seats, total_economy_class_seats \
             FROM aircrafts WHERE id = $1",
        )
        .bind(aircraft_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error)?;
        Ok(row.map(Aircraft::from))
    }

    /// Stores an aircraft whose layout matches its declared per-class totals.
    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, aircraft: &Aircraft) -> BookingResult<()> {
        aircraft.seat_layout.validate(&aircraft.totals)?;

        sqlx::query(
            "INSERT INTO aircrafts (id, aircraft_type, manufacturer, seat_layout, total_first_class_seats, \
                 total_business_class_seats, total_economy_class_seats) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(aircraft.id)
        .bind(&aircraft.aircraft_type)
        .bind(&aircraft.manufacturer)
        .bind(Json(&aircraft.seat_layout))
        .bind(aircraft.totals.total_first_class_seats)
        .bind(aircraft.totals.total_business_class_seats)
        .bind(aircraft.totals.total_economy_class_seats)
        .execute(executor)
        .await
        .map_err(db_error)?;

        tracing::info!("Aircraft {} ({}) stored", aircraft.id, aircraft.aircraft_type);
        Ok(())
    }
}

pub struct TicketClassRepository;

impl TicketClassRepository {
    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, class_id: Uuid) -> BookingResult<Option<TicketClass>> {
        sqlx::query_as::<_, (Uuid, String, f64)>(
            "SELECT id, class_name, coefficient::FLOAT8 FROM ticket_classes WHERE id = $1",
        )
        .bind(class_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error)
        .map(|row| {
            row.map(|(id, class_name, coefficient)| TicketClass {
                id,
                class_name,
                coefficient,
            })
        })
    }

    pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, class: &TicketClass) -> BookingResult<()> {
        sqlx::query("INSERT INTO ticket_classes (id, class_name, coefficient) VALUES ($1, $2, $3::FLOAT8::NUMERIC)")
            .bind(class.id)
            .bind(&class.class_name)
            .bind(class.coefficient)
            .execute(executor)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
