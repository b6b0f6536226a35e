use chrono::{DateTime, Utc};
use skybook_core::{BookingError, BookingResult, CabinClass, Flight, FlightStatus};
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::db_error;

const FLIGHT_COLUMNS: &str = "id, airline_id, route_id, aircraft_id, flight_number, \
     departure_time, arrival_time, flight_status, \
     base_first_class_price::FLOAT8 AS base_first_class_price, \
     base_business_class_price::FLOAT8 AS base_business_class_price, \
     base_economy_class_price::FLOAT8 AS base_economy_class_price, \
     available_first_class_seats, available_business_class_seats, available_economy_class_seats";

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    airline_id: Option<Uuid>,
    route_id: Option<Uuid>,
    aircraft_id: Uuid,
    flight_number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    flight_status: String,
    base_first_class_price: f64,
    base_business_class_price: f64,
    base_economy_class_price: f64,
    available_first_class_seats: i32,
    available_business_class_seats: i32,
    available_economy_class_seats: i32,
}

impl TryFrom<FlightRow> for Flight {
    type Error = BookingError;

    fn try_from(row: FlightRow) -> Result<Self, Self::Error> {
        Ok(Flight {
            id: row.id,
            airline_id: row.airline_id,
            route_id: row.route_id,
            aircraft_id: row.aircraft_id,
            flight_number: row.flight_number,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            flight_status: row.flight_status.parse()?,
            base_first_class_price: row.base_first_class_price,
            base_business_class_price: row.base_business_class_price,
            base_economy_class_price: row.base_economy_class_price,
            available_first_class_seats: row.available_first_class_seats,
            available_business_class_seats: row.available_business_class_seats,
            available_economy_class_seats: row.available_economy_class_seats,
        })
    }
}

/// Flight rows and the per-class seat counters stored on them.
pub struct FlightRepository;

impl FlightRepository {
    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, flight_id: Uuid) -> BookingResult<Option<Flight>> {
        let sql = format!("SELECT {} FROM flights WHERE id = $1", FLIGHT_COLUMNS);
        sqlx::query_as::<_, FlightRow>(&sql)
            .bind(flight_id)
            .fetch_optional(executor)
            .await
            .map_err(db_error)?
            .map(Flight::try_from)
            .transpose()
    }

    /// `SELECT ... FOR UPDATE`: blocks every other booking, cancellation or schedule change
    /// on this flight until `tx` ends.
    pub async fn lock(tx: &mut Transaction<'_, Postgres>, flight_id: Uuid) -> BookingResult<Flight> {
        let sql = format!("SELECT {} FROM flights WHERE id = $1 FOR UPDATE", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(flight_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| BookingError::NotFound(format!("Flight {}", flight_id)))?;
        Flight::try_from(row)
    }

    /// Adds `delta` to the class counter and returns the new value. A decrement that would go
    /// below zero leaves the row untouched and fails with `NoAvailability`.
    pub async fn adjust_available_seats(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
        cabin: CabinClass,
        delta: i32,
    ) -> BookingResult<i32> {
        let column = cabin.available_seats_column();
        let sql = format!(
            "UPDATE flights SET {col} = {col} + $1 WHERE id = $2 AND {col} + $1 >= 0 RETURNING {col}",
            col = column
        );
        let updated: Option<i32> = sqlx::query_scalar(&sql)
            .bind(delta)
            .bind(flight_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error)?;

        match updated {
            Some(value) => Ok(value),
            None => {
                let sql = format!("SELECT {} FROM flights WHERE id = $1", column);
                let available: Option<i32> = sqlx::query_scalar(&sql)
                    .bind(flight_id)
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(db_error)?;
                match available {
                    Some(available) => Err(BookingError::NoAvailability {
                        requested: -delta,
                        available,
                    }),
                    None => Err(BookingError::NotFound(format!("Flight {}", flight_id))),
                }
            }
        }
    }

    pub async fn reschedule(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
        departure_time: DateTime<Utc>,
        arrival_time: DateTime<Utc>,
    ) -> BookingResult<Flight> {
        let sql = format!(
            "UPDATE flights SET departure_time = $1, arrival_time = $2, flight_status = $3 \
             WHERE id = $4 RETURNING {}",
            FLIGHT_COLUMNS
        );
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(departure_time)
            .bind(arrival_time)
            .bind(FlightStatus::Delayed.as_str())
            .bind(flight_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error)?;
        Flight::try_from(row)
    }

    pub async fn set_status(
        tx: &mut Transaction<'_, Postgres>,
        flight_id: Uuid,
        status: FlightStatus,
    ) -> BookingResult<Flight> {
        let sql = format!("UPDATE flights SET flight_status = $1 WHERE id = $2 RETURNING {}", FLIGHT_COLUMNS);
        let row = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(status.as_str())
            .bind(flight_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error)?;
        Flight::try_from(row)
    }
}
