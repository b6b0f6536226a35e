use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::cabin::CabinClass;
use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Cancelled,
    Completed,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "Scheduled",
            FlightStatus::Delayed => "Delayed",
            FlightStatus::Cancelled => "Cancelled",
            FlightStatus::Completed => "Completed",
        }
    }

    /// Cancelled and completed flights no longer sell or move.
    pub fn is_closed(&self) -> bool {
        matches!(self, FlightStatus::Cancelled | FlightStatus::Completed)
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(FlightStatus::Scheduled),
            "Delayed" => Ok(FlightStatus::Delayed),
            "Cancelled" => Ok(FlightStatus::Cancelled),
            "Completed" => Ok(FlightStatus::Completed),
            other => Err(BookingError::Storage(format!("unknown flight status '{}'", other))),
        }
    }
}

/// A flight row, including its per-class inventory counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub airline_id: Option<Uuid>,
    pub route_id: Option<Uuid>,
    pub aircraft_id: Uuid,
    pub flight_number: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub flight_status: FlightStatus,
    pub base_first_class_price: f64,
    pub base_business_class_price: f64,
    pub base_economy_class_price: f64,
    pub available_first_class_seats: i32,
    pub available_business_class_seats: i32,
    pub available_economy_class_seats: i32,
}

impl Flight {
    pub fn available_seats(&self, cabin: CabinClass) -> i32 {
        match cabin {
            CabinClass::First => self.available_first_class_seats,
            CabinClass::Business => self.available_business_class_seats,
            CabinClass::Economy => self.available_economy_class_seats,
        }
    }

    pub fn base_price(&self, cabin: CabinClass) -> f64 {
        match cabin {
            CabinClass::First => self.base_first_class_price,
            CabinClass::Business => self.base_business_class_price,
            CabinClass::Economy => self.base_economy_class_price,
        }
    }

    pub fn ensure_open(&self, action: &str) -> BookingResult<()> {
        if self.flight_status.is_closed() {
            return Err(BookingError::InvalidState(format!(
                "cannot {} flight {}: it is {}",
                action, self.flight_number, self.flight_status
            )));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_storage_text() {
        for status in [
            FlightStatus::Scheduled,
            FlightStatus::Delayed,
            FlightStatus::Cancelled,
            FlightStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<FlightStatus>().unwrap(), status);
        }
        assert!("Boarding".parse::<FlightStatus>().is_err());
    }

    #[test]
    fn test_per_class_accessors() {
        let flight = fixtures::flight(FlightStatus::Scheduled);
        assert_eq!(flight.available_seats(CabinClass::Economy), 1);
        assert_eq!(flight.available_seats(CabinClass::Business), 3);
        assert_eq!(flight.base_price(CabinClass::First), 900.0);
    }

    #[test]
    fn test_closed_flights_refuse_changes() {
        assert!(fixtures::flight(FlightStatus::Delayed).ensure_open("book").is_ok());
        let err = fixtures::flight(FlightStatus::Cancelled).ensure_open("book").unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
        assert!(fixtures::flight(FlightStatus::Completed).ensure_open("delay").is_err());
    }
}
