use serde::{Deserialize, Serialize};
use skybook_core::{BookingError, BookingResult, CabinClass, Flight, TicketClass};

/// Price charged for one ticket and where it came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FareQuote {
    pub price: f64,
    /// True when the caller supplied the price.
    pub explicit: bool,
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl FareQuote {
    /// An explicit positive price wins; zero or absent falls back to
    /// `base price for the class * class coefficient`.
    pub fn resolve(
        explicit_price: Option<f64>,
        flight: &Flight,
        cabin: CabinClass,
        ticket_class: &TicketClass,
    ) -> BookingResult<FareQuote> {
        match explicit_price {
            Some(price) if !price.is_finite() || price < 0.0 => Err(BookingError::Validation(
                format!("price must be a non-negative amount, got {}", price),
            )),
            Some(price) if price > 0.0 => Ok(FareQuote {
                price: round_cents(price),
                explicit: true,
            }),
            _ => Ok(FareQuote {
                price: round_cents(flight.base_price(cabin) * ticket_class.coefficient),
                explicit: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skybook_core::FlightStatus;
    use uuid::Uuid;

    fn flight() -> Flight {
        Flight {
            id: Uuid::new_v4(),
            airline_id: None,
            route_id: None,
            aircraft_id: Uuid::new_v4(),
            flight_number: "SB7".to_string(),
            departure_time: Utc::now(),
            arrival_time: Utc::now(),
            flight_status: FlightStatus::Scheduled,
            base_first_class_price: 1000.0,
            base_business_class_price: 333.33,
            base_economy_class_price: 100.0,
            available_first_class_seats: 1,
            available_business_class_seats: 1,
            available_economy_class_seats: 1,
        }
    }

    fn class(coefficient: f64) -> TicketClass {
        TicketClass {
            id: Uuid::new_v4(),
            class_name: "Business Class".to_string(),
            coefficient,
        }
    }

    #[test]
    fn test_default_fare_uses_coefficient() {
        let quote = FareQuote::resolve(None, &flight(), CabinClass::Business, &class(1.5)).unwrap();
        assert_eq!(quote.price, 500.0);
        assert!(!quote.explicit);
    }

    #[test]
    fn test_explicit_price_wins_and_zero_falls_back() {
        let quote = FareQuote::resolve(Some(42.5), &flight(), CabinClass::Economy, &class(2.0)).unwrap();
        assert_eq!(quote, FareQuote { price: 42.5, explicit: true });

        let quote = FareQuote::resolve(Some(0.0), &flight(), CabinClass::Economy, &class(2.0)).unwrap();
        assert_eq!(quote.price, 200.0);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let err = FareQuote::resolve(Some(-1.0), &flight(), CabinClass::Economy, &class(1.0)).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }
}
