use serde::{Deserialize, Serialize};
use skybook_core::{BookingError, BookingResult, CabinClass, Flight, SeatTotals};

/// Per-class unsold seat counters of one flight.
///
/// Mirrors the `available_*_seats` columns; the store applies the same rules in SQL while
/// the flight row is locked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatLedger {
    pub first_class: i32,
    pub business_class: i32,
    pub economy_class: i32,
}

impl SeatLedger {
    pub fn from_flight(flight: &Flight) -> Self {
        Self {
            first_class: flight.available_first_class_seats,
            business_class: flight.available_business_class_seats,
            economy_class: flight.available_economy_class_seats,
        }
    }

    /// A fresh flight sells every seat the aircraft declares.
    pub fn full(totals: &SeatTotals) -> Self {
        Self {
            first_class: totals.total_first_class_seats,
            business_class: totals.total_business_class_seats,
            economy_class: totals.total_economy_class_seats,
        }
    }

    pub fn available(&self, cabin: CabinClass) -> i32 {
        match cabin {
            CabinClass::First => self.first_class,
            CabinClass::Business => self.business_class,
            CabinClass::Economy => self.economy_class,
        }
    }

    fn slot(&mut self, cabin: CabinClass) -> &mut i32 {
        match cabin {
            CabinClass::First => &mut self.first_class,
            CabinClass::Business => &mut self.business_class,
            CabinClass::Economy => &mut self.economy_class,
        }
    }

    pub fn ensure_available(&self, cabin: CabinClass, quantity: i32) -> BookingResult<()> {
        let available = self.available(cabin);
        if available < quantity {
            return Err(BookingError::NoAvailability {
                requested: quantity,
                available,
            });
        }
        Ok(())
    }

    /// Applies a signed delta. A decrement below zero fails and leaves the ledger untouched.
    pub fn apply(&mut self, cabin: CabinClass, delta: i32) -> BookingResult<i32> {
        let current = self.available(cabin);
        let next = current + delta;
        if next < 0 {
            return Err(BookingError::NoAvailability {
                requested: -delta,
                available: current,
            });
        }
        *self.slot(cabin) = next;
        Ok(next)
    }

    /// `available + active tickets == total` for every class.
    pub fn is_conserved(&self, active_tickets: &SeatLedger, totals: &SeatTotals) -> bool {
        CabinClass::ALL
            .iter()
            .all(|&cabin| self.available(cabin) + active_tickets.available(cabin) == totals.get(cabin))
    }
}
