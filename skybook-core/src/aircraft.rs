use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::cabin::CabinClass;
use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aircraft {
    pub id: Uuid,
    pub aircraft_type: String,
    pub manufacturer: Option<String>,
    pub seat_layout: SeatLayout,
    #[serde(flatten)]
    pub totals: SeatTotals,
}

/// Declared per-class seat capacity of an aircraft.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatTotals {
    pub total_first_class_seats: i32,
    pub total_business_class_seats: i32,
    pub total_economy_class_seats: i32,
}

impl SeatTotals {
    pub fn get(&self, cabin: CabinClass) -> i32 {
        match cabin {
            CabinClass::First => self.total_first_class_seats,
            CabinClass::Business => self.total_business_class_seats,
            CabinClass::Economy => self.total_economy_class_seats,
        }
    }
}

/// Seat template of an aircraft: cabin class -> ordered cabins -> ordered seat designators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeatLayout {
    #[serde(default)]
    pub first_class: Vec<Cabin>,
    #[serde(default)]
    pub business_class: Vec<Cabin>,
    #[serde(default)]
    pub economy_class: Vec<Cabin>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cabin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_seats")]
    pub seats: Vec<String>,
}

// Stored layouts hold either "12A" or {"seat_number": "12A"}.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeatEntry {
    Plain(String),
    Detailed { seat_number: String },
}

fn deserialize_seats<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<SeatEntry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            SeatEntry::Plain(seat) => seat,
            SeatEntry::Detailed { seat_number } => seat_number,
        })
        .collect())
}

impl Cabin {
    pub fn new(name: Option<&str>, seats: &[&str]) -> Self {
        Self {
            name: name.map(String::from),
            seats: seats.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SeatLayout {
    pub fn cabins(&self, cabin: CabinClass) -> &[Cabin] {
        match cabin {
            CabinClass::First => &self.first_class,
            CabinClass::Business => &self.business_class,
            CabinClass::Economy => &self.economy_class,
        }
    }

    pub fn seats(&self, cabin: CabinClass) -> impl Iterator<Item = &str> {
        self.cabins(cabin)
            .iter()
            .flat_map(|c| c.seats.iter().map(String::as_str))
    }

    pub fn seat_count(&self, cabin: CabinClass) -> usize {
        self.cabins(cabin).iter().map(|c| c.seats.len()).sum()
    }

    pub fn contains_seat(&self, cabin: CabinClass, seat: &str) -> bool {
        self.seats(cabin).any(|s| s == seat)
    }

    /// True iff `seat` sits in one of the cabins of the class named `class_name`.
    pub fn is_seat_in_class(&self, class_name: &str, seat: &str) -> bool {
        CabinClass::from_class_name(class_name)
            .map(|cabin| self.contains_seat(cabin, seat))
            .unwrap_or(false)
    }

    /// Checks the layout against declared totals. Designators must be non-empty and
    /// unique across the whole aircraft, since seat uniqueness is enforced per flight.
    pub fn validate(&self, totals: &SeatTotals) -> BookingResult<()> {
        for cabin in CabinClass::ALL {
            let counted = self.seat_count(cabin);
            let declared = totals.get(cabin);
            if declared < 0 || counted != declared as usize {
                return Err(BookingError::Validation(format!(
                    "seat_layout has {} {} seats but {} declared",
                    counted, cabin, declared
                )));
            }
        }

        let mut seen = HashSet::new();
        for cabin in CabinClass::ALL {
            for seat in self.seats(cabin) {
                if seat.trim().is_empty() {
                    return Err(BookingError::Validation(format!("empty seat designator in {}", cabin)));
                }
                if !seen.insert(seat) {
                    return Err(BookingError::Validation(format!("seat {} appears more than once", seat)));
                }
            }
        }

        Ok(())
    }
}
