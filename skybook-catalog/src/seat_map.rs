use serde::{Deserialize, Serialize};
use skybook_core::{BookingError, BookingResult, CabinClass, SeatLayout};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatState {
    pub seat_number: String,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CabinMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub seats: Vec<SeatState>,
}

/// A flight's seat layout with every seat flagged booked or free.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeatMap {
    pub first_class: Vec<CabinMap>,
    pub business_class: Vec<CabinMap>,
    pub economy_class: Vec<CabinMap>,
}

impl SeatMap {
    /// `booked` holds the designators of the flight's active tickets.
    pub fn annotate(layout: &SeatLayout, booked: &HashSet<String>) -> SeatMap {
        let overlay = |cabin: CabinClass| -> Vec<CabinMap> {
            layout
                .cabins(cabin)
                .iter()
                .map(|c| CabinMap {
                    name: c.name.clone(),
                    seats: c
                        .seats
                        .iter()
                        .map(|seat| SeatState {
                            seat_number: seat.clone(),
                            is_booked: booked.contains(seat),
                        })
                        .collect(),
                })
                .collect()
        };

        SeatMap {
            first_class: overlay(CabinClass::First),
            business_class: overlay(CabinClass::Business),
            economy_class: overlay(CabinClass::Economy),
        }
    }

    pub fn cabins(&self, cabin: CabinClass) -> &[CabinMap] {
        match cabin {
            CabinClass::First => &self.first_class,
            CabinClass::Business => &self.business_class,
            CabinClass::Economy => &self.economy_class,
        }
    }

    pub fn free_seats(&self, cabin: CabinClass) -> usize {
        self.cabins(cabin)
            .iter()
            .flat_map(|c| c.seats.iter())
            .filter(|s| !s.is_booked)
            .count()
    }
}

/// Seat rules for one ticket class on one aircraft layout.
pub struct SeatSelection<'a> {
    layout: &'a SeatLayout,
    cabin: CabinClass,
    class_name: &'a str,
}

impl<'a> SeatSelection<'a> {
    pub fn new(layout: &'a SeatLayout, cabin: CabinClass, class_name: &'a str) -> Self {
        Self { layout, cabin, class_name }
    }

    pub fn check_in_class(&self, seat: &str) -> BookingResult<()> {
        if seat.trim().is_empty() || !self.layout.contains_seat(self.cabin, seat) {
            return Err(BookingError::InvalidSeat {
                seat: seat.to_string(),
                class_name: self.class_name.to_string(),
            });
        }
        Ok(())
    }

    /// Validates seats in request order. `taken` holds seats already held by active tickets.
    /// A seat requested twice counts as taken on its second appearance.
    pub fn check_all<S: AsRef<str>>(&self, seats: &[S], taken: &HashSet<String>) -> BookingResult<()> {
        let mut requested = HashSet::new();
        for seat in seats {
            let seat = seat.as_ref();
            self.check_in_class(seat)?;
            if taken.contains(seat) || !requested.insert(seat) {
                return Err(BookingError::SeatTaken(seat.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybook_core::Cabin;

    fn layout() -> SeatLayout {
        SeatLayout {
            first_class: vec![Cabin::new(None, &["1A"])],
            business_class: vec![Cabin::new(Some("Upper"), &["5A", "5B"])],
            economy_class: vec![Cabin::new(None, &["12A", "12B", "12C"])],
        }
    }

    fn booked(seats: &[&str]) -> HashSet<String> {
        seats.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_annotate_flags_booked_seats() {
        let map = SeatMap::annotate(&layout(), &booked(&["12B", "5A"]));
        assert_eq!(map.free_seats(CabinClass::Economy), 2);
        assert_eq!(map.free_seats(CabinClass::Business), 1);
        assert_eq!(map.business_class[0].name.as_deref(), Some("Upper"));
        assert!(map.economy_class[0].seats[1].is_booked);
        assert!(!map.economy_class[0].seats[0].is_booked);
    }

    #[test]
    fn test_annotated_map_json_shape() {
        let map = SeatMap::annotate(&layout(), &booked(&["1A"]));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["first_class"][0]["seats"][0]["seat_number"], "1A");
        assert_eq!(json["first_class"][0]["seats"][0]["is_booked"], true);
    }

    #[test]
    fn test_check_in_class() {
        let layout = layout();
        let selection = SeatSelection::new(&layout, CabinClass::Economy, "Economy Class");
        assert!(selection.check_in_class("12A").is_ok());
        assert!(matches!(
            selection.check_in_class("1A"),
            Err(BookingError::InvalidSeat { .. })
        ));
        assert!(selection.check_in_class("").is_err());
    }

    #[test]
    fn test_check_all_detects_taken_and_duplicates() {
        let layout = layout();
        let selection = SeatSelection::new(&layout, CabinClass::Economy, "Economy Class");

        assert!(selection.check_all(&["12A", "12B"], &booked(&[])).is_ok());

        let err = selection.check_all(&["12A", "12C"], &booked(&["12C"])).unwrap_err();
        assert!(matches!(err, BookingError::SeatTaken(ref s) if s == "12C"));

        let err = selection.check_all(&["12A", "12A"], &booked(&[])).unwrap_err();
        assert!(matches!(err, BookingError::SeatTaken(_)));

        // An invalid seat anywhere fails the whole selection
        let err = selection.check_all(&["12A", "5A"], &booked(&[])).unwrap_err();
        assert!(matches!(err, BookingError::InvalidSeat { .. }));
    }
}
