use serde::{Deserialize, Serialize};
use std::fmt;

/// The three cabin classes a flight sells. Every ticket-class name, seat-layout key and
/// ledger column is resolved through this one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CabinClass {
    #[serde(rename = "first_class")]
    First,
    #[serde(rename = "business_class")]
    Business,
    #[serde(rename = "economy_class")]
    Economy,
}

struct CabinColumns {
    class: CabinClass,
    layout_key: &'static str,
    available_seats: &'static str,
    base_price: &'static str,
    total_seats: &'static str,
}

static CABIN_TABLE: [CabinColumns; 3] = [
    CabinColumns {
        class: CabinClass::First,
        layout_key: "first_class",
        available_seats: "available_first_class_seats",
        base_price: "base_first_class_price",
        total_seats: "total_first_class_seats",
    },
    CabinColumns {
        class: CabinClass::Business,
        layout_key: "business_class",
        available_seats: "available_business_class_seats",
        base_price: "base_business_class_price",
        total_seats: "total_business_class_seats",
    },
    CabinColumns {
        class: CabinClass::Economy,
        layout_key: "economy_class",
        available_seats: "available_economy_class_seats",
        base_price: "base_economy_class_price",
        total_seats: "total_economy_class_seats",
    },
];

/// Lower-cases and joins whitespace runs with `_`: "Business  Class" -> "business_class".
pub fn canonical_key(class_name: &str) -> String {
    class_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

impl CabinClass {
    pub const ALL: [CabinClass; 3] = [CabinClass::First, CabinClass::Business, CabinClass::Economy];

    /// Maps a ticket-class name ("Economy Class") to its cabin. Unknown names map to `None`.
    pub fn from_class_name(class_name: &str) -> Option<CabinClass> {
        CabinClass::from_layout_key(&canonical_key(class_name))
    }

    pub fn from_layout_key(key: &str) -> Option<CabinClass> {
        CABIN_TABLE
            .iter()
            .find(|row| row.layout_key == key)
            .map(|row| row.class)
    }

    fn columns(self) -> &'static CabinColumns {
        match self {
            CabinClass::First => &CABIN_TABLE[0],
            CabinClass::Business => &CABIN_TABLE[1],
            CabinClass::Economy => &CABIN_TABLE[2],
        }
    }

    pub fn layout_key(self) -> &'static str {
        self.columns().layout_key
    }

    /// Ledger column on `flights`. Static, so it is safe to splice into SQL.
    pub fn available_seats_column(self) -> &'static str {
        self.columns().available_seats
    }

    pub fn base_price_column(self) -> &'static str {
        self.columns().base_price
    }

    pub fn total_seats_column(self) -> &'static str {
        self.columns().total_seats
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.layout_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_map_to_cabins() {
        assert_eq!(CabinClass::from_class_name("First Class"), Some(CabinClass::First));
        assert_eq!(CabinClass::from_class_name("Business Class"), Some(CabinClass::Business));
        assert_eq!(CabinClass::from_class_name("economy class"), Some(CabinClass::Economy));
        assert_eq!(CabinClass::from_class_name("  Economy   Class "), Some(CabinClass::Economy));
        assert_eq!(CabinClass::from_class_name("Premium Economy"), None);
        assert_eq!(CabinClass::from_class_name(""), None);
    }

    #[test]
    fn test_columns_follow_layout_key() {
        for cabin in CabinClass::ALL {
            let key = cabin.layout_key();
            assert_eq!(cabin.available_seats_column(), format!("available_{}_seats", key));
            assert_eq!(cabin.base_price_column(), format!("base_{}_price", key));
            assert_eq!(cabin.total_seats_column(), format!("total_{}_seats", key));
            assert_eq!(CabinClass::from_layout_key(key), Some(cabin));
        }
    }

    #[test]
    fn test_serde_uses_layout_keys() {
        assert_eq!(serde_json::to_string(&CabinClass::Business).unwrap(), "\"business_class\"");
        let parsed: CabinClass = serde_json::from_str("\"first_class\"").unwrap();
        assert_eq!(parsed, CabinClass::First);
    }
}
