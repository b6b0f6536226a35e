pub mod inventory;
pub mod pricing;
pub mod seat_map;

pub use inventory::SeatLedger;
pub use pricing::FareQuote;
pub use seat_map::{SeatMap, SeatSelection};
