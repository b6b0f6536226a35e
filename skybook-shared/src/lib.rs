pub mod models;
pub mod pii;

pub use pii::{redact_email, Masked};
