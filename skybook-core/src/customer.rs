use serde::{Deserialize, Serialize};
use skybook_shared::Masked;
use uuid::Uuid;

use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub email: Masked<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<Masked<String>>,
    pub identity_number: Option<Masked<String>>,
}

/// Contact data of a passenger booked together with customer creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub identity_number: Option<String>,
}

impl PassengerDetails {
    pub fn validate(&self) -> BookingResult<()> {
        let missing = [
            ("email", &self.email),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone_number", &self.phone_number),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        if let Some((field, _)) = missing {
            return Err(BookingError::Validation(format!("passenger {} is required", field)));
        }
        if !self.email.contains('@') {
            return Err(BookingError::Validation("passenger email is invalid".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger() -> PassengerDetails {
        PassengerDetails {
            email: "jane@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone_number: "+84123456789".to_string(),
            identity_number: None,
        }
    }

    #[test]
    fn test_complete_passenger_is_valid() {
        assert!(passenger().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_named() {
        let p = PassengerDetails { phone_number: " ".to_string(), ..passenger() };
        let err = p.validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: passenger phone_number is required");

        let p = PassengerDetails { email: "jane.example.com".to_string(), ..passenger() };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_customer_debug_masks_contact_data() {
        let customer = Customer {
            id: Uuid::new_v4(),
            email: Masked("jane@example.com".to_string()),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone_number: Some(Masked("+84123456789".to_string())),
            identity_number: None,
        };
        let debug = format!("{:?}", customer);
        assert!(!debug.contains("jane@example.com"));
        assert!(!debug.contains("+84123456789"));
    }
}
