use skybook_core::customer::{Customer, PassengerDetails};
use skybook_core::BookingResult;
use skybook_shared::Masked;
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::db_error;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: Option<String>,
    identity_number: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            email: Masked::from(row.email),
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number.map(Masked::from),
            identity_number: row.identity_number.map(Masked::from),
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, phone_number, identity_number";

pub struct CustomerRepository;

impl CustomerRepository {
    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, customer_id: Uuid) -> BookingResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(customer_id)
            .fetch_optional(executor)
            .await
            .map_err(db_error)?;
        Ok(row.map(Customer::from))
    }

    /// Ids from `customer_ids` with no customer row.
    pub async fn missing<'e, E: PgExecutor<'e>>(executor: E, customer_ids: &[Uuid]) -> BookingResult<Vec<Uuid>> {
        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ANY($1)")
            .bind(customer_ids)
            .fetch_all(executor)
            .await
            .map_err(db_error)?;
        Ok(customer_ids
            .iter()
            .filter(|id| !found.contains(id))
            .copied()
            .collect())
    }

    /// Creates the customer, or refreshes the contact data of the one holding this email.
    pub async fn upsert_by_email(
        tx: &mut Transaction<'_, Postgres>,
        passenger: &PassengerDetails,
    ) -> BookingResult<Customer> {
        let sql = format!(
            "INSERT INTO customers (id, email, first_name, last_name, phone_number, identity_number) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (email) DO UPDATE SET \
                 first_name = EXCLUDED.first_name, \
                 last_name = EXCLUDED.last_name, \
                 phone_number = EXCLUDED.phone_number, \
                 identity_number = COALESCE(EXCLUDED.identity_number, customers.identity_number) \
             RETURNING {}",
            CUSTOMER_COLUMNS
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(passenger.email.trim())
            .bind(&passenger.first_name)
            .bind(&passenger.last_name)
            .bind(&passenger.phone_number)
            .bind(&passenger.identity_number)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error)?;
        Ok(Customer::from(row))
    }

    /// Email and stored credential hash of the customer owning a ticket.
    pub async fn ticket_owner_credentials<'e, E: PgExecutor<'e>>(
        executor: E,
        ticket_id: Uuid,
    ) -> BookingResult<Option<(String, Option<String>)>> {
        sqlx::query_as(
            "SELECT c.email, c.password_hash FROM tickets t \
             JOIN customers c ON c.id = t.customer_id WHERE t.id = $1",
        )
        .bind(ticket_id)
        .fetch_optional(executor)
        .await
        .map_err(db_error)
    }
}
