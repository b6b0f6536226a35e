use skybook_core::BookingResult;
use sqlx::{PgExecutor, Postgres, Transaction};
use uuid::Uuid;

use crate::db_error;

/// `ticket_codes`: human-facing standardized code -> opaque ticket code.
pub struct CodeRepository;

impl CodeRepository {
    /// Inserts the mapping unless the code is already taken. Returns whether it was reserved.
    pub async fn try_reserve(
        tx: &mut Transaction<'_, Postgres>,
        standardized_code: &str,
        ticket_code: Uuid,
    ) -> BookingResult<bool> {
        let result = sqlx::query(
            "INSERT INTO ticket_codes (standardized_code, ticket_code) VALUES ($1, $2) \
             ON CONFLICT (standardized_code) DO NOTHING",
        )
        .bind(standardized_code)
        .bind(ticket_code)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        standardized_code: &str,
        ticket_code: Uuid,
    ) -> BookingResult<()> {
        sqlx::query("INSERT INTO ticket_codes (standardized_code, ticket_code) VALUES ($1, $2)")
            .bind(standardized_code)
            .bind(ticket_code)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// True when the code itself or any `<code>-<n>` member code is mapped.
    pub async fn group_in_use<'e, E: PgExecutor<'e>>(executor: E, group_code: &str) -> BookingResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM ticket_codes \
                 WHERE standardized_code = $1 OR standardized_code LIKE $1 || '-%' \
             )",
        )
        .bind(group_code)
        .fetch_one(executor)
        .await
        .map_err(db_error)
    }

    pub async fn resolve<'e, E: PgExecutor<'e>>(executor: E, standardized_code: &str) -> BookingResult<Option<Uuid>> {
        sqlx::query_scalar("SELECT ticket_code FROM ticket_codes WHERE standardized_code = $1")
            .bind(standardized_code)
            .fetch_optional(executor)
            .await
            .map_err(db_error)
    }
}
