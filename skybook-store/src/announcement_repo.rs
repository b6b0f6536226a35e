use skybook_core::BookingResult;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::db_error;

pub struct AnnouncementRepository;

impl AnnouncementRepository {
    /// Publishes a flight-cancellation notice inside the cancelling transaction.
    pub async fn record_cancellation(
        tx: &mut Transaction<'_, Postgres>,
        title: &str,
        content: &str,
        created_by: Uuid,
    ) -> BookingResult<Uuid> {
        sqlx::query_scalar(
            "INSERT INTO announcements (id, title, content, type, published_date, created_by) \
             VALUES ($1, $2, $3, 'Cancel', NOW(), $4) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(content)
        .bind(created_by)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)
    }
}
