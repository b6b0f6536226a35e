use skybook_core::BookingResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Transaction};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::db_error;

/// Process-scoped connection pool. Built once at startup, cloned into every component,
/// closed after the server has drained.
#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(settings: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_seconds))
            .connect(&settings.url)
            .await?;

        Ok(Self { pool })
    }

    /// Pool that opens connections on first use.
    pub fn connect_lazy(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(connection_string)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub async fn begin(&self) -> BookingResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(db_error)
    }

    pub async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}
