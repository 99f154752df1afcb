use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::store::{DocumentStore, PgDocumentStore, UnavailableStore};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Builds the pool without connecting; connections open on first use so
    /// the service starts even while the database is down.
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)?;

        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping")?;
        Ok(())
    }
}

/// Opens the persistence gateway described by `config`.
///
/// Without `DATABASE_URL` every write fails. A configured but unreachable
/// database is not fatal; its collection tables are created on the next start.
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let Some(ref url) = config.database_url else {
        tracing::warn!("No database configured; persistence disabled");
        return Ok(Arc::new(UnavailableStore::default()));
    };

    let db = Database::connect_lazy(url)?;
    match db.ping().await {
        Ok(()) => tracing::info!("Database connection pool established"),
        Err(e) => tracing::warn!("Database not reachable at startup: {}", e),
    }

    let store = PgDocumentStore::new(db.pool, config.schema())?;
    if let Err(e) = store.ensure_schema().await {
        tracing::warn!("Could not prepare collections: {}", e);
    }

    Ok(Arc::new(store))
}
