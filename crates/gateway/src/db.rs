//! Business database pool.
//!
//! The SQL tool works on one pooled connection per chat turn. `acquire`
//! deliberately returns `Option`: an exhausted or broken pool is fatal to
//! the turn, signaled by `None` and handled upstream.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

use tt_domain::config::DatabaseConfig;
use tt_domain::error::{Error, Result};

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool against the configured URL.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await
            .map_err(|e| Error::Sql(format!("connecting {}: {e}", cfg.url)))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, embedded setups).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check out one connection, or `None` when the pool cannot provide
    /// one within its acquire timeout.
    pub async fn acquire(&self) -> Option<PoolConnection<Sqlite>> {
        match self.pool.acquire().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::error!(error = %e, "database connection unavailable");
                None
            }
        }
    }
}
