//! Persistence gateway: owns the Postgres connection pool and the schema migrations.
//!
//! The schema is versioned under `crates/infra/migrations` and applied with
//! [`Database::migrate`] before the server accepts requests. Stores only ever see the
//! pool; they never create or alter tables.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{ConfigError, DatabaseConfig};
use crate::store::{PostgresProductStore, PostgresSubscriptionStore};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to the database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Shared handle to the relational store.
///
/// Cloning is cheap: the pool is reference counted and safe for concurrent use.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a connection pool and verify it with a round trip.
    #[instrument(
        skip(config),
        fields(host = %config.host, port = config.port, database = %config.name),
        err
    )]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, GatewayError> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        info!("database connection established");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply all pending versioned migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        info!("applying database migrations");
        MIGRATOR.run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn product_store(&self) -> PostgresProductStore {
        PostgresProductStore::new(self.pool.clone())
    }

    pub fn subscription_store(&self) -> PostgresSubscriptionStore {
        PostgresSubscriptionStore::new(self.pool.clone())
    }

    /// Close the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}
