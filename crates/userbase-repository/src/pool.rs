//! Database connection pool management.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use tracing::{info, warn};
use userbase_config::DatabaseConfig;
use userbase_core::{HealthCheck, HealthStatus, UserbaseError, UserbaseResult};

/// Database pool wrapper.
#[derive(Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Creates a new database pool from configuration.
    ///
    /// In-memory databases live as long as their connection, so they get a
    /// single connection that is never recycled.
    pub async fn new(config: &DatabaseConfig) -> UserbaseResult<Self> {
        let dialect = config.effective_dialect();
        if !dialect.is_supported() {
            return Err(UserbaseError::Configuration(format!(
                "database dialect '{dialect}' is not supported by this build"
            )));
        }

        let url = config.connection_url();
        info!("Connecting to SQLite database: {}", config.redacted_url());

        let mut options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| UserbaseError::Configuration(format!("Invalid database URL: {e}")))?
            .foreign_keys(true);
        if !config.log_queries {
            options = options.disable_statement_logging();
        }

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = SqlitePoolOptions::new().acquire_timeout(config.connect_timeout());
        let pool_options = if in_memory {
            pool_options
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options
                .min_connections(config.min_connections)
                .max_connections(config.max_connections)
                .idle_timeout(Some(config.idle_timeout()))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            warn!("Failed to connect to database: {}", e);
            UserbaseError::from_sqlx("connect", e)
        })?;

        info!("SQLite connection pool established");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> UserbaseResult<Self> {
        Self::new(&DatabaseConfig {
            name: ":memory:".to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn inner(&self) -> &SqlitePool {
        &self.pool
    }

    /// Checks if the database connection is healthy.
    pub async fn health_check(&self) -> UserbaseResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| UserbaseError::from_sqlx("health_check", e))?;
        Ok(())
    }

    /// Applies the embedded migrations.
    pub async fn run_migrations(&self) -> UserbaseResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| UserbaseError::Query {
                operation: "run_migrations",
                source: Box::new(e),
            })?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

#[async_trait]
impl HealthCheck for DatabasePool {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        match self.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

impl std::ops::Deref for DatabasePool {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

impl std::fmt::Debug for DatabasePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabasePool")
            .field("size", &self.pool.size())
            .field("num_idle", &self.pool.num_idle())
            .finish()
    }
}
