//! Application builder.

use crate::startup::print_startup_info;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use userbase_config::AppConfig;
use userbase_core::{UserbaseError, UserbaseResult};
use userbase_repository::{DatabasePool, UserDao};
use userbase_rest::{create_router, AppState};
use userbase_security::PasswordHasher;
use userbase_service::UserServiceImpl;

/// A wired application: database pool, services and router.
pub struct Application {
    config: AppConfig,
    pool: DatabasePool,
    router: Router,
}

impl Application {
    /// Connects to the database, applies migrations when enabled and wires
    /// every layer together.
    pub async fn build(config: AppConfig) -> UserbaseResult<Self> {
        info!(database = %config.database.redacted_url(), "Connecting to database");
        let pool = DatabasePool::new(&config.database).await?;

        if config.database.run_migrations {
            pool.run_migrations().await?;
        }

        let user_repository = Arc::new(UserDao::new(pool.inner().clone()));
        let password_hasher = Arc::new(PasswordHasher::from_config(&config.security)?);
        let user_service = UserServiceImpl::new(user_repository, password_hasher)
            .with_password_min_length(config.security.password_min_length);

        let state = AppState::new(Arc::new(user_service)).with_health_check(Arc::new(pool.clone()));
        let router = create_router(state, &config.server);

        Ok(Self {
            config,
            pool,
            router,
        })
    }

    /// Returns the database pool.
    #[must_use]
    pub const fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Returns a handle to the router.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> UserbaseResult<TcpListener> {
        let addr = self.config.server.addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| UserbaseError::Configuration(format!("Failed to bind {addr}: {e}")))
    }

    /// Serves requests on `listener` until `shutdown` resolves, then closes
    /// the pool.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> UserbaseResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| UserbaseError::Internal(format!("Failed to read local address: {e}")))?;
        print_startup_info(addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| UserbaseError::Internal(format!("REST server error: {e}")))?;

        self.pool.close().await;
        info!("Server shutdown complete");
        Ok(())
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("addr", &self.config.server.addr())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
