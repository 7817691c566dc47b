//! Application state for Axum handlers.

use std::sync::Arc;
use userbase_core::HealthCheck;
use userbase_service::UserService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    /// Dependencies probed by the readiness endpoint.
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(user_service: Arc<dyn UserService>) -> Self {
        Self {
            user_service,
            health_checks: Vec::new(),
        }
    }

    /// Adds a dependency to the readiness probe.
    #[must_use]
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.push(check);
        self
    }
}
