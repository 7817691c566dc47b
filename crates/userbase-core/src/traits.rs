//! Core traits shared across layers.

use crate::UserbaseResult;
use async_trait::async_trait;

/// One-way password encoding.
///
/// Implementations produce self-describing hashes (PHC strings) so that
/// `matches` needs nothing but the stored value.
pub trait PasswordEncoder: Send + Sync {
    /// Hashes a plaintext password.
    fn encode(&self, plain: &str) -> UserbaseResult<String>;

    /// Checks a plaintext password against a stored hash.
    fn matches(&self, plain: &str, encoded: &str) -> UserbaseResult<bool>;
}

/// Trait for health checks.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Returns the name of this health check.
    fn name(&self) -> &str;

    /// Performs the health check.
    async fn check(&self) -> HealthStatus;
}

/// Health check status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The component is healthy.
    Healthy,
    /// The component is degraded but functional.
    Degraded(String),
    /// The component is unhealthy.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns true if the status is healthy.
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Returns true if the status is unhealthy.
    #[must_use]
    pub const fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}
