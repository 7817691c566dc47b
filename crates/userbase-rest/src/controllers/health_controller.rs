//! Health check controller.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;
use userbase_core::HealthStatus;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Application version.
    pub version: String,
}

/// Status of one dependency in a readiness report.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub components: Vec<ComponentStatus>,
}

/// Creates the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
}

/// Health check endpoint. Always succeeds while the process serves requests.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint.
///
/// Returns 503 when any registered dependency is unhealthy. A degraded
/// dependency keeps the service ready.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let mut ready = true;
    let mut components = Vec::with_capacity(state.health_checks.len());

    for check in &state.health_checks {
        let (status, reason) = match check.check().await {
            HealthStatus::Healthy => ("healthy", None),
            HealthStatus::Degraded(reason) => ("degraded", Some(reason)),
            HealthStatus::Unhealthy(reason) => {
                warn!(component = check.name(), %reason, "Readiness check failed");
                ready = false;
                ("unhealthy", Some(reason))
            }
        };
        components.push(ComponentStatus {
            name: check.name().to_string(),
            status: status.to_string(),
            reason,
        });
    }

    let (code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            components,
        }),
    )
}
