//! Tracing subscriber setup.
//!
//! The subscriber is installed once per process by the server binary.
//! `RUST_LOG` takes precedence over the configured level.

use serde::{Deserialize, Serialize};

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive, e.g. `info` or `info,userbase=debug`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info,userbase=debug,tower_http=debug,sqlx=warn".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Returns a configuration error when a subscriber is already installed.
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &TelemetryConfig) -> crate::UserbaseResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| crate::UserbaseError::Configuration(format!("invalid log level: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    installed.map_err(|e| {
        crate::UserbaseError::Configuration(format!("failed to install tracing subscriber: {e}"))
    })?;

    tracing::info!(
        log_level = %config.log_level,
        log_format = ?config.log_format,
        "Tracing initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.log_level.contains("userbase=debug"));
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{"log_level": "warn", "log_format": "json"}"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: TelemetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.log_level, default_log_level());
    }
}
