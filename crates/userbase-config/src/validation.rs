//! Configuration validation module.
//!
//! Collects every problem in a configuration instead of stopping at the
//! first, so a misconfigured deployment reports everything in one pass.

use crate::{AppConfig, DatabaseConfig, Dialect, SecurityConfig, ServerConfig};
use std::fmt;
use url::Url;
use userbase_core::telemetry::TelemetryConfig;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// No driver for the dialect is compiled in.
    UnsupportedDialect { dialect: Dialect },
    /// Database name or file is empty.
    MissingDatabaseName,
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Password hash cost is invalid.
    InvalidHashCost { value: u32, minimum: u32, maximum: u32 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {name}: {value} (must be 1-65535)")
            }
            Self::InvalidPoolSize { min, max } => write!(
                f,
                "Invalid pool size: min ({min}) cannot be greater than max ({max})"
            ),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {value} exceeds maximum allowed ({maximum})")
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {url_type} URL: {message}")
            }
            Self::UnsupportedDialect { dialect } => write!(
                f,
                "Database dialect '{dialect}' is not supported by this build (supported: sqlite)"
            ),
            Self::MissingDatabaseName => write!(f, "Database name must not be empty"),
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{name}' must be positive, got {value}")
            }
            Self::InvalidHashCost {
                value,
                minimum,
                maximum,
            } => write!(
                f,
                "Invalid password hash cost: {value} (must be between {minimum} and {maximum})"
            ),
            Self::InvalidLogLevel { value } => write!(
                f,
                "Invalid log level: '{value}' (valid: trace, debug, info, warn, error, off)"
            ),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Minimum Argon2 iteration count.
    const MIN_HASH_COST: u32 = 1;
    /// Maximum Argon2 iteration count.
    const MAX_HASH_COST: u32 = 16;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "error", "off"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_server(&config.server, &mut result);
        Self::validate_database(&config.database, &mut result);
        Self::validate_security(&config.security, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_server(config: &ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }

        if config.request_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "server.request_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_database(config: &DatabaseConfig, result: &mut ValidationResult) {
        let dialect = config.effective_dialect();
        if !dialect.is_supported() {
            result.add_error(ConfigValidationError::UnsupportedDialect { dialect });
        }

        if config.url.is_empty() {
            if config.name.trim().is_empty() {
                result.add_error(ConfigValidationError::MissingDatabaseName);
            }
        } else if Dialect::from_url(&config.url).is_none() || Url::parse(&config.url).is_err() {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with sqlite:, mysql:// or postgres://".to_string(),
            });
        }

        if config.port == Some(0) {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "database.port".to_string(),
                value: 0,
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.connect_timeout_secs == 0 {
            result.add_error(ConfigValidationError::NonPositiveTimeout {
                name: "database.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
    }

    fn validate_security(config: &SecurityConfig, result: &mut ValidationResult) {
        if !(Self::MIN_HASH_COST..=Self::MAX_HASH_COST).contains(&config.password_hash_cost) {
            result.add_error(ConfigValidationError::InvalidHashCost {
                value: config.password_hash_cost,
                minimum: Self::MIN_HASH_COST,
                maximum: Self::MAX_HASH_COST,
            });
        }
    }

    /// Accepts a bare level or a comma-separated list of `target=level` directives.
    fn validate_observability(config: &TelemetryConfig, result: &mut ValidationResult) {
        let valid = config.log_level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or(directive).trim();
            Self::VALID_LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        });

        if !valid {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.database.min_connections = 20;
        config.database.max_connections = 5;
        config.security.password_hash_cost = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ConfigValidationError::InvalidPoolSize { min: 20, max: 5 }));
    }

    #[test]
    fn test_rejects_unsupported_dialect() {
        let mut config = AppConfig::default();
        config.database.dialect = Dialect::Postgres;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::UnsupportedDialect {
                dialect: Dialect::Postgres
            }]
        );
    }

    #[test]
    fn test_dialect_of_explicit_url_is_checked() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://root@localhost/users".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ConfigValidationError::UnsupportedDialect { dialect: Dialect::Mysql }
        ));
    }

    #[test]
    fn test_rejects_unknown_url_scheme() {
        let mut config = AppConfig::default();
        config.database.url = "redis://localhost".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::InvalidUrl { .. })));
    }

    #[test]
    fn test_log_directives() {
        let mut config = AppConfig::default();
        config.observability.log_level = "info,userbase_repository=trace".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());

        config.observability.log_level = "loud".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::InvalidLogLevel {
                value: "loud".to_string()
            }]
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConfigValidationError::UnsupportedDialect {
            dialect: Dialect::Mysql,
        };
        assert!(err.to_string().contains("'mysql'"));
    }
}
