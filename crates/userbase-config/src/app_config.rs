//! Application configuration structures.

use crate::{Dialect, Environment};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use userbase_core::telemetry::TelemetryConfig;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Password hashing configuration.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Active profile.
    pub environment: Environment,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "userbase".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Enable CORS.
    pub cors_enabled: bool,
    /// CORS allowed origins.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the request timeout as a Duration.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Database configuration.
///
/// Either `url` is set, or the URL is composed from the dialect and the
/// individual connection parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQL dialect.
    pub dialect: Dialect,
    /// Full connection URL. Takes precedence over the parts below.
    pub url: String,
    /// Server host, ignored for SQLite.
    pub host: String,
    /// Server port. Left out of the URL when unset.
    pub port: Option<u16>,
    /// User name, ignored for SQLite.
    pub username: Option<String>,
    /// Password, ignored for SQLite.
    pub password: Option<String>,
    /// Database name, or the file path for SQLite (`:memory:` for an in-memory database).
    pub name: String,
    /// Minimum connection pool size.
    pub min_connections: u32,
    /// Maximum connection pool size.
    pub max_connections: u32,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds.
    pub idle_timeout_secs: u64,
    /// Apply embedded migrations on startup.
    pub run_migrations: bool,
    /// Log every statement at debug level.
    pub log_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Sqlite,
            url: String::new(),
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            name: "userbase.db".to_string(),
            min_connections: 1,
            max_connections: 10,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
            run_migrations: true,
            log_queries: false,
        }
    }
}

impl DatabaseConfig {
    /// Returns the URL to connect with.
    #[must_use]
    pub fn connection_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }

        match self.dialect {
            Dialect::Sqlite if self.name == ":memory:" => "sqlite::memory:".to_string(),
            Dialect::Sqlite => format!("sqlite://{}?mode=rwc", self.name),
            Dialect::Mysql | Dialect::Postgres => {
                let credentials = match (&self.username, &self.password) {
                    (Some(user), Some(pass)) => format!("{user}:{pass}@"),
                    (Some(user), None) => format!("{user}@"),
                    _ => String::new(),
                };
                let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
                format!(
                    "{}://{}{}{}/{}",
                    self.dialect.scheme(),
                    credentials,
                    self.host,
                    port,
                    self.name
                )
            }
        }
    }

    /// Returns the connection URL with any password replaced, for logging.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let raw = self.connection_url();
        match Url::parse(&raw) {
            Ok(mut parsed) if parsed.password().is_some() => {
                if parsed.set_password(Some("****")).is_ok() {
                    parsed.to_string()
                } else {
                    raw
                }
            }
            _ => raw,
        }
    }

    /// Returns the dialect implied by an explicit URL, or the configured one.
    #[must_use]
    pub fn effective_dialect(&self) -> Dialect {
        if self.url.is_empty() {
            self.dialect
        } else {
            Dialect::from_url(&self.url).unwrap_or(self.dialect)
        }
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Returns the idle timeout as a Duration.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 iteration count.
    pub password_hash_cost: u32,
    /// Argon2 memory cost in KiB.
    pub password_memory_kib: u32,
    /// Minimum accepted password length at registration.
    pub password_min_length: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            password_hash_cost: 2,
            password_memory_kib: 19_456,
            password_min_length: 8,
        }
    }
}
