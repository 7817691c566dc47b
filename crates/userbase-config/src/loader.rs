//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator, Environment};
use config::{Config, ConfigError, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use userbase_core::UserbaseError;

/// Variable that selects the active profile.
pub const ENVIRONMENT_VAR: &str = "USERBASE_ENVIRONMENT";

/// Prefix of structured overrides, e.g. `USERBASE__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "USERBASE";

/// Flat `DB_*` variables understood for compatibility with existing
/// deployments. Each one overrides the matching `database.*` key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseEnv {
    pub dialect: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl DatabaseEnv {
    /// Reads `DB_DIALECT`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASS` and `DB_NAME`.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            dialect: read("DB_DIALECT"),
            host: read("DB_HOST"),
            port: read("DB_PORT"),
            username: read("DB_USER"),
            password: read("DB_PASS"),
            name: read("DB_NAME"),
        }
    }
}

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
    environment: Environment,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Profile overrides
    /// 3. `config/local.toml` - Untracked local overrides
    /// 4. Environment variables with the `USERBASE__` prefix
    /// 5. `DB_*` variables
    pub fn new(config_dir: impl Into<String>) -> Result<Self, UserbaseError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => Environment::default(),
        };

        Self::with_environment(config_dir, environment)
    }

    /// Creates a loader for an explicit profile.
    pub fn with_environment(
        config_dir: impl Into<String>,
        environment: Environment,
    ) -> Result<Self, UserbaseError> {
        let config_dir = config_dir.into();
        let config = load_config(&config_dir, environment, &DatabaseEnv::from_env())?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
            environment,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, UserbaseError> {
        Self::new("./config")
    }

    /// Returns the active profile.
    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), UserbaseError> {
        let new_config = load_config(&self.config_dir, self.environment, &DatabaseEnv::from_env())?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

/// Builds and validates the configuration for `environment`.
pub fn load_config(
    config_dir: &str,
    environment: Environment,
    database_env: &DatabaseEnv,
) -> Result<AppConfig, UserbaseError> {
    info!("Loading configuration for environment: {}", environment);

    let mut builder = Config::builder();

    for stem in ["default", environment.as_str(), "local"] {
        let path = format!("{config_dir}/{stem}.toml");
        if Path::new(&path).exists() {
            debug!("Loading config from: {}", path);
            builder = builder.add_source(File::with_name(&path).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    builder = builder
        .set_override("app.environment", environment.as_str())
        .and_then(|b| b.set_override_option("database.dialect", database_env.dialect.clone()))
        .and_then(|b| b.set_override_option("database.host", database_env.host.clone()))
        .and_then(|b| b.set_override_option("database.port", database_env.port.clone()))
        .and_then(|b| b.set_override_option("database.username", database_env.username.clone()))
        .and_then(|b| b.set_override_option("database.password", database_env.password.clone()))
        .and_then(|b| b.set_override_option("database.name", database_env.name.clone()))
        .map_err(config_error_to_userbase_error)?;

    let app_config = builder
        .build()
        .and_then(Config::try_deserialize::<AppConfig>)
        .map_err(config_error_to_userbase_error)?;

    ConfigValidator::validate(&app_config).map_err(|errors| {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        UserbaseError::Configuration(joined)
    })?;

    debug!(
        database = %app_config.database.redacted_url(),
        port = app_config.server.port,
        "Configuration loaded"
    );

    Ok(app_config)
}

fn config_error_to_userbase_error(err: ConfigError) -> UserbaseError {
    UserbaseError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    fn dir_str(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir_str(&dir), Environment::Test, &DatabaseEnv::default()).unwrap();
        assert_eq!(config.app.environment, Environment::Test);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.dialect, Dialect::Sqlite);
    }

    #[test]
    fn test_profile_file_overrides_default() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[server]\nport = 8000\n\n[database]\nname = \"dev.db\"\n");
        write(&dir, "production.toml", "[database]\nname = \"/var/lib/userbase/prod.db\"\n");

        let config =
            load_config(&dir_str(&dir), Environment::Production, &DatabaseEnv::default()).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.name, "/var/lib/userbase/prod.db");

        let config =
            load_config(&dir_str(&dir), Environment::Development, &DatabaseEnv::default()).unwrap();
        assert_eq!(config.database.name, "dev.db");
    }

    #[test]
    fn test_database_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[database]\nname = \"file.db\"\n");

        let env = DatabaseEnv {
            name: Some("from-env.db".to_string()),
            ..DatabaseEnv::default()
        };
        let config = load_config(&dir_str(&dir), Environment::Development, &env).unwrap();
        assert_eq!(config.database.name, "from-env.db");
        assert_eq!(config.database.connection_url(), "sqlite://from-env.db?mode=rwc");
    }

    #[test]
    fn test_unsupported_dialect_is_rejected() {
        let dir = TempDir::new().unwrap();
        let env = DatabaseEnv {
            dialect: Some("postgres".to_string()),
            host: Some("db".to_string()),
            port: Some("5432".to_string()),
            ..DatabaseEnv::default()
        };

        let err = load_config(&dir_str(&dir), Environment::Production, &env).unwrap_err();
        assert!(matches!(err, UserbaseError::Configuration(ref m) if m.contains("postgres")));
    }

    #[test]
    fn test_invalid_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "default.toml", "[server]\nport = \"not a number\"\n");

        let err = load_config(&dir_str(&dir), Environment::Development, &DatabaseEnv::default())
            .unwrap_err();
        assert_eq!(err.kind(), userbase_core::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_get_value_by_path() {
        let dir = TempDir::new().unwrap();
        write(&dir, "test.toml", "[security]\npassword_hash_cost = 3\n");

        let loader = ConfigLoader::with_environment(dir_str(&dir), Environment::Test).unwrap();
        assert_eq!(loader.environment(), Environment::Test);
        assert_eq!(loader.get_value::<u32>("security.password_hash_cost").await, Some(3));
        assert_eq!(loader.get_value::<u32>("security.missing").await, None);
    }
}
