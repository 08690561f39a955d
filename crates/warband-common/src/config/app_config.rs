//! Application configuration structs
//!
//! Loads configuration from an optional `warband.toml` file and from
//! environment variables prefixed with `WARBAND__` (e.g.
//! `WARBAND__DATABASE__URL`). Environment variables win over the file.

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub snowflake: SnowflakeConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: Environment::default(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// Background scheduler configuration (war reminders)
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between reminder sweeps
    #[serde(default = "default_reminder_poll_secs")]
    pub reminder_poll_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reminder_poll_secs: default_reminder_poll_secs(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "warband".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_reminder_poll_secs() -> u64 {
    60
}

impl AppConfig {
    /// Load configuration from `warband.toml` (if present) and environment
    ///
    /// # Errors
    /// Returns an error when required settings are missing or malformed
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("warband").required(false))
            .add_source(config::Environment::with_prefix("WARBAND").separator("__"))
            .build()
            .map_err(ConfigError::Load)?;

        settings.try_deserialize().map_err(ConfigError::Load)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[source] config::ConfigError),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
