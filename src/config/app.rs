//! Application configuration loading from config.toml
//!
//! Every section is optional; missing values fall back to the defaults the
//! restaurant has always run with. `DATABASE_URL` and `FLOYDS_API_URL` from the
//! environment (or `.env`) override the file.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote mirror settings
    pub api: ApiConfig,
    /// Local durable store settings
    pub storage: StorageConfig,
    /// Opening hours
    pub hours: OpeningHours,
    /// Simulated kitchen progress
    pub order_progression: ProgressionConfig,
}

/// Remote mirror settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the state API, e.g. `https://example.pages.dev/api`.
    /// Without one the session runs offline.
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 10,
        }
    }
}

/// Local durable store settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` connection string
    pub database_url: String,
    /// Key the session blob is stored under
    pub state_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/floyds.sqlite?mode=rwc".to_string(),
            state_key: "floyds-app-state".to_string(),
        }
    }
}

/// Daily opening window, in local hours
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    /// First open hour (inclusive)
    pub open_hour: u32,
    /// Closing hour (exclusive)
    pub close_hour: u32,
    /// How often the open/closed flag is re-evaluated
    pub check_interval_secs: u64,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            open_hour: 10,
            close_hour: 22,
            check_interval_secs: 60,
        }
    }
}

impl OpeningHours {
    /// Whether the restaurant is open during local `hour` (0-23).
    #[must_use]
    pub const fn is_open_at(&self, hour: u32) -> bool {
        hour >= self.open_hour && hour < self.close_hour
    }
}

/// Simulated kitchen progress for placed orders
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Whether the background progression runs at all
    pub enabled: bool,
    /// Seconds from placement until the order leaves the kitchen
    pub preparing_secs: u64,
    /// Further seconds until the order is delivered
    pub delivery_secs: u64,
    /// Poll period of the background loop
    pub poll_interval_ms: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preparing_secs: 5,
            delivery_secs: 10,
            poll_interval_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Rejects settings that cannot work together.
    pub fn validate(&self) -> Result<()> {
        let hours = &self.hours;
        if hours.open_hour >= hours.close_hour || hours.close_hour > 24 {
            return Err(Error::Config {
                message: format!(
                    "Opening hours must satisfy open < close <= 24, got {}..{}",
                    hours.open_hour, hours.close_hour
                ),
            });
        }
        if self.storage.state_key.trim().is_empty() {
            return Err(Error::Config {
                message: "storage.state_key cannot be empty".to_string(),
            });
        }
        if self.order_progression.poll_interval_ms == 0 {
            return Err(Error::Config {
                message: "order_progression.poll_interval_ms must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            debug!("DATABASE_URL overrides storage.database_url");
            self.storage.database_url = url;
        }
        if let Ok(url) = std::env::var("FLOYDS_API_URL") {
            debug!("FLOYDS_API_URL overrides api.base_url");
            self.api.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML is invalid, or the values
/// fail [`AppConfig::validate`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration the binary runs with.
///
/// Reads `CONFIG_PATH` (default `./config.toml`); a missing file means defaults.
/// Environment overrides are applied last.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = if Path::new(&path).exists() {
        load_config(&path)?
    } else {
        info!("No configuration file at {path}, using defaults");
        AppConfig::default()
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
