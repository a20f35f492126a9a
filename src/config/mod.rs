//! # Configuration Management Module
//!
//! Client configuration loaded from a TOML file, with defaults for every section so a
//! partial (or empty) file is valid.
//!
//! ## Configuration Structure
//!
//! - [`ApiConfig`] - server address, asset address, credential location, optional timeout
//! - [`PollingConfig`] - position, roster and countdown cadences
//! - [`TravelConfig`] - per-cell travel cost fallback and default cells per location
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use moonshine_client::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("moonshine.toml").await?;
//!     println!("API: {}", config.api.base_url);
//!
//!     Config::create_default("moonshine.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080/api"
//! asset_base_url = "http://localhost:8080/assets"
//! token_file = ".moonshine-token"
//!
//! [polling]
//! position_interval_ms = 2000
//! roster_interval_ms = 30000
//! countdown_tick_ms = 1000
//!
//! [travel]
//! default_time_per_cell = 5
//!
//! [travel.default_cells]
//! wayward_pines = "29cell"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub travel: TravelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8080/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Base URL that relative asset paths are resolved against
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,
    /// File holding the bearer token written at sign-in. `MOONSHINE_TOKEN` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
    /// Per-request timeout in seconds. Unset means requests may wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_asset_base_url() -> String {
    "http://localhost:8080/assets".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            asset_base_url: default_asset_base_url(),
            token_file: Some(PathBuf::from(".moonshine-token")),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Player position refresh on the map screen (ms)
    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,
    /// Online roster refresh (ms)
    #[serde(default = "default_roster_interval_ms")]
    pub roster_interval_ms: u64,
    /// Travel countdown step (ms); one step is one second of displayed travel time
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,
}

fn default_position_interval_ms() -> u64 {
    2000
}

fn default_roster_interval_ms() -> u64 {
    30_000
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            position_interval_ms: default_position_interval_ms(),
            roster_interval_ms: default_roster_interval_ms(),
            countdown_tick_ms: default_countdown_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Seconds per cell when the server omits `time_per_cell`
    #[serde(default = "default_time_per_cell")]
    pub default_time_per_cell: u64,
    /// Location slug → cell slug the player occupies when the server reports the bare location
    #[serde(default = "default_cells")]
    pub default_cells: HashMap<String, String>,
}

fn default_time_per_cell() -> u64 {
    5
}

fn default_cells() -> HashMap<String, String> {
    HashMap::from([("wayward_pines".to_string(), "29cell".to_string())])
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            default_time_per_cell: default_time_per_cell(),
            default_cells: default_cells(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values that would make the client misbehave.
    pub fn validate(&self) -> Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://")
        {
            return Err(anyhow!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            ));
        }
        if self.polling.position_interval_ms == 0
            || self.polling.roster_interval_ms == 0
            || self.polling.countdown_tick_ms == 0
        {
            return Err(anyhow!("polling intervals must be greater than zero"));
        }
        if self.travel.default_time_per_cell == 0 {
            return Err(anyhow!("travel.default_time_per_cell must be greater than zero"));
        }
        Ok(())
    }
}
