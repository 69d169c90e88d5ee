//! Client configuration: where the server binary lives, how long to wait for it,
//! and how often to poll long-running tasks.
//!
//! Loaded from `{config_dir}/dbt-rpc/config.toml` when present, then overridden by
//! `DBT_RPC_*` environment variables (a `.env` file is honoured).

use crate::error::config::ConfigError;
use crate::{DBT_BINARY, RPC_DEFAULT_PORT, RPC_SERVER_HOSTNAME};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "dbt-rpc";
const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_BINARY: &str = "DBT_RPC_BINARY";
pub const ENV_HOST: &str = "DBT_RPC_HOST";
pub const ENV_POLL_TIMEOUT_SECS: &str = "DBT_RPC_POLL_TIMEOUT_SECS";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_attempts")]
    pub attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl ReadinessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: default_readiness_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_target_state")]
    pub target_state: String,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
            target_state: default_target_state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlConfig {
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
    #[serde(default = "default_run_name")]
    pub run_name: String,
    #[serde(default = "default_compile_name")]
    pub compile_name: String,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
            run_name: default_run_name(),
            compile_name: default_compile_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_binary")]
    pub binary: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub default_port: u16,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Top-level server states accepted as "ready" after start.
    #[serde(default = "default_ready_states")]
    pub ready_states: Vec<String>,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub sql: SqlConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            host: default_host(),
            default_port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            ready_states: default_ready_states(),
            readiness: ReadinessConfig::default(),
            poll: PollConfig::default(),
            sql: SqlConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_binary() -> String {
    DBT_BINARY.to_string()
}
fn default_host() -> String {
    RPC_SERVER_HOSTNAME.to_string()
}
fn default_port() -> u16 {
    RPC_DEFAULT_PORT
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_ready_states() -> Vec<String> {
    vec!["ready".to_string()]
}
fn default_readiness_attempts() -> u32 {
    30
}
fn default_interval_ms() -> u64 {
    500
}
fn default_poll_timeout_secs() -> u64 {
    60
}
fn default_target_state() -> String {
    "success".to_string()
}
fn default_max_rows() -> u32 {
    500
}
fn default_run_name() -> String {
    "test_run".to_string()
}
fn default_compile_name() -> String {
    "test_compile".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl RpcConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `{config_dir}/dbt-rpc/config.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default path, then apply environment overrides.
    pub fn load_default() -> Result<Self, ConfigError> {
        load_dotenv();

        let mut config = match Self::default_path() {
            Some(path) => Self::load(&path)?,
            None => {
                warn!("No platform config directory, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or invalid.
    #[track_caller]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RpcConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Apply `DBT_RPC_*` overrides from the process environment.
    #[track_caller]
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(binary) = std::env::var(ENV_BINARY) {
            debug!("{ENV_BINARY} override: {binary}");
            self.binary = binary;
        }

        if let Ok(host) = std::env::var(ENV_HOST) {
            debug!("{ENV_HOST} override: {host}");
            self.host = host;
        }

        if let Ok(raw) = std::env::var(ENV_POLL_TIMEOUT_SECS) {
            self.poll.timeout_secs =
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::ValidationError {
                        location: ErrorLocation::from(Location::caller()),
                        reason: format!("{ENV_POLL_TIMEOUT_SECS}='{raw}' is not a number: {e}"),
                    })?;
        }

        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reason = if self.binary.trim().is_empty() {
            Some("binary cannot be empty".to_string())
        } else if self.host.trim().is_empty() {
            Some("host cannot be empty".to_string())
        } else if self.default_port == 0 {
            Some("default_port must be non-zero".to_string())
        } else if self.request_timeout_secs == 0 {
            Some("request_timeout_secs must be non-zero".to_string())
        } else if self.ready_states.is_empty() {
            Some("ready_states cannot be empty".to_string())
        } else if self.readiness.attempts == 0 || self.readiness.interval_ms == 0 {
            Some("readiness attempts and interval_ms must be non-zero".to_string())
        } else if self.poll.interval_ms == 0 || self.poll.timeout_secs == 0 {
            Some("poll interval_ms and timeout_secs must be non-zero".to_string())
        } else if self.poll.target_state.is_empty() {
            Some("poll target_state cannot be empty".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Loads `.env` from the current directory, if there is one.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            info!("Loaded .env from: {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("Failed to parse .env: {e}");
            None
        }
    }
}
