//! Configuration loading
//!
//! Config file resolution priority:
//! 1. Command-line `--config` path (highest priority)
//! 2. `LEXFLOW_CONFIG` environment variable
//! 3. `~/.config/lexflow/config.toml` (platform config dir)
//! 4. Compiled defaults
//!
//! A missing file logs a warning and falls back to defaults. Selected
//! environment variables override individual values after the file is read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::DEFAULT_MODEL;
use crate::store::memory::DEFAULT_PAGE_SIZE;
use crate::{Error, Result};

pub const CONFIG_ENV_VAR: &str = "LEXFLOW_CONFIG";
pub const DEFAULT_PORT: u16 = 5730;
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Complete service configuration, built once at startup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexflowConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub classifier: ClassifierConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file, created on first start
    pub database_path: PathBuf,
    /// Records fetched per page during full scans
    pub scan_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            scan_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub api_url: String,
    pub api_version: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 800,
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

// Keeps the API key out of logs
impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub from_email: String,
    pub attorney_email: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LexflowConfig {
    /// Resolve, read and parse the config file, then apply env overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) if path.exists() => {
                info!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                Self::from_toml_str(&content)?
            }
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => {
                warn!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply `LEXFLOW_*` and `ANTHROPIC_API_KEY` overrides from the environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(path) = env_value("LEXFLOW_DATABASE_PATH") {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(port) = env_value("LEXFLOW_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("LEXFLOW_PORT is not a valid port: {}", port)))?;
        }
        if let Some(key) = env_value("ANTHROPIC_API_KEY") {
            self.classifier.api_key = key;
        }
        if let Some(from) = env_value("LEXFLOW_FROM_EMAIL") {
            self.notifications.from_email = from;
        }
        if let Some(attorney) = env_value("LEXFLOW_ATTORNEY_EMAIL") {
            self.notifications.attorney_email = attorney;
        }
        Ok(())
    }

    /// Check values that would otherwise fail at request time
    ///
    /// `require_classifier` is false for runs that never call the classifier.
    pub fn validate(&self, require_classifier: bool) -> Result<()> {
        if self.store.scan_page_size == 0 {
            return Err(Error::Config("store.scan_page_size must be at least 1".to_string()));
        }
        if require_classifier && self.classifier.api_key.trim().is_empty() {
            return Err(Error::Config(
                "classifier.api_key is empty (set ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        if self.notifications.enabled
            && (self.notifications.from_email.trim().is_empty()
                || self.notifications.attorney_email.trim().is_empty())
        {
            return Err(Error::Config(
                "notifications enabled but from_email or attorney_email is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pick the config file path by priority; `None` if nothing applies
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("lexflow").join("config.toml"))
        .filter(|path| path.exists())
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lexflow").join("lexflow.db"))
        .unwrap_or_else(|| PathBuf::from("./lexflow_data/lexflow.db"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
