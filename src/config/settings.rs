//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources
//! and validation.

use crate::error::{LifecycleError, Result};
use crate::lifecycle::driver::{
    DriverSettings, DEFAULT_BASE_NAME, DEFAULT_CONTAINER_COUNT, DEFAULT_DELETE_PREFIX,
    DEFAULT_SOFT_DELETE_WAIT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the storage account connection string
pub const CONNECTION_STRING_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    /// Only ever read from the environment or the command line
    #[serde(skip)]
    pub connection_string: Option<String>,
    pub base_name: String,
    pub container_count: usize,
    pub delete_prefix: String,
    pub soft_delete_wait_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("debug", &self.debug)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("base_name", &self.base_name)
            .field("container_count", &self.container_count)
            .field("delete_prefix", &self.delete_prefix)
            .field("soft_delete_wait_secs", &self.soft_delete_wait_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            connection_string: None,
            base_name: DEFAULT_BASE_NAME.to_string(),
            container_count: DEFAULT_CONTAINER_COUNT,
            delete_prefix: DEFAULT_DELETE_PREFIX.to_string(),
            soft_delete_wait_secs: DEFAULT_SOFT_DELETE_WAIT.as_secs(),
        }
    }
}

impl Config {
    /// The connection string, or a configuration error when it is missing
    pub fn require_connection_string(&self) -> Result<&str> {
        self.connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| LifecycleError::config("Azure Storage Connection string not found"))
    }

    pub fn driver_settings(&self) -> DriverSettings {
        DriverSettings {
            base_name: self.base_name.clone(),
            container_count: self.container_count,
            delete_prefix: self.delete_prefix.clone(),
            soft_delete_wait: Duration::from_secs(self.soft_delete_wait_secs),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| LifecycleError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("cdel").join("config.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| LifecycleError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("cdel").join("config.toml"))
        }
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (applied by the CLI)
/// 2. Environment variables (including a `.env` file)
/// 3. Configuration file
/// 4. Default values
///
/// The connection string is checked by the commands that need one.
pub async fn load_config() -> Result<Config> {
    let mut config = Config::default();

    // Load from configuration file if it exists
    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    // Override with environment variables
    load_from_env(&mut config);

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;
    let config = toml::from_str::<Config>(&contents)?;
    Ok(config)
}

fn load_from_env(config: &mut Config) {
    apply_env(config, |key| std::env::var(key).ok());
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup(CONNECTION_STRING_ENV) {
        config.connection_string = Some(value);
    }

    if let Some(value) = lookup("CONTAINER_BASE_NAME") {
        config.base_name = value;
    }

    if let Some(value) = lookup("CONTAINER_COUNT") {
        if let Ok(count) = value.parse::<usize>() {
            config.container_count = count;
        }
    }

    if let Some(value) = lookup("DELETE_PREFIX") {
        config.delete_prefix = value;
    }

    if let Some(value) = lookup("SOFT_DELETE_WAIT_SECS") {
        if let Ok(seconds) = value.parse::<u64>() {
            config.soft_delete_wait_secs = seconds;
        }
    }
}
