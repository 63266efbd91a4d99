//! Store configuration
//!
//! Loaded from `<config dir>/settings-store/config.json`; a default file is
//! written on first run. Environment variables override the file after load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::backend::JsonFileDefaults;
use crate::constants::config::{APP_DIR, ENV_DEFAULTS_PATH, ENV_KEY_PREFIX, FILENAME};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Defaults file; `None` uses the file next to this config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults_path: Option<PathBuf>,

    /// JSON schema describing the settings properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<PathBuf>,

    /// Prepended to every property name to form its defaults key
    #[serde(default)]
    pub key_prefix: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            defaults_path: None,
            schema_path: None,
            key_prefix: String::new(),
        }
    }
}

impl StoreConfig {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load the configuration, creating a default file if none exists
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default config");
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json).with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DEFAULTS_PATH) {
            if path.trim().is_empty() {
                warn!(var = ENV_DEFAULTS_PATH, "Ignoring empty defaults path override");
            } else {
                info!(var = ENV_DEFAULTS_PATH, path = %path, "Overriding defaults path from environment");
                self.defaults_path = Some(PathBuf::from(path));
            }
        }
        if let Some(prefix) = lookup(ENV_KEY_PREFIX) {
            info!(var = ENV_KEY_PREFIX, prefix = %prefix, "Overriding key prefix from environment");
            self.key_prefix = prefix;
        }
    }

    /// Effective defaults file path
    pub fn defaults_path(&self) -> PathBuf {
        self.defaults_path
            .clone()
            .unwrap_or_else(JsonFileDefaults::default_path)
    }
}
