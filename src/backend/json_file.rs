//! Defaults persisted as a single JSON document
//!
//! Values are loaded once when the file is opened, writes stay in memory, and
//! [`Defaults::synchronize`] writes the whole map back. Each entry keeps its
//! value tag so a key reads back with the width it was written with.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::Defaults;
use crate::value::SettingsValue;

#[derive(Debug)]
pub struct JsonFileDefaults {
    path: PathBuf,
    values: BTreeMap<String, SettingsValue>,
    dirty: bool,
}

impl JsonFileDefaults {
    /// `<config dir>/settings-store/defaults.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::DEFAULTS_FILENAME);
        path
    }

    /// Open the defaults file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            info!(path = %path.display(), "Defaults file not found, starting empty");
            return Ok(Self {
                path,
                values: BTreeMap::new(),
                dirty: false,
            });
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read defaults from {}", path.display()))?;
        let values: BTreeMap<String, SettingsValue> = if contents.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse defaults JSON from {}", path.display()))?
        };

        info!(path = %path.display(), keys = values.len(), "Loaded defaults");
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when there are writes not yet synchronized to disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Defaults for JsonFileDefaults {
    fn object(&self, key: &str) -> Option<SettingsValue> {
        self.values.get(key).cloned()
    }

    fn set_object(&mut self, key: &str, value: SettingsValue) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn remove_object(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn synchronize(&mut self) -> Result<()> {
        if !self.dirty {
            debug!(path = %self.path.display(), "Defaults unchanged, skipping write");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create defaults directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize defaults to JSON")?;

        // Write-then-rename; the target is never observed half written
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write defaults to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to move defaults into place at {}", self.path.display()))?;

        self.dirty = false;
        info!(path = %self.path.display(), keys = self.values.len(), "Saved defaults");
        Ok(())
    }
}
