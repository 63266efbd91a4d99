//! Key-value persistence backends
//!
//! The settings layer talks to storage only through the [`Defaults`] trait:
//! - **memory**: `MemoryDefaults`, a process-local map
//! - **json_file**: `JsonFileDefaults`, a map persisted as a JSON document

use anyhow::Result;

use crate::value::SettingsValue;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileDefaults;
pub use memory::MemoryDefaults;

/// Opaque key-value store the typed settings accessors are translated onto
pub trait Defaults: Send {
    /// Stored value for `key`, or `None` if the key was never written
    fn object(&self, key: &str) -> Option<SettingsValue>;

    fn set_object(&mut self, key: &str, value: SettingsValue);

    fn remove_object(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.object(key).is_some()
    }

    /// All stored keys, sorted
    fn keys(&self) -> Vec<String>;

    /// Flush pending writes to durable storage
    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}
