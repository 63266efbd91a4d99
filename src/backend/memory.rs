use std::collections::BTreeMap;

use super::Defaults;
use crate::value::SettingsValue;

/// Defaults held in memory only; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryDefaults {
    values: BTreeMap<String, SettingsValue>,
}

impl MemoryDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, SettingsValue>> for MemoryDefaults {
    fn from(values: BTreeMap<String, SettingsValue>) -> Self {
        Self { values }
    }
}

impl Defaults for MemoryDefaults {
    fn object(&self, key: &str) -> Option<SettingsValue> {
        self.values.get(key).cloned()
    }

    fn set_object(&mut self, key: &str, value: SettingsValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove_object(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut defaults = MemoryDefaults::new();
        assert!(defaults.is_empty());
        assert_eq!(defaults.object("volume"), None);

        defaults.set_object("volume", SettingsValue::Float(0.5));
        assert!(defaults.contains("volume"));
        assert_eq!(defaults.object("volume"), Some(SettingsValue::Float(0.5)));

        defaults.remove_object("volume");
        assert!(!defaults.contains("volume"));
        assert_eq!(defaults.len(), 0);
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut defaults = MemoryDefaults::new();
        defaults.set_object("zoom", SettingsValue::Int(1));
        defaults.set_object("alpha", SettingsValue::Int(2));

        assert_eq!(defaults.keys(), vec!["alpha".to_string(), "zoom".to_string()]);
        assert!(defaults.synchronize().is_ok());
    }
}
