//! Default-value strategies
//!
//! A [`DefaultValues`] strategy writes every property's factory default
//! through the typed setters, passing the caller's `overwrite` flag through
//! unchanged. Seeding calls it with `false`, a reset with `true`.

use super::metadata::SettingsProperty;
use super::store::SettingsStore;
use crate::value::SettingsValue;

pub trait DefaultValues: Send {
    fn set_default_values(&self, store: &mut SettingsStore, overwrite: bool);
}

impl<F> DefaultValues for F
where
    F: Fn(&mut SettingsStore, bool) + Send,
{
    fn set_default_values(&self, store: &mut SettingsStore, overwrite: bool) {
        self(store, overwrite)
    }
}

/// Literal defaults taken from a schema
#[derive(Debug, Clone, Default)]
pub struct SchemaDefaults {
    entries: Vec<(SettingsProperty, SettingsValue)>,
}

impl SchemaDefaults {
    /// Pair each property with its literal default; properties without one
    /// are left out
    pub fn new<'a>(defaults: impl IntoIterator<Item = (&'a SettingsProperty, Option<&'a SettingsValue>)>) -> Self {
        let entries = defaults
            .into_iter()
            .filter_map(|(property, default)| default.map(|value| (property.clone(), value.clone())))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefaultValues for SchemaDefaults {
    fn set_default_values(&self, store: &mut SettingsStore, overwrite: bool) {
        for (property, value) in &self.entries {
            property.set(store, value.clone(), overwrite);
        }
    }
}
