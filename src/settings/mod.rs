//! Typed settings over a defaults backend
//!
//! - **store**: `SettingsStore`, the typed get/set protocol with overwrite policy
//! - **schema**: `PropertyDecl`, declared properties and their encodings
//! - **metadata**: `SettingsProperty`, decoded per-property records with accessors
//! - **defaults**: `DefaultValues` strategies used for seeding and reset

use anyhow::Result;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info};

use crate::backend::Defaults;
use crate::value::SettingsValue;

pub mod defaults;
pub mod metadata;
pub mod schema;
pub mod store;

pub use defaults::{DefaultValues, SchemaDefaults};
pub use metadata::{Getter, SettingsProperty, Setter};
pub use schema::{PropertyDecl, load_schema};
pub use store::{SettingsStore, StoredValue};

/// A settings object: typed store, declared properties and their defaults
///
/// Dereferences to [`SettingsStore`] for the typed accessors.
pub struct Settings {
    store: SettingsStore,
    properties: Vec<SettingsProperty>,
    defaults: Box<dyn DefaultValues>,
}

impl Settings {
    pub fn new(
        schema: &[PropertyDecl],
        backend: impl Defaults + 'static,
        defaults: impl DefaultValues + 'static,
    ) -> Self {
        Self::with_key_prefix(schema, "", backend, defaults)
    }

    /// Like [`Settings::new`], persisting each property under `key_prefix + name`
    pub fn with_key_prefix(
        schema: &[PropertyDecl],
        key_prefix: &str,
        backend: impl Defaults + 'static,
        defaults: impl DefaultValues + 'static,
    ) -> Self {
        let properties = build_properties(schema, key_prefix);
        info!(declared = schema.len(), supported = properties.len(), "Built settings properties");

        Self {
            store: SettingsStore::new(backend),
            properties,
            defaults: Box::new(defaults),
        }
    }

    /// Settings whose defaults are the literal defaults in the schema
    pub fn from_schema(schema: &[PropertyDecl], key_prefix: &str, backend: impl Defaults + 'static) -> Self {
        // Each property keeps the default of its own declaration, duplicates included
        let built: Vec<(SettingsProperty, Option<&SettingsValue>)> = schema
            .iter()
            .filter_map(|decl| {
                SettingsProperty::from_decl(decl, key_prefix).map(|property| (property, decl.default.as_ref()))
            })
            .collect();
        let literals = SchemaDefaults::new(built.iter().map(|(property, default)| (property, *default)));
        let properties: Vec<SettingsProperty> = built.into_iter().map(|(property, _)| property).collect();
        info!(
            declared = schema.len(),
            supported = properties.len(),
            defaults = literals.len(),
            "Built settings properties"
        );

        Self {
            store: SettingsStore::new(backend),
            properties,
            defaults: Box::new(literals),
        }
    }

    /// Seed defaults without touching values that are already set
    pub fn ensure_default_values(&mut self) {
        info!(properties = self.properties.len(), "Ensuring default values");
        self.apply_default_values(false);
    }

    /// Restore every property to its factory default
    pub fn reset_default_values(&mut self) {
        info!(properties = self.properties.len(), "Resetting default values");
        self.apply_default_values(true);
    }

    fn apply_default_values(&mut self, overwrite: bool) {
        // Cleared first so a reset also empties properties the strategy has no default for
        if overwrite {
            for property in &self.properties {
                self.store.remove(property.defaults_key());
            }
        }

        self.defaults.set_default_values(&mut self.store, overwrite);

        // Properties the strategy does not cover still get a value
        for property in &self.properties {
            if !self.store.contains(property.defaults_key()) {
                debug!(property = %property.name(), "No default supplied, storing empty value");
                let empty = property.get(&self.store);
                property.set(&mut self.store, empty, false);
            }
        }
    }

    /// Declared properties in declaration order
    pub fn settings_properties(&self) -> &[SettingsProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&SettingsProperty> {
        self.properties.iter().find(|property| property.name() == name)
    }

    /// Current value of a declared property, as its declared type
    pub fn value(&self, name: &str) -> Option<SettingsValue> {
        self.property(name).map(|property| property.get(&self.store))
    }

    /// Write a declared property through its setter
    ///
    /// Returns `false` if no property has that name.
    pub fn set_value(&mut self, name: &str, value: SettingsValue, overwrite: bool) -> bool {
        let Some(property) = self.properties.iter().find(|property| property.name() == name) else {
            return false;
        };
        property.set(&mut self.store, value, overwrite);
        true
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SettingsStore {
        &mut self.store
    }

    pub fn synchronize(&mut self) -> Result<()> {
        self.store.synchronize()
    }
}

impl Deref for Settings {
    type Target = SettingsStore;

    fn deref(&self) -> &SettingsStore {
        &self.store
    }
}

impl DerefMut for Settings {
    fn deref_mut(&mut self) -> &mut SettingsStore {
        &mut self.store
    }
}

fn build_properties(schema: &[PropertyDecl], key_prefix: &str) -> Vec<SettingsProperty> {
    schema
        .iter()
        .filter_map(|decl| SettingsProperty::from_decl(decl, key_prefix))
        .collect()
}
