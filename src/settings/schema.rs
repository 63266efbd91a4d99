//! Declared settings properties
//!
//! A schema is the ordered list of properties a settings object exposes, each
//! with its attribute encoding and an optional literal default. Schemas are
//! either built in code or loaded from a JSON file:
//!
//! ```json
//! [
//!   { "name": "fontSize", "attributes": "Td,N,V_fontSize", "default": 13 },
//!   { "name": "theme", "attributes": "T@\"NSString\",C,N", "default": "auto" }
//! ]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::value::SettingsValue;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyDecl {
    pub name: String,

    /// Attribute encoding, e.g. `Ti,N,V_count`
    pub attributes: String,

    /// Literal default, converted to the property type when seeded
    #[serde(default, deserialize_with = "deserialize_default")]
    pub default: Option<SettingsValue>,

    /// Overrides the name derived from `name`
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Defaults are written as plain JSON in schema files
fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<SettingsValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let json = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(json.map(SettingsValue::from_json))
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, attributes: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: attributes.into(),
            default: None,
            display_name: None,
        }
    }

    pub fn with_default(mut self, default: SettingsValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Load a schema from a JSON file
pub fn load_schema(path: &Path) -> Result<Vec<PropertyDecl>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema from {}", path.display()))?;
    let schema: Vec<PropertyDecl> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse schema JSON from {}", path.display()))?;

    info!(path = %path.display(), properties = schema.len(), "Loaded settings schema");
    Ok(schema)
}
