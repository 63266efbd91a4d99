//! Typed application settings on top of a key-value defaults store
//!
//! - **property**: decodes property attribute encodings into descriptors
//! - **settings**: typed get/set accessors, default seeding and reset
//! - **backend**: the `Defaults` trait plus memory and JSON file backends
//! - **value**: the closed set of storable value kinds
//! - **config**: configuration file and environment overrides
//! - **text**: string helpers (code points, tokenizing, accessor names)

#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod constants;
pub mod property;
pub mod settings;
pub mod text;
pub mod value;

pub use backend::{Defaults, JsonFileDefaults, MemoryDefaults};
pub use property::{AttributeFlags, PropertyDescriptor, PropertyType};
pub use settings::{DefaultValues, PropertyDecl, Settings, SettingsProperty, SettingsStore};
pub use value::SettingsValue;
