//! Per-property metadata built from a declared schema entry
//!
//! Each supported property gets a getter and a setter function chosen from
//! its decoded type, so callers can read and write a property without
//! knowing its Rust type.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::warn;

use super::schema::PropertyDecl;
use super::store::{SettingsStore, StoredValue};
use crate::property::{PropertyDescriptor, PropertyType};
use crate::text;
use crate::value::SettingsValue;

/// Reads the property's key and returns it as a value of the property type
pub type Getter = fn(&SettingsStore, &str) -> SettingsValue;

/// Converts a value to the property type and writes it under the key
pub type Setter = fn(&mut SettingsStore, SettingsValue, &str, bool);

#[derive(Debug, Clone)]
pub struct SettingsProperty {
    name: String,
    human_readable_name: String,
    property_type: PropertyType,
    defaults_key: String,
    getter_name: String,
    setter_name: String,
    descriptor: PropertyDescriptor,
    getter: Getter,
    setter: Setter,
}

impl SettingsProperty {
    /// Build metadata for a declared property
    ///
    /// Returns `None` when the encoding decodes to an unsupported type, since
    /// no accessor exists for it.
    pub fn from_decl(decl: &PropertyDecl, key_prefix: &str) -> Option<Self> {
        let descriptor = PropertyDescriptor::decode(&decl.attributes);
        let property_type = descriptor.property_type();

        let Some((getter, setter)) = accessors(property_type) else {
            warn!(property = %decl.name, attributes = %decl.attributes, "Skipping property with unsupported type");
            return None;
        };

        let getter_name = descriptor
            .custom_getter()
            .map(str::to_string)
            .unwrap_or_else(|| decl.name.clone());
        let setter_name = descriptor
            .custom_setter()
            .map(str::to_string)
            .unwrap_or_else(|| text::property_setter_name(&decl.name));

        Some(Self {
            name: decl.name.clone(),
            human_readable_name: decl
                .display_name
                .clone()
                .unwrap_or_else(|| text::human_readable_name(&decl.name)),
            property_type,
            defaults_key: format!("{}{}", key_prefix, decl.name),
            getter_name,
            setter_name,
            descriptor,
            getter,
            setter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn human_readable_name(&self) -> &str {
        &self.human_readable_name
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Key the value is persisted under
    pub fn defaults_key(&self) -> &str {
        &self.defaults_key
    }

    pub fn getter_name(&self) -> &str {
        &self.getter_name
    }

    pub fn setter_name(&self) -> &str {
        &self.setter_name
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    pub fn get(&self, store: &SettingsStore) -> SettingsValue {
        (self.getter)(store, &self.defaults_key)
    }

    pub fn set(&self, store: &mut SettingsStore, value: SettingsValue, overwrite: bool) {
        (self.setter)(store, value, &self.defaults_key, overwrite);
    }
}

/// Getter/setter pair for a property type
fn accessors(property_type: PropertyType) -> Option<(Getter, Setter)> {
    let pair: (Getter, Setter) = match property_type {
        PropertyType::Unsupported => return None,
        PropertyType::Bool => typed::<bool>(),
        PropertyType::Char => typed::<i8>(),
        PropertyType::Short => typed::<i16>(),
        PropertyType::Int => typed::<i32>(),
        PropertyType::Long => typed::<i64>(),
        PropertyType::LongLong => (get_long_long as Getter, set_long_long as Setter),
        PropertyType::UChar => typed::<u8>(),
        PropertyType::UShort => typed::<u16>(),
        PropertyType::UInt => typed::<u32>(),
        PropertyType::ULong => typed::<u64>(),
        PropertyType::ULongLong => (get_unsigned_long_long as Getter, set_unsigned_long_long as Setter),
        PropertyType::Float => typed::<f32>(),
        PropertyType::Double => typed::<f64>(),
        PropertyType::String => typed::<String>(),
        PropertyType::Data => typed::<Vec<u8>>(),
        PropertyType::Number => typed::<serde_json::Number>(),
        PropertyType::Date => typed::<DateTime<Utc>>(),
        PropertyType::Array => typed::<Vec<SettingsValue>>(),
        PropertyType::Dictionary => typed::<BTreeMap<String, SettingsValue>>(),
        PropertyType::Object => typed::<SettingsValue>(),
    };
    Some(pair)
}

fn typed<T: StoredValue>() -> (Getter, Setter) {
    (get_as::<T> as Getter, set_converted::<T> as Setter)
}

fn get_as<T: StoredValue>(store: &SettingsStore, key: &str) -> SettingsValue {
    store.get::<T>(key).into_stored()
}

fn set_converted<T: StoredValue>(store: &mut SettingsStore, value: SettingsValue, key: &str, overwrite: bool) {
    match T::from_stored(&value) {
        Some(converted) => store.set(converted, key, overwrite),
        None => {
            let expected = T::PROPERTY_TYPE;
            warn!(
                key = %key,
                value_type = %value.property_type(),
                expected = %expected,
                "Value does not convert to property type, not written"
            );
        }
    }
}

// `long long` shares i64 with `long` but keeps its own tag when stored

fn get_long_long(store: &SettingsStore, key: &str) -> SettingsValue {
    SettingsValue::LongLong(store.get_long_long(key))
}

fn set_long_long(store: &mut SettingsStore, value: SettingsValue, key: &str, overwrite: bool) {
    match value.as_i64() {
        Some(v) => store.set_long_long(v, key, overwrite),
        None => warn!(key = %key, value_type = %value.property_type(), "Value is not an integer, not written"),
    }
}

fn get_unsigned_long_long(store: &SettingsStore, key: &str) -> SettingsValue {
    SettingsValue::ULongLong(store.get_unsigned_long_long(key))
}

fn set_unsigned_long_long(store: &mut SettingsStore, value: SettingsValue, key: &str, overwrite: bool) {
    match value.as_u64() {
        Some(v) => store.set_unsigned_long_long(v, key, overwrite),
        None => warn!(key = %key, value_type = %value.property_type(), "Value is not an integer, not written"),
    }
}
