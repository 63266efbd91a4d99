//! Typed accessors over a [`Defaults`] backend
//!
//! Every read returns the type's empty value when the key is absent or the
//! stored value does not convert. Every write takes an `overwrite` flag:
//! with `overwrite == false` an existing key is left untouched, which is what
//! default seeding relies on.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::trace;

use crate::backend::Defaults;
use crate::property::PropertyType;
use crate::value::SettingsValue;

/// A Rust type that can be read from and written to a settings key
pub trait StoredValue: Sized {
    /// Property type written by [`StoredValue::into_stored`]
    const PROPERTY_TYPE: PropertyType;

    /// Value returned for absent keys
    fn empty() -> Self;

    fn from_stored(value: &SettingsValue) -> Option<Self>;

    fn into_stored(self) -> SettingsValue;
}

macro_rules! stored_integer {
    ($ty:ty, $variant:ident, $read:ident) => {
        impl StoredValue for $ty {
            const PROPERTY_TYPE: PropertyType = PropertyType::$variant;

            fn empty() -> Self {
                0
            }

            fn from_stored(value: &SettingsValue) -> Option<Self> {
                // Truncating, like reading a wider number into a narrower C type
                value.$read().map(|v| v as $ty)
            }

            fn into_stored(self) -> SettingsValue {
                SettingsValue::$variant(self)
            }
        }
    };
}

stored_integer!(i8, Char, as_i64);
stored_integer!(i16, Short, as_i64);
stored_integer!(i32, Int, as_i64);
stored_integer!(i64, Long, as_i64);
stored_integer!(u8, UChar, as_u64);
stored_integer!(u16, UShort, as_u64);
stored_integer!(u32, UInt, as_u64);
stored_integer!(u64, ULong, as_u64);

impl StoredValue for bool {
    const PROPERTY_TYPE: PropertyType = PropertyType::Bool;

    fn empty() -> Self {
        false
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        value.as_bool()
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Bool(self)
    }
}

impl StoredValue for f32 {
    const PROPERTY_TYPE: PropertyType = PropertyType::Float;

    fn empty() -> Self {
        0.0
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        value.as_f64().map(|v| v as f32)
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Float(self)
    }
}

impl StoredValue for f64 {
    const PROPERTY_TYPE: PropertyType = PropertyType::Double;

    fn empty() -> Self {
        0.0
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        value.as_f64()
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Double(self)
    }
}

impl StoredValue for String {
    const PROPERTY_TYPE: PropertyType = PropertyType::String;

    fn empty() -> Self {
        String::new()
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        value.as_string()
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::String(self)
    }
}

impl StoredValue for Vec<u8> {
    const PROPERTY_TYPE: PropertyType = PropertyType::Data;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        match value {
            SettingsValue::Data(bytes) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Data(self)
    }
}

impl StoredValue for serde_json::Number {
    const PROPERTY_TYPE: PropertyType = PropertyType::Number;

    fn empty() -> Self {
        serde_json::Number::from(0)
    }

    /// Any scalar reads as a number
    fn from_stored(value: &SettingsValue) -> Option<Self> {
        match value {
            SettingsValue::Number(n) => Some(n.clone()),
            SettingsValue::Float(_) | SettingsValue::Double(_) => {
                value.as_f64().and_then(serde_json::Number::from_f64)
            }
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => Some((*v).into()),
            other if other.property_type().is_scalar() => other.as_i64().map(Into::into),
            _ => None,
        }
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Number(self)
    }
}

impl StoredValue for DateTime<Utc> {
    const PROPERTY_TYPE: PropertyType = PropertyType::Date;

    /// The Unix epoch
    fn empty() -> Self {
        DateTime::<Utc>::default()
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        match value {
            SettingsValue::Date(date) => Some(*date),
            SettingsValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|date| date.with_timezone(&Utc)),
            _ => None,
        }
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Date(self)
    }
}

impl StoredValue for Vec<SettingsValue> {
    const PROPERTY_TYPE: PropertyType = PropertyType::Array;

    fn empty() -> Self {
        Vec::new()
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        match value {
            SettingsValue::Array(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Array(self)
    }
}

impl StoredValue for BTreeMap<String, SettingsValue> {
    const PROPERTY_TYPE: PropertyType = PropertyType::Dictionary;

    fn empty() -> Self {
        BTreeMap::new()
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        match value {
            SettingsValue::Dictionary(map) => Some(map.clone()),
            _ => None,
        }
    }

    fn into_stored(self) -> SettingsValue {
        SettingsValue::Dictionary(self)
    }
}

/// Opaque object: any stored value, `null` when absent
impl StoredValue for SettingsValue {
    const PROPERTY_TYPE: PropertyType = PropertyType::Object;

    fn empty() -> Self {
        SettingsValue::Object(serde_json::Value::Null)
    }

    fn from_stored(value: &SettingsValue) -> Option<Self> {
        Some(value.clone())
    }

    fn into_stored(self) -> SettingsValue {
        self
    }
}

macro_rules! scalar_accessors {
    ($($get:ident, $set:ident => $ty:ty, $variant:ident;)*) => {
        $(
            pub fn $get(&self, key: &str) -> $ty {
                self.get::<$ty>(key)
            }

            pub fn $set(&mut self, value: $ty, key: &str, overwrite: bool) {
                self.set_object(SettingsValue::$variant(value), key, overwrite);
            }
        )*
    };
}

/// Typed get/set protocol over a defaults backend
pub struct SettingsStore {
    defaults: Box<dyn Defaults>,
}

impl SettingsStore {
    pub fn new(defaults: impl Defaults + 'static) -> Self {
        Self {
            defaults: Box::new(defaults),
        }
    }

    pub fn defaults(&self) -> &dyn Defaults {
        self.defaults.as_ref()
    }

    /// Read `key` as `T`, or `T::empty()` when absent or not convertible
    pub fn get<T: StoredValue>(&self, key: &str) -> T {
        let Some(value) = self.defaults.object(key) else {
            return T::empty();
        };
        T::from_stored(&value).unwrap_or_else(|| {
            let requested = T::PROPERTY_TYPE;
            trace!(
                key = %key,
                stored = %value.property_type(),
                requested = %requested,
                "Stored value does not convert, using empty value"
            );
            T::empty()
        })
    }

    pub fn set<T: StoredValue>(&mut self, value: T, key: &str, overwrite: bool) {
        self.set_object(value.into_stored(), key, overwrite);
    }

    /// Write any value; skipped when `overwrite` is false and `key` exists
    pub fn set_object(&mut self, value: SettingsValue, key: &str, overwrite: bool) {
        if !overwrite && self.defaults.contains(key) {
            trace!(key = %key, "Key already set, not overwriting");
            return;
        }
        self.defaults.set_object(key, value);
    }

    /// Raw stored value, without any conversion
    pub fn value_for_key(&self, key: &str) -> Option<SettingsValue> {
        self.defaults.object(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.defaults.contains(key)
    }

    pub fn remove(&mut self, key: &str) {
        self.defaults.remove_object(key);
    }

    /// Flush the backend; its errors are returned unchanged
    pub fn synchronize(&mut self) -> Result<()> {
        self.defaults.synchronize()
    }

    scalar_accessors! {
        get_char, set_char => i8, Char;
        get_short, set_short => i16, Short;
        get_int, set_int => i32, Int;
        get_long, set_long => i64, Long;
        get_long_long, set_long_long => i64, LongLong;
        get_unsigned_char, set_unsigned_char => u8, UChar;
        get_unsigned_short, set_unsigned_short => u16, UShort;
        get_unsigned_int, set_unsigned_int => u32, UInt;
        get_unsigned_long, set_unsigned_long => u64, ULong;
        get_unsigned_long_long, set_unsigned_long_long => u64, ULongLong;
        get_float, set_float => f32, Float;
        get_double, set_double => f64, Double;
        get_bool, set_bool => bool, Bool;
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get(key)
    }

    pub fn get_data(&self, key: &str) -> Vec<u8> {
        self.get(key)
    }

    pub fn get_number(&self, key: &str) -> serde_json::Number {
        self.get(key)
    }

    pub fn get_date(&self, key: &str) -> DateTime<Utc> {
        self.get(key)
    }

    pub fn get_array(&self, key: &str) -> Vec<SettingsValue> {
        self.get(key)
    }

    pub fn get_dictionary(&self, key: &str) -> BTreeMap<String, SettingsValue> {
        self.get(key)
    }

    pub fn get_object(&self, key: &str) -> SettingsValue {
        self.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryDefaults;

    fn store() -> SettingsStore {
        SettingsStore::new(MemoryDefaults::new())
    }

    #[test]
    fn test_absent_keys_read_empty_values() {
        let store = store();

        assert_eq!(store.get_int("missing"), 0);
        assert_eq!(store.get_unsigned_long_long("missing"), 0);
        assert_eq!(store.get_double("missing"), 0.0);
        assert!(!store.get_bool("missing"));
        assert_eq!(store.get_string("missing"), "");
        assert!(store.get_data("missing").is_empty());
        assert_eq!(store.get_number("missing"), serde_json::Number::from(0));
        assert_eq!(store.get_date("missing").timestamp(), 0);
        assert!(store.get_array("missing").is_empty());
        assert!(store.get_dictionary("missing").is_empty());
        assert_eq!(store.get_object("missing"), SettingsValue::Object(serde_json::Value::Null));
        assert_eq!(store.value_for_key("missing"), None);
    }

    #[test]
    fn test_no_overwrite_keeps_first_value() {
        let mut store = store();

        store.set_int(1, "count", false);
        store.set_int(2, "count", false);
        assert_eq!(store.get_int("count"), 1);

        store.set_bool(true, "flag", false);
        store.set_bool(false, "flag", false);
        assert!(store.get_bool("flag"));

        store.set(String::from("first"), "name", false);
        store.set(String::from("second"), "name", false);
        assert_eq!(store.get_string("name"), "first");
    }

    #[test]
    fn test_overwrite_keeps_last_value() {
        let mut store = store();

        store.set_double(1.5, "ratio", true);
        store.set_double(2.5, "ratio", true);
        assert_eq!(store.get_double("ratio"), 2.5);

        store.set_unsigned_short(10, "port", true);
        store.set_unsigned_short(20, "port", true);
        assert_eq!(store.get_unsigned_short("port"), 20);
    }

    #[test]
    fn test_no_overwrite_respects_stored_zero() {
        let mut store = store();

        store.set_int(0, "level", true);
        store.set_int(5, "level", false);
        assert_eq!(store.get_int("level"), 0);
    }

    #[test]
    fn test_named_accessors_write_their_width() {
        let mut store = store();

        store.set_long_long(-3, "a", true);
        store.set_unsigned_char(7, "b", true);
        store.set_char(-1, "c", true);

        assert_eq!(store.value_for_key("a"), Some(SettingsValue::LongLong(-3)));
        assert_eq!(store.value_for_key("b"), Some(SettingsValue::UChar(7)));
        assert_eq!(store.value_for_key("c"), Some(SettingsValue::Char(-1)));
    }

    #[test]
    fn test_reads_coerce_between_numeric_kinds() {
        let mut store = store();

        store.set_double(3.75, "value", true);
        assert_eq!(store.get_int("value"), 3);
        assert_eq!(store.get_float("value"), 3.75);
        assert!(store.get_bool("value"));
        assert_eq!(store.get_string("value"), "3.75");
        assert_eq!(store.get_number("value"), serde_json::Number::from_f64(3.75).unwrap());

        store.set_int(300, "wide", true);
        assert_eq!(store.get_unsigned_char("wide"), 44);
    }

    #[test]
    fn test_mismatched_reads_return_empty() {
        let mut store = store();

        store.set(vec![1u8, 2, 3], "blob", true);
        assert_eq!(store.get_int("blob"), 0);
        assert_eq!(store.get_string("blob"), "");
        assert!(store.get_array("blob").is_empty());
        assert_eq!(store.get_data("blob"), vec![1, 2, 3]);
    }

    #[test]
    fn test_date_and_collections() {
        let mut store = store();
        let date = DateTime::parse_from_rfc3339("2024-05-06T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);

        store.set(date, "last_run", true);
        store.set(vec![SettingsValue::Int(1)], "recent", true);
        let mut map = BTreeMap::new();
        map.insert("k".to_string(), SettingsValue::Bool(true));
        store.set(map.clone(), "flags", true);

        assert_eq!(store.get_date("last_run"), date);
        assert_eq!(store.get_array("recent"), vec![SettingsValue::Int(1)]);
        assert_eq!(store.get_dictionary("flags"), map);
        assert_eq!(store.get_object("flags"), SettingsValue::Dictionary(map));
    }

    #[test]
    fn test_remove_then_no_overwrite_writes() {
        let mut store = store();

        store.set_float(1.0, "zoom", true);
        store.remove("zoom");
        assert!(!store.contains("zoom"));

        store.set_float(2.0, "zoom", false);
        assert_eq!(store.get_float("zoom"), 2.0);
    }
}
