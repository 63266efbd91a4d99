//! Stored setting values
//!
//! [`SettingsValue`] is the closed set of value kinds a settings key can hold.
//! Scalars keep the width they were written with; reads coerce between
//! numeric kinds the way the defaults system does (booleans read as 0/1,
//! floats truncate, numeric strings parse).

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::collections::BTreeMap;
use std::fmt;

use crate::property::PropertyType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SettingsValue {
    Bool(bool),
    Char(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    LongLong(i64),
    #[serde(rename = "uchar")]
    UChar(u8),
    #[serde(rename = "ushort")]
    UShort(u16),
    #[serde(rename = "uint")]
    UInt(u32),
    #[serde(rename = "ulong")]
    ULong(u64),
    #[serde(rename = "ulong_long")]
    ULongLong(u64),
    #[serde(serialize_with = "serialize_f32", deserialize_with = "deserialize_f32")]
    Float(f32),
    #[serde(serialize_with = "serialize_f64", deserialize_with = "deserialize_f64")]
    Double(f64),
    String(String),
    Data(Vec<u8>),
    Number(serde_json::Number),
    Date(DateTime<Utc>),
    Array(Vec<SettingsValue>),
    Dictionary(BTreeMap<String, SettingsValue>),
    Object(serde_json::Value),
}

impl SettingsValue {
    /// Property type this value was written as
    pub fn property_type(&self) -> PropertyType {
        match self {
            SettingsValue::Bool(_) => PropertyType::Bool,
            SettingsValue::Char(_) => PropertyType::Char,
            SettingsValue::Short(_) => PropertyType::Short,
            SettingsValue::Int(_) => PropertyType::Int,
            SettingsValue::Long(_) => PropertyType::Long,
            SettingsValue::LongLong(_) => PropertyType::LongLong,
            SettingsValue::UChar(_) => PropertyType::UChar,
            SettingsValue::UShort(_) => PropertyType::UShort,
            SettingsValue::UInt(_) => PropertyType::UInt,
            SettingsValue::ULong(_) => PropertyType::ULong,
            SettingsValue::ULongLong(_) => PropertyType::ULongLong,
            SettingsValue::Float(_) => PropertyType::Float,
            SettingsValue::Double(_) => PropertyType::Double,
            SettingsValue::String(_) => PropertyType::String,
            SettingsValue::Data(_) => PropertyType::Data,
            SettingsValue::Number(_) => PropertyType::Number,
            SettingsValue::Date(_) => PropertyType::Date,
            SettingsValue::Array(_) => PropertyType::Array,
            SettingsValue::Dictionary(_) => PropertyType::Dictionary,
            SettingsValue::Object(_) => PropertyType::Object,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            SettingsValue::Bool(b) => Some(i64::from(b)),
            SettingsValue::Char(v) => Some(v.into()),
            SettingsValue::Short(v) => Some(v.into()),
            SettingsValue::Int(v) => Some(v.into()),
            SettingsValue::Long(v) | SettingsValue::LongLong(v) => Some(v),
            SettingsValue::UChar(v) => Some(v.into()),
            SettingsValue::UShort(v) => Some(v.into()),
            SettingsValue::UInt(v) => Some(v.into()),
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => Some(v as i64),
            SettingsValue::Float(v) => Some(v as i64),
            SettingsValue::Double(v) => Some(v as i64),
            SettingsValue::Number(ref n) => n
                .as_i64()
                .or_else(|| n.as_u64().map(|v| v as i64))
                .or_else(|| n.as_f64().map(|v| v as i64)),
            SettingsValue::String(ref s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
            }
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => Some(v),
            SettingsValue::Number(ref n) => n
                .as_u64()
                .or_else(|| n.as_i64().map(|v| v as u64))
                .or_else(|| n.as_f64().map(|v| v as u64)),
            SettingsValue::String(ref s) => {
                let s = s.trim();
                s.parse::<u64>().ok().or_else(|| self.as_i64().map(|v| v as u64))
            }
            _ => self.as_i64().map(|v| v as u64),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SettingsValue::Float(v) => Some(v.into()),
            SettingsValue::Double(v) => Some(v),
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => Some(v as f64),
            SettingsValue::Number(ref n) => n.as_f64(),
            SettingsValue::String(ref s) => s.trim().parse::<f64>().ok(),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingsValue::Bool(b) => Some(*b),
            SettingsValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" => Some(true),
                "no" | "false" => Some(false),
                _ => self.as_f64().map(|v| v != 0.0),
            },
            _ => self.as_f64().map(|v| v != 0.0),
        }
    }

    /// String form of strings and numeric scalars
    pub fn as_string(&self) -> Option<String> {
        match self {
            SettingsValue::String(s) => Some(s.clone()),
            SettingsValue::Data(_)
            | SettingsValue::Date(_)
            | SettingsValue::Array(_)
            | SettingsValue::Dictionary(_)
            | SettingsValue::Object(_) => None,
            scalar => Some(scalar.to_string()),
        }
    }

    /// Parse command line input as a value of the given type
    pub fn parse_as(property_type: PropertyType, input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let value = match property_type {
            PropertyType::Unsupported => bail!("Cannot store a value of unsupported type"),
            PropertyType::Bool => SettingsValue::String(trimmed.to_string())
                .as_bool()
                .map(SettingsValue::Bool)
                .ok_or_else(|| anyhow!("Invalid bool '{}'", trimmed))?,
            PropertyType::Char => SettingsValue::Char(parse_scalar(trimmed, property_type)?),
            PropertyType::Short => SettingsValue::Short(parse_scalar(trimmed, property_type)?),
            PropertyType::Int => SettingsValue::Int(parse_scalar(trimmed, property_type)?),
            PropertyType::Long => SettingsValue::Long(parse_scalar(trimmed, property_type)?),
            PropertyType::LongLong => SettingsValue::LongLong(parse_scalar(trimmed, property_type)?),
            PropertyType::UChar => SettingsValue::UChar(parse_scalar(trimmed, property_type)?),
            PropertyType::UShort => SettingsValue::UShort(parse_scalar(trimmed, property_type)?),
            PropertyType::UInt => SettingsValue::UInt(parse_scalar(trimmed, property_type)?),
            PropertyType::ULong => SettingsValue::ULong(parse_scalar(trimmed, property_type)?),
            PropertyType::ULongLong => SettingsValue::ULongLong(parse_scalar(trimmed, property_type)?),
            PropertyType::Float => {
                let value: f32 = parse_scalar(trimmed, property_type)?;
                if !value.is_finite() {
                    bail!("Invalid float '{}': value must be finite", trimmed);
                }
                SettingsValue::Float(value)
            }
            PropertyType::Double => {
                let value: f64 = parse_scalar(trimmed, property_type)?;
                if !value.is_finite() {
                    bail!("Invalid double '{}': value must be finite", trimmed);
                }
                SettingsValue::Double(value)
            }
            PropertyType::String => SettingsValue::String(input.to_string()),
            PropertyType::Data => SettingsValue::Data(decode_hex(trimmed)?),
            PropertyType::Number => SettingsValue::Number(
                serde_json::from_str(trimmed)
                    .with_context(|| format!("Invalid number '{}'", trimmed))?,
            ),
            PropertyType::Date => SettingsValue::Date(
                DateTime::parse_from_rfc3339(trimmed)
                    .with_context(|| format!("Invalid RFC 3339 date '{}'", trimmed))?
                    .with_timezone(&Utc),
            ),
            PropertyType::Array | PropertyType::Dictionary | PropertyType::Object => {
                let json: serde_json::Value = serde_json::from_str(trimmed)
                    .with_context(|| format!("Invalid JSON for {} value", property_type))?;
                let value = match property_type {
                    PropertyType::Object => SettingsValue::Object(json),
                    _ => SettingsValue::from_json(json),
                };
                if value.property_type() != property_type {
                    bail!("Expected a JSON {}, got {}", property_type, value.property_type());
                }
                value
            }
        };
        Ok(value)
    }

    /// Map plain JSON onto the value set: objects become dictionaries,
    /// numbers stay opaque, `null` is an empty object
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => SettingsValue::Object(serde_json::Value::Null),
            serde_json::Value::Bool(b) => SettingsValue::Bool(b),
            serde_json::Value::Number(n) => SettingsValue::Number(n),
            serde_json::Value::String(s) => SettingsValue::String(s),
            serde_json::Value::Array(items) => {
                SettingsValue::Array(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => SettingsValue::Dictionary(
                map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect(),
            ),
        }
    }
}

impl SettingsValue {
    /// Plain JSON view without type tags, used for display
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            SettingsValue::Bool(b) => Value::Bool(*b),
            SettingsValue::Float(v) => float_json(f64::from(*v)),
            SettingsValue::Double(v) => float_json(*v),
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => Value::from(*v),
            SettingsValue::String(s) => Value::String(s.clone()),
            SettingsValue::Data(_) | SettingsValue::Date(_) => Value::String(self.to_string()),
            SettingsValue::Number(n) => Value::Number(n.clone()),
            SettingsValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            SettingsValue::Dictionary(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            SettingsValue::Object(json) => json.clone(),
            signed => signed.as_i64().map(Value::from).unwrap_or(Value::Null),
        }
    }
}

fn float_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn parse_scalar<T>(input: &str, property_type: PropertyType) -> Result<T>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    input
        .parse::<T>()
        .with_context(|| format!("Invalid {} '{}'", property_type, input))
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&digits).with_context(|| format!("Invalid hex data '{}'", input))
}

// JSON has no NaN or infinity; those are written as strings so the file stays loadable

const NAN: &str = "NaN";
const INFINITY: &str = "inf";
const NEG_INFINITY: &str = "-inf";

fn non_finite_name(value: f64) -> &'static str {
    if value.is_nan() {
        NAN
    } else if value.is_sign_negative() {
        NEG_INFINITY
    } else {
        INFINITY
    }
}

fn serialize_f32<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f32(*value)
    } else {
        serializer.serialize_str(non_finite_name(f64::from(*value)))
    }
}

fn serialize_f64<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_str(non_finite_name(*value))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Text(String),
}

impl FloatRepr {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            FloatRepr::Number(value) => Ok(value),
            FloatRepr::Text(text) => match text.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(E::custom(format!("invalid float '{other}'"))),
            },
        }
    }
}

fn deserialize_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    FloatRepr::deserialize(deserializer)?.into_f64().map(|value| value as f32)
}

fn deserialize_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    FloatRepr::deserialize(deserializer)?.into_f64()
}

impl fmt::Display for SettingsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsValue::Bool(v) => write!(f, "{v}"),
            SettingsValue::Char(v) => write!(f, "{v}"),
            SettingsValue::Short(v) => write!(f, "{v}"),
            SettingsValue::Int(v) => write!(f, "{v}"),
            SettingsValue::Long(v) | SettingsValue::LongLong(v) => write!(f, "{v}"),
            SettingsValue::UChar(v) => write!(f, "{v}"),
            SettingsValue::UShort(v) => write!(f, "{v}"),
            SettingsValue::UInt(v) => write!(f, "{v}"),
            SettingsValue::ULong(v) | SettingsValue::ULongLong(v) => write!(f, "{v}"),
            SettingsValue::Float(v) => write!(f, "{v}"),
            SettingsValue::Double(v) => write!(f, "{v}"),
            SettingsValue::String(v) => f.write_str(v),
            SettingsValue::Data(bytes) => write!(f, "<{}>", hex::encode(bytes)),
            SettingsValue::Number(n) => write!(f, "{n}"),
            SettingsValue::Date(d) => f.write_str(&d.to_rfc3339()),
            SettingsValue::Array(_) | SettingsValue::Dictionary(_) => write!(f, "{}", self.to_json()),
            SettingsValue::Object(json) => write!(f, "{json}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(SettingsValue::Bool(true).as_i64(), Some(1));
        assert_eq!(SettingsValue::Double(3.9).as_i64(), Some(3));
        assert_eq!(SettingsValue::UInt(7).as_f64(), Some(7.0));
        assert_eq!(SettingsValue::String(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SettingsValue::String("2.5".into()).as_f64(), Some(2.5));
        assert_eq!(SettingsValue::ULongLong(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(SettingsValue::Number(5.into()).as_i64(), Some(5));
        assert_eq!(SettingsValue::Data(vec![1]).as_i64(), None);
    }

    #[test]
    fn test_bool_coercions() {
        assert_eq!(SettingsValue::Int(0).as_bool(), Some(false));
        assert_eq!(SettingsValue::Char(2).as_bool(), Some(true));
        assert_eq!(SettingsValue::String("YES".into()).as_bool(), Some(true));
        assert_eq!(SettingsValue::String("false".into()).as_bool(), Some(false));
        assert_eq!(SettingsValue::String("maybe".into()).as_bool(), None);
        assert_eq!(SettingsValue::Array(vec![]).as_bool(), None);
    }

    #[test]
    fn test_as_string_formats_scalars() {
        assert_eq!(SettingsValue::Int(12).as_string().as_deref(), Some("12"));
        assert_eq!(SettingsValue::String("hi".into()).as_string().as_deref(), Some("hi"));
        assert_eq!(SettingsValue::Data(vec![0xAB]).as_string(), None);
    }

    #[test]
    fn test_serialized_tag_matches_property_type_name() {
        let value = SettingsValue::ULongLong(9);
        let json = serde_json::to_value(&value).unwrap();

        assert_eq!(json["type"], PropertyType::ULongLong.as_str());
        assert_eq!(json["value"], 9);
        assert_eq!(serde_json::from_value::<SettingsValue>(json).unwrap(), value);
    }

    #[test]
    fn test_parse_as_scalars_and_strings() {
        assert_eq!(SettingsValue::parse_as(PropertyType::Int, " -4 ").unwrap(), SettingsValue::Int(-4));
        assert_eq!(SettingsValue::parse_as(PropertyType::Bool, "yes").unwrap(), SettingsValue::Bool(true));
        assert_eq!(SettingsValue::parse_as(PropertyType::UChar, "255").unwrap(), SettingsValue::UChar(255));
        assert_eq!(
            SettingsValue::parse_as(PropertyType::String, " padded ").unwrap(),
            SettingsValue::String(" padded ".into())
        );
        assert!(SettingsValue::parse_as(PropertyType::UChar, "256").is_err());
        assert!(SettingsValue::parse_as(PropertyType::Unsupported, "1").is_err());
    }

    #[test]
    fn test_parse_as_data_and_date() {
        assert_eq!(
            SettingsValue::parse_as(PropertyType::Data, "0x00ff10").unwrap(),
            SettingsValue::Data(vec![0x00, 0xFF, 0x10])
        );
        assert!(SettingsValue::parse_as(PropertyType::Data, "abc").is_err());
        assert!(SettingsValue::parse_as(PropertyType::Data, "zz").is_err());
        assert_eq!(
            SettingsValue::parse_as(PropertyType::Data, "de ad\nbe ef").unwrap(),
            SettingsValue::Data(vec![0xDE, 0xAD, 0xBE, 0xEF])
        );

        let date = SettingsValue::parse_as(PropertyType::Date, "2024-03-01T12:00:00+02:00").unwrap();
        assert_eq!(date.to_string(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_as_collections() {
        let array = SettingsValue::parse_as(PropertyType::Array, r#"["a", 1, true]"#).unwrap();
        assert_eq!(
            array,
            SettingsValue::Array(vec![
                SettingsValue::String("a".into()),
                SettingsValue::Number(1.into()),
                SettingsValue::Bool(true),
            ])
        );

        let dict = SettingsValue::parse_as(PropertyType::Dictionary, r#"{"b": {"c": null}}"#).unwrap();
        let SettingsValue::Dictionary(map) = dict else {
            panic!("expected dictionary");
        };
        assert!(matches!(map["b"], SettingsValue::Dictionary(_)));

        assert!(SettingsValue::parse_as(PropertyType::Array, r#"{"a": 1}"#).is_err());
        assert_eq!(
            SettingsValue::parse_as(PropertyType::Object, r#"{"a": 1}"#).unwrap(),
            SettingsValue::Object(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn test_display_collections_as_plain_json() {
        let mut map = BTreeMap::new();
        map.insert("level".to_string(), SettingsValue::Short(3));
        map.insert("tags".to_string(), SettingsValue::Array(vec![SettingsValue::String("x".into())]));

        assert_eq!(SettingsValue::Dictionary(map).to_string(), r#"{"level":3,"tags":["x"]}"#);
    }

    #[test]
    fn test_parse_as_rejects_non_finite_floats() {
        for input in ["NaN", "inf", "-infinity", "1e40"] {
            assert!(SettingsValue::parse_as(PropertyType::Float, input).is_err(), "{input}");
        }
        for input in ["NaN", "inf", "-inf"] {
            assert!(SettingsValue::parse_as(PropertyType::Double, input).is_err(), "{input}");
        }
        assert_eq!(SettingsValue::parse_as(PropertyType::Double, "1e40").unwrap(), SettingsValue::Double(1e40));
    }

    #[test]
    fn test_non_finite_floats_serialize_as_strings() {
        let json = serde_json::to_value(SettingsValue::Double(f64::NEG_INFINITY)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "double", "value": "-inf" }));

        let value: SettingsValue = serde_json::from_value(serde_json::json!({ "type": "float", "value": "NaN" })).unwrap();
        assert!(matches!(value, SettingsValue::Float(v) if v.is_nan()));

        let value: SettingsValue = serde_json::from_value(serde_json::json!({ "type": "float", "value": 2 })).unwrap();
        assert_eq!(value, SettingsValue::Float(2.0));

        let bad = serde_json::from_value::<SettingsValue>(serde_json::json!({ "type": "double", "value": "lots" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_display_data_as_hex() {
        assert_eq!(SettingsValue::Data(vec![0x0A, 0xFF]).to_string(), "<0aff>");
    }
}
