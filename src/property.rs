//! Property attribute decoding
//!
//! A declared property is described by a compact attribute encoding such as
//! `T@"NSString",C,N,V_title`: a type token followed by single-character
//! attribute tokens, separated by commas. [`PropertyDescriptor::decode`]
//! turns that string into a typed descriptor. Decoding never fails; anything
//! that cannot be stored as a setting degrades to [`PropertyType::Unsupported`].

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use tracing::debug;

use crate::constants::{attribute, bridged, encoding, type_code};

/// Storage type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    Unsupported,
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    UChar,
    UShort,
    UInt,
    ULong,
    ULongLong,
    Float,
    Double,
    String,
    Data,
    Number,
    Date,
    Array,
    Dictionary,
    Object,
}

impl PropertyType {
    pub const ALL: [PropertyType; 21] = [
        PropertyType::Unsupported,
        PropertyType::Bool,
        PropertyType::Char,
        PropertyType::Short,
        PropertyType::Int,
        PropertyType::Long,
        PropertyType::LongLong,
        PropertyType::UChar,
        PropertyType::UShort,
        PropertyType::UInt,
        PropertyType::ULong,
        PropertyType::ULongLong,
        PropertyType::Float,
        PropertyType::Double,
        PropertyType::String,
        PropertyType::Data,
        PropertyType::Number,
        PropertyType::Date,
        PropertyType::Array,
        PropertyType::Dictionary,
        PropertyType::Object,
    ];

    /// Stable lowercase name, also accepted by [`PropertyType::from_name`]
    pub const fn as_str(self) -> &'static str {
        match self {
            PropertyType::Unsupported => "unsupported",
            PropertyType::Bool => "bool",
            PropertyType::Char => "char",
            PropertyType::Short => "short",
            PropertyType::Int => "int",
            PropertyType::Long => "long",
            PropertyType::LongLong => "long_long",
            PropertyType::UChar => "uchar",
            PropertyType::UShort => "ushort",
            PropertyType::UInt => "uint",
            PropertyType::ULong => "ulong",
            PropertyType::ULongLong => "ulong_long",
            PropertyType::Float => "float",
            PropertyType::Double => "double",
            PropertyType::String => "string",
            PropertyType::Data => "data",
            PropertyType::Number => "number",
            PropertyType::Date => "date",
            PropertyType::Array => "array",
            PropertyType::Dictionary => "dictionary",
            PropertyType::Object => "object",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|ty| ty.as_str() == name)
    }

    /// Numeric and boolean types that map to a single machine value
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            PropertyType::Bool
                | PropertyType::Char
                | PropertyType::Short
                | PropertyType::Int
                | PropertyType::Long
                | PropertyType::LongLong
                | PropertyType::UChar
                | PropertyType::UShort
                | PropertyType::UInt
                | PropertyType::ULong
                | PropertyType::ULongLong
                | PropertyType::Float
                | PropertyType::Double
        )
    }

    pub const fn is_supported(self) -> bool {
        !matches!(self, PropertyType::Unsupported)
    }

    fn from_type_code(code: char) -> Option<Self> {
        let ty = match code {
            type_code::CHAR => PropertyType::Char,
            type_code::BOOL => PropertyType::Bool,
            type_code::SHORT => PropertyType::Short,
            type_code::INT => PropertyType::Int,
            type_code::LONG => PropertyType::Long,
            type_code::LONG_LONG => PropertyType::LongLong,
            type_code::UCHAR => PropertyType::UChar,
            type_code::USHORT => PropertyType::UShort,
            type_code::UINT => PropertyType::UInt,
            type_code::ULONG => PropertyType::ULong,
            type_code::ULONG_LONG => PropertyType::ULongLong,
            type_code::FLOAT => PropertyType::Float,
            type_code::DOUBLE => PropertyType::Double,
            _ => return None,
        };
        Some(ty)
    }

    /// Refine an object type by its class name; unknown classes stay `Object`
    fn from_class_name(class_name: &str) -> Self {
        let table: [(&[&str], PropertyType); 6] = [
            (bridged::STRING, PropertyType::String),
            (bridged::DATA, PropertyType::Data),
            (bridged::NUMBER, PropertyType::Number),
            (bridged::DATE, PropertyType::Date),
            (bridged::ARRAY, PropertyType::Array),
            (bridged::DICTIONARY, PropertyType::Dictionary),
        ];
        table
            .iter()
            .find(|(names, _)| names.contains(&class_name))
            .map(|(_, ty)| *ty)
            .unwrap_or(PropertyType::Object)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Bit set of property attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AttributeFlags(u32);

impl AttributeFlags {
    pub const NONE: Self = Self(0);
    pub const READ_ONLY: Self = Self(1 << 0);
    pub const COPY: Self = Self(1 << 1);
    pub const RETAIN: Self = Self(1 << 2);
    pub const NON_ATOMIC: Self = Self(1 << 3);
    pub const CUSTOM_GETTER: Self = Self(1 << 4);
    pub const CUSTOM_SETTER: Self = Self(1 << 5);
    pub const DYNAMIC: Self = Self(1 << 6);
    pub const WEAK: Self = Self(1 << 7);

    const NAMED: [(AttributeFlags, &'static str); 8] = [
        (Self::READ_ONLY, "read_only"),
        (Self::COPY, "copy"),
        (Self::RETAIN, "retain"),
        (Self::NON_ATOMIC, "non_atomic"),
        (Self::CUSTOM_GETTER, "custom_getter"),
        (Self::CUSTOM_SETTER, "custom_setter"),
        (Self::DYNAMIC, "dynamic"),
        (Self::WEAK, "weak"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Names of the set flags, in bit order
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for AttributeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttributeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AttributeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for AttributeFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

/// Decoded form of a property attribute encoding
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PropertyDescriptor {
    property_type: PropertyType,
    flags: AttributeFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    ivar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_getter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_setter: Option<String>,
}

impl PropertyDescriptor {
    /// Decode an attribute encoding string
    ///
    /// The first token selects the type; the remaining tokens are applied in
    /// order. Flags accumulate, while `V`, `G` and `S` payloads overwrite any
    /// earlier occurrence. `C` (copy) and `&` (retain) exclude each other and
    /// the later one wins.
    pub fn decode(attributes: &str) -> Self {
        let mut tokens = attributes.split(encoding::TOKEN_SEPARATOR);
        let type_token = tokens.next().unwrap_or_default();

        let mut descriptor = Self {
            property_type: decode_type_token(type_token),
            ..Self::default()
        };

        for token in tokens {
            let mut chars = token.chars();
            let Some(code) = chars.next() else {
                continue;
            };
            let payload = chars.as_str();

            match code {
                attribute::READ_ONLY => descriptor.flags |= AttributeFlags::READ_ONLY,
                attribute::COPY => {
                    descriptor.flags.remove(AttributeFlags::RETAIN);
                    descriptor.flags |= AttributeFlags::COPY;
                }
                attribute::RETAIN => {
                    descriptor.flags.remove(AttributeFlags::COPY);
                    descriptor.flags |= AttributeFlags::RETAIN;
                }
                attribute::NON_ATOMIC => descriptor.flags |= AttributeFlags::NON_ATOMIC,
                attribute::CUSTOM_GETTER => {
                    descriptor.flags |= AttributeFlags::CUSTOM_GETTER;
                    descriptor.custom_getter = Some(payload.to_string());
                }
                attribute::CUSTOM_SETTER => {
                    descriptor.flags |= AttributeFlags::CUSTOM_SETTER;
                    descriptor.custom_setter = Some(payload.to_string());
                }
                attribute::DYNAMIC => descriptor.flags |= AttributeFlags::DYNAMIC,
                attribute::WEAK => descriptor.flags |= AttributeFlags::WEAK,
                attribute::IVAR => descriptor.ivar = Some(payload.to_string()),
                _ => debug!(token = %token, "Ignoring unknown attribute token"),
            }
        }

        descriptor
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    pub fn flags(&self) -> AttributeFlags {
        self.flags
    }

    pub fn has_flag(&self, flag: AttributeFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_read_only(&self) -> bool {
        self.has_flag(AttributeFlags::READ_ONLY)
    }

    pub fn is_non_atomic(&self) -> bool {
        self.has_flag(AttributeFlags::NON_ATOMIC)
    }

    /// Backing field name, if one was declared
    pub fn ivar(&self) -> Option<&str> {
        self.ivar.as_deref()
    }

    pub fn custom_getter(&self) -> Option<&str> {
        self.custom_getter.as_deref()
    }

    pub fn custom_setter(&self) -> Option<&str> {
        self.custom_setter.as_deref()
    }
}

fn decode_type_token(token: &str) -> PropertyType {
    let Some(type_encoding) = token.strip_prefix(encoding::TYPE_PREFIX) else {
        if token.starts_with(encoding::RAW_TYPE_PREFIX) {
            debug!(token = %token, "Raw type encodings are not supported");
        } else if token.starts_with(encoding::PROTOCOL_MARKER) {
            debug!(token = %token, "Protocol type tokens are not supported");
        } else {
            debug!(token = %token, "Unrecognized type token");
        }
        return PropertyType::Unsupported;
    };

    let mut chars = type_encoding.chars();
    let ty = match chars.next() {
        Some(encoding::OBJECT) => decode_object_type(chars.as_str()),
        Some(code) if chars.as_str().is_empty() => {
            PropertyType::from_type_code(code).unwrap_or(PropertyType::Unsupported)
        }
        _ => PropertyType::Unsupported,
    };

    if !ty.is_supported() {
        debug!(token = %token, "Unsupported type encoding");
    }
    ty
}

/// Object encodings: `@`, `@?` (block), `@"ClassName"` or `@"ClassName<Protocol>"`
fn decode_object_type(rest: &str) -> PropertyType {
    let Some(quoted) = rest.strip_prefix(encoding::CLASS_QUOTE) else {
        if !rest.is_empty() && !rest.starts_with(encoding::BLOCK_SUFFIX) {
            debug!(encoding = %rest, "Unexpected object encoding, treating as object");
        }
        return PropertyType::Object;
    };

    let quoted = quoted.strip_suffix(encoding::CLASS_QUOTE).unwrap_or(quoted);
    let class_name = quoted
        .split(encoding::PROTOCOL_LIST_START)
        .next()
        .unwrap_or_default();

    PropertyType::from_class_name(class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_computed_value_example() {
        let descriptor = PropertyDescriptor::decode("Ti,GcomputedValue,R");

        assert_eq!(descriptor.property_type(), PropertyType::Int);
        assert_eq!(
            descriptor.flags(),
            AttributeFlags::READ_ONLY | AttributeFlags::CUSTOM_GETTER
        );
        assert_eq!(descriptor.custom_getter(), Some("computedValue"));
        assert_eq!(descriptor.custom_setter(), None);
        assert_eq!(descriptor.ivar(), None);
    }

    #[test]
    fn test_decode_scalar_type_codes() {
        let cases = [
            ("Tc", PropertyType::Char),
            ("TB", PropertyType::Bool),
            ("Ts", PropertyType::Short),
            ("Ti", PropertyType::Int),
            ("Tl", PropertyType::Long),
            ("Tq", PropertyType::LongLong),
            ("TC", PropertyType::UChar),
            ("TS", PropertyType::UShort),
            ("TI", PropertyType::UInt),
            ("TL", PropertyType::ULong),
            ("TQ", PropertyType::ULongLong),
            ("Tf", PropertyType::Float),
            ("Td", PropertyType::Double),
        ];

        for (encoding, expected) in cases {
            let with_attributes = format!("{encoding},N,V_value");
            assert_eq!(PropertyDescriptor::decode(encoding).property_type(), expected, "{encoding}");
            assert_eq!(
                PropertyDescriptor::decode(&with_attributes).property_type(),
                expected,
                "{with_attributes}"
            );
        }
    }

    #[test]
    fn test_decode_bridged_object_types() {
        let cases = [
            (r#"T@"NSString",C,N,V_title"#, PropertyType::String),
            (r#"T@"NSMutableString",&,N"#, PropertyType::String),
            (r#"T@"NSData",&,N"#, PropertyType::Data),
            (r#"T@"NSNumber",&,N"#, PropertyType::Number),
            (r#"T@"NSDate",&,N"#, PropertyType::Date),
            (r#"T@"NSArray<NSCopying>",C,N"#, PropertyType::Array),
            (r#"T@"NSDictionary",C,N"#, PropertyType::Dictionary),
            (r#"T@"NSMutableDictionary",&"#, PropertyType::Dictionary),
            (r#"T@"NSView",W,N"#, PropertyType::Object),
            (r#"T@"<NSCopying>",&"#, PropertyType::Object),
            ("T@,&", PropertyType::Object),
            ("T@?,C,N", PropertyType::Object),
        ];

        for (encoding, expected) in cases {
            assert_eq!(PropertyDescriptor::decode(encoding).property_type(), expected, "{encoding}");
        }
    }

    #[test]
    fn test_decode_unsupported_type_tokens() {
        let cases = [
            "",
            "P",
            "P,R",
            "t{CGRect=dddd},R",
            "T{CGPoint=dd},N",
            "T^i,N",
            "T*,R",
            "T:,N",
            "T#,&",
            "Tii,R",
            "X,R",
            "R,Ti",
        ];

        for encoding in cases {
            assert_eq!(
                PropertyDescriptor::decode(encoding).property_type(),
                PropertyType::Unsupported,
                "{encoding:?}"
            );
        }
    }

    #[test]
    fn test_raw_and_protocol_type_tokens_unsupported() {
        let raw = format!("{}{{CGRect=dddd}},R,V_rect", encoding::RAW_TYPE_PREFIX);
        let protocol = format!("{},N", encoding::PROTOCOL_MARKER);

        for token in [raw.as_str(), protocol.as_str()] {
            let descriptor = PropertyDescriptor::decode(token);
            assert_eq!(descriptor.property_type(), PropertyType::Unsupported, "{token}");
        }
        assert_eq!(PropertyDescriptor::decode(&raw).ivar(), Some("_rect"));
        assert!(PropertyDescriptor::decode(&protocol).is_non_atomic());
    }

    #[test]
    fn test_unsupported_type_keeps_attributes() {
        let descriptor = PropertyDescriptor::decode("T{CGSize=dd},R,N,V_size");

        assert_eq!(descriptor.property_type(), PropertyType::Unsupported);
        assert!(descriptor.is_read_only());
        assert!(descriptor.is_non_atomic());
        assert_eq!(descriptor.ivar(), Some("_size"));
    }

    #[test]
    fn test_each_flag_token_sets_only_its_flag() {
        let cases = [
            ("R", AttributeFlags::READ_ONLY),
            ("C", AttributeFlags::COPY),
            ("&", AttributeFlags::RETAIN),
            ("N", AttributeFlags::NON_ATOMIC),
            ("D", AttributeFlags::DYNAMIC),
            ("W", AttributeFlags::WEAK),
        ];

        for (token, flag) in cases {
            let present = PropertyDescriptor::decode(&format!("Ti,{token}"));
            assert_eq!(present.flags(), flag, "{token}");

            let absent = PropertyDescriptor::decode("Ti,V_other");
            assert!(!absent.has_flag(flag), "{token}");
        }
    }

    #[test]
    fn test_custom_setter_and_ivar() {
        let descriptor = PropertyDescriptor::decode("TB,N,GisEnabled,SsetIsEnabled:,V_enabled");

        assert_eq!(descriptor.property_type(), PropertyType::Bool);
        assert!(descriptor.has_flag(AttributeFlags::CUSTOM_GETTER));
        assert!(descriptor.has_flag(AttributeFlags::CUSTOM_SETTER));
        assert_eq!(descriptor.custom_getter(), Some("isEnabled"));
        assert_eq!(descriptor.custom_setter(), Some("setIsEnabled:"));
        assert_eq!(descriptor.ivar(), Some("_enabled"));
    }

    #[test]
    fn test_repeated_payload_tokens_last_wins() {
        let descriptor = PropertyDescriptor::decode("Td,Gfirst,V_a,Gsecond,V_b,Sone:,Stwo:");

        assert_eq!(descriptor.custom_getter(), Some("second"));
        assert_eq!(descriptor.custom_setter(), Some("two:"));
        assert_eq!(descriptor.ivar(), Some("_b"));
    }

    #[test]
    fn test_copy_then_retain_keeps_retain() {
        let descriptor = PropertyDescriptor::decode(r#"T@"NSString",C,&,N"#);

        assert!(descriptor.has_flag(AttributeFlags::RETAIN));
        assert!(!descriptor.has_flag(AttributeFlags::COPY));
        assert!(descriptor.is_non_atomic());
    }

    #[test]
    fn test_retain_then_copy_keeps_copy() {
        let descriptor = PropertyDescriptor::decode(r#"T@"NSString",&,C"#);

        assert!(descriptor.has_flag(AttributeFlags::COPY));
        assert!(!descriptor.has_flag(AttributeFlags::RETAIN));
    }

    #[test]
    fn test_unknown_and_empty_tokens_ignored() {
        let descriptor = PropertyDescriptor::decode("Tq,,P,tfoo,Z,R");

        assert_eq!(descriptor.property_type(), PropertyType::LongLong);
        assert_eq!(descriptor.flags(), AttributeFlags::READ_ONLY);
    }

    #[test]
    fn test_flag_bits_match_encoding_order() {
        assert_eq!(AttributeFlags::READ_ONLY.bits(), 1);
        assert_eq!(AttributeFlags::COPY.bits(), 2);
        assert_eq!(AttributeFlags::RETAIN.bits(), 4);
        assert_eq!(AttributeFlags::NON_ATOMIC.bits(), 8);
        assert_eq!(AttributeFlags::CUSTOM_GETTER.bits(), 16);
        assert_eq!(AttributeFlags::CUSTOM_SETTER.bits(), 32);
        assert_eq!(AttributeFlags::DYNAMIC.bits(), 64);
        assert_eq!(AttributeFlags::WEAK.bits(), 128);
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(AttributeFlags::NONE.to_string(), "none");
        assert_eq!(
            (AttributeFlags::WEAK | AttributeFlags::READ_ONLY).to_string(),
            "read_only|weak"
        );
    }

    #[test]
    fn test_property_type_name_roundtrip() {
        for ty in PropertyType::ALL {
            assert_eq!(PropertyType::from_name(ty.as_str()), Some(ty));
        }
        assert_eq!(PropertyType::from_name(" Long_Long "), Some(PropertyType::LongLong));
        assert_eq!(PropertyType::from_name("pointer"), None);
    }

    #[test]
    fn test_descriptor_serializes_flag_names() {
        let descriptor = PropertyDescriptor::decode("Ti,GcomputedValue,R");
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["property_type"], "int");
        assert_eq!(json["flags"], serde_json::json!(["read_only", "custom_getter"]));
        assert_eq!(json["custom_getter"], "computedValue");
        assert!(json.get("ivar").is_none());
    }
}
