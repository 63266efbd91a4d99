//! Application-wide constants
//!
//! This module contains the magic characters of the property attribute
//! encoding and the file/env names used by the configuration layer,
//! providing a single source of truth for constant values.

/// Property attribute encoding (comma separated tokens)
pub mod encoding {
    /// Separator between attribute tokens
    pub const TOKEN_SEPARATOR: char = ',';

    /// Leading character of the type token
    pub const TYPE_PREFIX: char = 'T';

    /// Raw (old-style) type encoding token, not supported
    pub const RAW_TYPE_PREFIX: char = 't';

    /// Protocol type token, not supported
    pub const PROTOCOL_MARKER: char = 'P';

    /// Object type code (optionally followed by a quoted class name)
    pub const OBJECT: char = '@';

    /// Block type suffix following the object code (`@?`)
    pub const BLOCK_SUFFIX: char = '?';

    /// Quote surrounding an object's class name
    pub const CLASS_QUOTE: char = '"';

    /// Start of the protocol list inside a quoted class name
    pub const PROTOCOL_LIST_START: char = '<';
}

/// Single-character scalar type codes
pub mod type_code {
    pub const CHAR: char = 'c';
    pub const BOOL: char = 'B';
    pub const SHORT: char = 's';
    pub const INT: char = 'i';
    pub const LONG: char = 'l';
    pub const LONG_LONG: char = 'q';
    pub const UCHAR: char = 'C';
    pub const USHORT: char = 'S';
    pub const UINT: char = 'I';
    pub const ULONG: char = 'L';
    pub const ULONG_LONG: char = 'Q';
    pub const FLOAT: char = 'f';
    pub const DOUBLE: char = 'd';
}

/// Attribute token codes following the type token
pub mod attribute {
    pub const READ_ONLY: char = 'R';
    pub const COPY: char = 'C';
    pub const RETAIN: char = '&';
    pub const NON_ATOMIC: char = 'N';
    pub const CUSTOM_GETTER: char = 'G';
    pub const CUSTOM_SETTER: char = 'S';
    pub const DYNAMIC: char = 'D';
    pub const WEAK: char = 'W';

    /// Backing field name (payload only, no flag)
    pub const IVAR: char = 'V';
}

/// Bridged class names recognized inside `@"..."` object encodings
pub mod bridged {
    pub const STRING: &[&str] = &["NSString", "NSMutableString"];
    pub const DATA: &[&str] = &["NSData", "NSMutableData"];
    pub const NUMBER: &[&str] = &["NSNumber"];
    pub const DATE: &[&str] = &["NSDate"];
    pub const ARRAY: &[&str] = &["NSArray", "NSMutableArray"];
    pub const DICTIONARY: &[&str] = &["NSDictionary", "NSMutableDictionary"];
}

/// Configuration file paths
pub mod config {
    /// Application directory under the user's config dir
    pub const APP_DIR: &str = "settings-store";

    /// Store configuration file name
    pub const FILENAME: &str = "config.json";

    /// Default file name of the JSON defaults backend
    pub const DEFAULTS_FILENAME: &str = "defaults.json";

    /// Overrides the defaults backend file path
    pub const ENV_DEFAULTS_PATH: &str = "SETTINGS_STORE_DEFAULTS";

    /// Overrides the key prefix applied to every property name
    pub const ENV_KEY_PREFIX: &str = "SETTINGS_STORE_KEY_PREFIX";

    /// Log level override read by the binary
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
}
