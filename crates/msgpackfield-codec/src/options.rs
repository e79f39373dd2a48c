use serde::{Deserialize, Serialize};
use std::fmt;

/// How string-typed MessagePack values are surfaced while unpacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryMode {
    /// Strings must be valid UTF-8 and become `Value::String`.
    Utf8,
    /// Strings are taken as raw bytes and become `Value::Bytes`.
    Raw,
}

impl fmt::Display for BinaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryMode::Utf8 => write!(f, "utf8"),
            BinaryMode::Raw => write!(f, "raw"),
        }
    }
}

/// Codec settings shared by every field using the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Unpack modes tried in order for binary input; first success wins.
    pub binary_modes: Vec<BinaryMode>,
    /// Maximum nesting of arrays and maps accepted while unpacking.
    pub max_depth: usize,
    /// Pack `Value::Bytes` with the binary type. When false, bytes are written
    /// with the string type as legacy encoders did.
    pub use_bin_type: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            binary_modes: vec![BinaryMode::Utf8, BinaryMode::Raw],
            max_depth: 512,
            use_bin_type: true,
        }
    }
}

/// Layout of the JSON text shown in the editing widget and fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Indent unit per nesting level; `None` keeps everything on one line.
    /// Written to config files as `indent = false`.
    #[serde(with = "indent_setting")]
    pub indent: Option<String>,
    pub item_separator: String,
    pub key_separator: String,
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ensure_ascii: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            indent: Some("\t".to_string()),
            item_separator: ", ".to_string(),
            key_separator: ": ".to_string(),
            ensure_ascii: true,
        }
    }
}

/// TOML has no null, so a disabled indent is stored as `false`.
mod indent_setting {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Indent {
        Unit(String),
        Off(bool),
    }

    pub fn serialize<S: Serializer>(
        indent: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match indent {
            Some(unit) => Indent::Unit(unit.clone()),
            None => Indent::Off(false),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Indent::deserialize(deserializer)? {
            Indent::Unit(unit) => Ok(Some(unit)),
            Indent::Off(false) => Ok(None),
            Indent::Off(true) => Err(de::Error::custom(
                "indent must be a string, or false for single-line output",
            )),
        }
    }
}
