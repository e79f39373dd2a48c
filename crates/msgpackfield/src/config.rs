use msgpackfield_codec::{CodecOptions, DisplayOptions};
use msgpackfield_types::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// What happens to form text that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidJsonPolicy {
    /// Accept the submission; the value decodes to null with a warning.
    #[default]
    Null,
    /// Fail form validation with [`crate::FormError::InvalidJson`].
    Reject,
}

/// Per-field settings, loadable from a TOML file.
///
/// ```toml
/// help_text = "Arbitrary settings"
/// invalid_json = "reject"
///
/// [codec]
/// binary_modes = ["utf8", "raw"]
///
/// [display]
/// indent = "  "
/// ensure_ascii = false
///
/// [default]
/// theme = "dark"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub help_text: String,
    /// Resolve an empty-string default to an absent value.
    pub empty_default_is_null: bool,
    pub invalid_json: InvalidJsonPolicy,
    pub codec: CodecOptions,
    pub display: DisplayOptions,
    /// Static default for new rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            help_text: String::new(),
            empty_default_is_null: true,
            invalid_json: InvalidJsonPolicy::Null,
            codec: CodecOptions::default(),
            display: DisplayOptions::default(),
            default: None,
        }
    }
}

impl FieldConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: FieldConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write the config as TOML. Fails with [`Error::Config`] when the
    /// default holds something TOML cannot store.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(default) = &self.default {
            check_storable_default(default)?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// TOML has no null, byte string or extension type, its integers are
/// signed 64-bit and its keys are strings.
fn check_storable_default(value: &Value) -> Result<()> {
    match value {
        Value::Nil | Value::Bytes(_) | Value::Ext(..) => Err(Error::Config(format!(
            "default contains a {} value, which TOML cannot store",
            value.type_name()
        ))),
        Value::UInt(n) if i64::try_from(*n).is_err() => Err(Error::Config(format!(
            "default contains {}, which is out of range for a TOML integer",
            n
        ))),
        Value::Array(items) => items.iter().try_for_each(check_storable_default),
        Value::Map(entries) => entries.iter().try_for_each(|(key, value)| {
            if key.as_str().is_none() {
                return Err(Error::Config(format!(
                    "default has a map key of type {}; TOML keys are strings",
                    key.type_name()
                )));
            }
            check_storable_default(value)
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgpackfield_codec::BinaryMode;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = FieldConfig::default();
        assert!(config.empty_default_is_null);
        assert_eq!(config.invalid_json, InvalidJsonPolicy::Null);
        assert_eq!(config.display.indent.as_deref(), Some("\t"));
        assert!(config.default.is_none());
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("field.toml");

        let config = FieldConfig {
            help_text: "Packed settings".to_string(),
            invalid_json: InvalidJsonPolicy::Reject,
            ..FieldConfig::default()
        };

        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = FieldConfig::load_from(&config_path)?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[test]
    fn test_non_default_options_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("field.toml");

        let config = FieldConfig {
            empty_default_is_null: false,
            codec: CodecOptions {
                binary_modes: vec![BinaryMode::Utf8],
                max_depth: 32,
                use_bin_type: false,
            },
            display: DisplayOptions {
                indent: None,
                item_separator: ",".to_string(),
                key_separator: ":".to_string(),
                ensure_ascii: false,
            },
            default: Some(Value::from(serde_json::json!({"theme": "dark", "sizes": [1, 2]}))),
            ..FieldConfig::default()
        };

        config.save_to(&config_path)?;
        let loaded = FieldConfig::load_from(&config_path)?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.display.indent, None);

        Ok(())
    }

    #[test]
    fn test_default_with_null_is_rejected_on_save() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("field.toml");

        let config = FieldConfig {
            default: Some(Value::from(serde_json::json!({"a": null}))),
            ..FieldConfig::default()
        };

        let err = config.save_to(&config_path).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("nil")));
        assert!(!config_path.exists());

        let config = FieldConfig {
            default: Some(Value::Map(vec![(Value::UInt(1), Value::from("one"))])),
            ..FieldConfig::default()
        };
        assert!(config.save_to(&config_path).is_err());

        Ok(())
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("field.toml");
        std::fs::write(
            &config_path,
            r#"
empty_default_is_null = false

[codec]
binary_modes = ["raw"]

[default]
theme = "dark"
sizes = [1, 2]
"#,
        )?;

        let config = FieldConfig::load_from(&config_path)?;
        assert!(!config.empty_default_is_null);
        assert_eq!(config.codec.binary_modes, vec![BinaryMode::Raw]);
        assert_eq!(config.codec.max_depth, CodecOptions::default().max_depth);

        let default = config.default.expect("default table");
        assert_eq!(default.get("theme"), Some(&Value::from("dark")));
        assert_eq!(
            default.get("sizes"),
            Some(&Value::Array(vec![Value::UInt(1), Value::UInt(2)]))
        );

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = FieldConfig::load_from(&config_path)?;
        assert_eq!(config, FieldConfig::default());

        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_config_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("broken.toml");
        std::fs::write(&config_path, "invalid_json = 3")?;

        let err = FieldConfig::load_from(&config_path).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error:"));

        Ok(())
    }
}
