use msgpackfield_codec::{Codec, Diagnostics, json_text};
use msgpackfield_types::{RawInput, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::FieldConfig;
use crate::default::{self, FieldDefault};
use crate::form::{FormError, FormField, FormFieldOptions};
use crate::widget::JsonTextWidget;
use crate::Result;

/// Lifecycle hooks a model layer calls on a custom column type.
///
/// | hook                | when                                         |
/// |---------------------|----------------------------------------------|
/// | `get_db_prep_value` | before a write; native value to column bytes |
/// | `from_db_value`     | after a read; column contents to native value|
/// | `to_python`         | cleaning form input or loading fixtures       |
/// | `get_default`       | creating a row without an explicit value     |
/// | `value_to_string`   | fixtures and admin display                   |
/// | `formfield`         | building the edit form                       |
pub trait ModelField {
    fn name(&self) -> &str;

    /// Storage class reported to the model layer.
    fn internal_type(&self) -> &'static str;

    /// SQL column type.
    fn db_type(&self) -> &'static str;

    fn to_python(&self, raw: RawInput) -> Option<Value>;

    /// Normalize an assigned value before it is prepared for the database.
    fn get_prep_value(&self, value: Option<Value>) -> Option<Value>;

    fn get_db_prep_value(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>>;

    fn from_db_value(&self, raw: Option<RawInput>) -> Option<Value>;

    fn get_default(&self) -> Option<Value>;

    fn value_to_string(&self, value: Option<&Value>) -> Result<String>;

    fn formfield(&self, overrides: FormFieldOptions) -> FormField;
}

/// Column type that stores any [`Value`] as MessagePack in a BLOB.
///
/// Reads never fail: corrupt or legacy data decodes to `None` and a warning
/// goes to the codec's diagnostics sink. Writes fail loudly when a value
/// cannot be packed. The field always allows blank values.
#[derive(Debug, Clone)]
pub struct MsgPackField {
    name: String,
    codec: Codec,
    default: FieldDefault,
    config: FieldConfig,
}

impl MsgPackField {
    pub fn new(name: &str) -> Self {
        Self::from_config(name, FieldConfig::default())
    }

    pub fn from_config(name: &str, config: FieldConfig) -> Self {
        let default = config
            .default
            .clone()
            .map(FieldDefault::Value)
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            codec: Codec::new(config.codec.clone()),
            default,
            config,
        }
    }

    pub fn with_default(mut self, default: impl Into<FieldDefault>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_help_text(mut self, help_text: &str) -> Self {
        self.config.help_text = help_text.to_string();
        self
    }

    /// Route decode warnings to `diagnostics` instead of `tracing`.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.codec = self.codec.with_diagnostics(diagnostics);
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    /// Blank values are always allowed.
    pub fn blank(&self) -> bool {
        true
    }

    pub fn help_text(&self) -> &str {
        &self.config.help_text
    }

    /// Run a form submission through widget, form validation and decoding.
    ///
    /// Blank submissions give `Ok(None)`. Invalid JSON gives `Ok(None)` with a
    /// warning, or an error when the field rejects invalid JSON.
    pub fn value_from_form(
        &self,
        form: &FormField,
        data: &HashMap<String, String>,
    ) -> std::result::Result<Option<Value>, FormError> {
        let cleaned = form.clean(form.value_from_datadict(data))?;
        Ok(cleaned.and_then(|text| self.to_python(RawInput::Text(text))))
    }
}

impl ModelField for MsgPackField {
    fn name(&self) -> &str {
        &self.name
    }

    fn internal_type(&self) -> &'static str {
        "BinaryField"
    }

    fn db_type(&self) -> &'static str {
        "BLOB"
    }

    fn to_python(&self, raw: RawInput) -> Option<Value> {
        self.codec.decode(&raw)
    }

    fn get_prep_value(&self, value: Option<Value>) -> Option<Value> {
        value
    }

    fn get_db_prep_value(&self, value: Option<&Value>) -> Result<Option<Vec<u8>>> {
        Ok(self.codec.encode(value)?)
    }

    fn from_db_value(&self, raw: Option<RawInput>) -> Option<Value> {
        raw.and_then(|raw| self.to_python(raw))
    }

    fn get_default(&self) -> Option<Value> {
        default::normalize(self.default.resolve(), self.config.empty_default_is_null)
    }

    fn value_to_string(&self, value: Option<&Value>) -> Result<String> {
        Ok(json_text::render(value, &self.config.display)?)
    }

    fn formfield(&self, overrides: FormFieldOptions) -> FormField {
        FormField {
            name: self.name.clone(),
            label: overrides.label,
            help_text: overrides
                .help_text
                .unwrap_or_else(|| self.config.help_text.clone()),
            required: overrides.required.unwrap_or(!self.blank()),
            widget: overrides
                .widget
                .unwrap_or_else(|| JsonTextWidget::new(self.config.display.clone())),
            invalid_json: self.config.invalid_json,
        }
    }
}
