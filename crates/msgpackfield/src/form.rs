use msgpackfield_types::Value;
use std::collections::HashMap;
use std::fmt;

use crate::config::InvalidJsonPolicy;
use crate::widget::JsonTextWidget;

/// Form validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A required field was left empty
    Required(String),

    /// Submitted text is not JSON (only under [`InvalidJsonPolicy::Reject`])
    InvalidJson { field: String, message: String },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Required(field) => write!(f, "{}: This field is required.", field),
            FormError::InvalidJson { field, message } => {
                write!(f, "{}: Enter valid JSON ({}).", field, message)
            }
        }
    }
}

impl std::error::Error for FormError {}

/// Caller overrides applied on top of the field's own form settings.
#[derive(Debug, Clone, Default)]
pub struct FormFieldOptions {
    pub label: Option<String>,
    pub help_text: Option<String>,
    pub required: Option<bool>,
    pub widget: Option<JsonTextWidget>,
}

/// Free-text form field produced by [`crate::ModelField::formfield`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: Option<String>,
    pub help_text: String,
    pub required: bool,
    pub widget: JsonTextWidget,
    pub invalid_json: InvalidJsonPolicy,
}

impl FormField {
    /// Submitted text from the request data.
    pub fn value_from_datadict(&self, data: &HashMap<String, String>) -> Option<String> {
        self.widget.value_from_datadict(data, &self.name)
    }

    /// Validate submitted text.
    ///
    /// Surrounding whitespace is stripped and an empty submission becomes
    /// `None`. JSON is only checked here under [`InvalidJsonPolicy::Reject`];
    /// otherwise the text passes through for the field to decode.
    pub fn clean(&self, submitted: Option<String>) -> Result<Option<String>, FormError> {
        let text = submitted.map(|s| s.trim().to_string()).unwrap_or_default();

        if text.is_empty() {
            if self.required {
                return Err(FormError::Required(self.name.clone()));
            }
            return Ok(None);
        }

        if self.invalid_json == InvalidJsonPolicy::Reject
            && let Err(err) = serde_json::from_str::<serde::de::IgnoredAny>(&text)
        {
            return Err(FormError::InvalidJson {
                field: self.name.clone(),
                message: err.to_string(),
            });
        }

        Ok(Some(text))
    }

    /// Render the widget for the current value.
    pub fn render(&self, value: Option<&Value>) -> msgpackfield_codec::Result<String> {
        self.widget.render(&self.name, value)
    }
}
