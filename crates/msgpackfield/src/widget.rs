use msgpackfield_codec::{DisplayOptions, json_text};
use msgpackfield_types::Value;
use std::collections::HashMap;

/// Text area that shows a packed value as formatted JSON.
///
/// Display is eager (the value is rendered to JSON text up front); input is
/// lazy (the submitted text is handed back unchanged and parsed later by the
/// field).
#[derive(Debug, Clone, PartialEq)]
pub struct JsonTextWidget {
    /// HTML attributes in render order.
    pub attrs: Vec<(String, String)>,
    pub display: DisplayOptions,
}

impl Default for JsonTextWidget {
    fn default() -> Self {
        Self::new(DisplayOptions::default())
    }
}

impl JsonTextWidget {
    pub fn new(display: DisplayOptions) -> Self {
        Self {
            attrs: vec![
                ("cols".to_string(), "40".to_string()),
                ("rows".to_string(), "10".to_string()),
            ],
            display,
        }
    }

    /// Set an attribute, replacing an existing one with the same name.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// JSON text shown inside the text area.
    pub fn format_value(&self, value: Option<&Value>) -> msgpackfield_codec::Result<String> {
        json_text::render(value, &self.display)
    }

    /// Render the `<textarea>` element.
    ///
    /// # Errors
    /// Values without a JSON form (bytes, ext, non-finite floats) cannot be
    /// displayed.
    pub fn render(&self, name: &str, value: Option<&Value>) -> msgpackfield_codec::Result<String> {
        let text = self.format_value(value)?;

        let mut html = format!("<textarea name=\"{}\"", escape(name));
        for (attr, val) in &self.attrs {
            html.push_str(&format!(" {}=\"{}\"", attr, escape(val)));
        }
        html.push_str(">\n");
        html.push_str(&escape(&text));
        html.push_str("</textarea>");
        Ok(html)
    }

    /// Submitted text for `name`, unchanged.
    pub fn value_from_datadict(&self, data: &HashMap<String, String>, name: &str) -> Option<String> {
        data.get(name).cloned()
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
