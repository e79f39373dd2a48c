use msgpackfield_types::Value;
use std::fmt;
use std::sync::Arc;

/// Default assigned to new rows.
#[derive(Clone, Default)]
pub enum FieldDefault {
    /// No default configured; the host's generic default (an empty string for
    /// a field that allows blanks) applies.
    #[default]
    NotProvided,
    /// Static default, used verbatim.
    Value(Value),
    /// Called each time a default is needed.
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    pub fn factory(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        FieldDefault::Factory(Arc::new(f))
    }

    pub fn has_default(&self) -> bool {
        !matches!(self, FieldDefault::NotProvided)
    }

    /// Resolve before normalization.
    pub(crate) fn resolve(&self) -> Value {
        match self {
            FieldDefault::NotProvided => Value::String(String::new()),
            FieldDefault::Value(value) => value.clone(),
            FieldDefault::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::NotProvided => write!(f, "NotProvided"),
            FieldDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FieldDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

impl From<Value> for FieldDefault {
    fn from(value: Value) -> Self {
        FieldDefault::Value(value)
    }
}

/// Apply empty-string normalization to a resolved default.
pub(crate) fn normalize(value: Value, empty_is_null: bool) -> Option<Value> {
    match value {
        Value::String(s) if empty_is_null && s.is_empty() => None,
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_provided_resolves_to_empty_string() {
        let default = FieldDefault::default();
        assert!(!default.has_default());
        assert_eq!(default.resolve(), Value::from(""));
        assert_eq!(normalize(default.resolve(), true), None);
        assert_eq!(normalize(default.resolve(), false), Some(Value::from("")));
    }

    #[test]
    fn test_factory_is_called_each_time() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let counter = Arc::new(AtomicU64::new(0));
        let c = counter.clone();
        let default = FieldDefault::factory(move || Value::UInt(c.fetch_add(1, Ordering::SeqCst)));

        assert_eq!(default.resolve(), Value::UInt(0));
        assert_eq!(default.resolve(), Value::UInt(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_non_string_values_are_not_normalized() {
        assert_eq!(normalize(Value::Nil, true), Some(Value::Nil));
        assert_eq!(normalize(Value::from("x"), true), Some(Value::from("x")));
    }
}
