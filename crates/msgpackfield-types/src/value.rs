use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use crate::{Error, Result};

/// Native structure held by a packed column.
///
/// Covers the intersection of the JSON and MessagePack data models plus the
/// MessagePack-only shapes (`Bytes`, `Ext`, non-string map keys) that data
/// written by other encoders may contain.
///
/// Maps keep their insertion order, but equality ignores it: two maps are
/// equal when they hold the same entries. A key repeated in a hand-built map
/// counts once, with its last value, the same as [`MapBuilder`] would keep it.
/// Array order is significant.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// Signed integer. Decoders produce this for negative values only.
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// MessagePack extension: type tag and payload.
    Ext(i8, Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a string key in a map value. The last entry wins if the key
    /// repeats.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .rev()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Short type name used in diagnostics and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Ext(..) => "ext",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Convert to a JSON document.
    ///
    /// Scalar map keys are stringified the way a standard JSON encoder does
    /// (`1`, `true`, `null`). Bytes, extension values, non-finite floats and
    /// compound keys have no JSON form and are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::UInt(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| Error::NotJsonRepresentable(format!("float {}", f)))?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(_) | Value::Ext(..) => {
                return Err(Error::NotJsonRepresentable(self.type_name().to_string()));
            }
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(entries) => {
                let mut map = serde_json::Map::with_capacity(entries.len());
                for (k, v) in entries {
                    map.insert(json_key(k)?, v.to_json()?);
                }
                serde_json::Value::Object(map)
            }
        })
    }
}

fn json_key(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Nil => Ok("null".to_string()),
        Value::Int(n) => Ok(n.to_string()),
        Value::UInt(n) => Ok(n.to_string()),
        Value::Float(f) if f.is_finite() => Ok(float_repr(*f)),
        Value::Float(f) => Err(Error::NotJsonRepresentable(format!("map key {}", f))),
        other => Err(Error::NotJsonRepresentable(format!(
            "map key of type {}",
            other.type_name()
        ))),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::UInt(b)) | (Value::UInt(b), Value::Int(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Ext(ta, a), Value::Ext(tb, b)) => ta == tb && a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                let a = last_entries(a);
                let b = last_entries(b);
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            _ => false,
        }
    }
}

/// One entry per distinct key, holding the key's last value.
fn last_entries(entries: &[(Value, Value)]) -> Vec<(&Value, &Value)> {
    let mut out: Vec<(&Value, &Value)> = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        match out.iter_mut().find(|(seen, _)| *seen == k) {
            Some(entry) => entry.1 = v,
            None => out.push((k, v)),
        }
    }
    out
}

/// Collects map entries as they are decoded.
///
/// A repeated key keeps the position of its first occurrence and takes the
/// value of its last one.
#[derive(Debug, Default)]
pub struct MapBuilder {
    entries: Vec<(Value, Value)>,
    string_keys: HashMap<String, usize>,
}

impl MapBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            string_keys: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, key: Value, value: Value) {
        let existing = match &key {
            Value::String(s) => self.string_keys.get(s).copied(),
            other => self.entries.iter().position(|(k, _)| k == other),
        };

        match existing {
            Some(index) => self.entries[index].1 = value,
            None => {
                if let Value::String(s) = &key {
                    self.string_keys.insert(s.clone(), self.entries.len());
                }
                self.entries.push((key, value));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Value {
        Value::Map(self.entries)
    }
}

/// Float text in the shortest round-trip form, with an exponent for
/// magnitudes below `1e-4` or from `1e16` up (`1e+16`, `1.5e-07`).
/// Non-finite values give `NaN`, `Infinity` and `-Infinity`.
pub fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f == f64::INFINITY {
        return "Infinity".to_string();
    }
    if f == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }

    let scientific = format!("{:e}", f);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let fixed = f.to_string();
        if fixed.contains('.') {
            fixed
        } else {
            format!("{}.0", fixed)
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

impl fmt::Display for Value {
    /// Compact JSON when representable, debug form otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::UInt(n) => serializer.serialize_u64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Ext(tag, data) => (tag, RawBytes(data)).serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct RawBytes<'a>(&'a [u8]);

impl Serialize for RawBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_bytes(self.0)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON or MessagePack value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Value, E> {
        if v >= 0 {
            Ok(Value::UInt(v as u64))
        } else {
            Ok(Value::Int(v))
        }
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Value, E> {
        Ok(Value::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Value, D::Error> {
        Value::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Value, A::Error> {
        let mut entries = MapBuilder::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((k, v)) = map.next_entry()? {
            entries.insert(k, v);
        }
        Ok(entries.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_equality_ignores_key_order() {
        let a = Value::Map(vec![("a".into(), 1i64.into()), ("b".into(), 2i64.into())]);
        let b = Value::Map(vec![("b".into(), 2i64.into()), ("a".into(), 1i64.into())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_map_equality_is_symmetric_with_repeated_keys() {
        let repeated = Value::Map(vec![
            ("a".into(), 1i64.into()),
            ("a".into(), 1i64.into()),
            ("b".into(), 2i64.into()),
        ]);
        let distinct = Value::Map(vec![
            ("a".into(), 1i64.into()),
            ("b".into(), 2i64.into()),
            ("c".into(), 3i64.into()),
        ]);
        assert_ne!(repeated, distinct);
        assert_ne!(distinct, repeated);

        let last_wins = Value::Map(vec![("a".into(), 1i64.into()), ("a".into(), 2i64.into())]);
        let single = Value::Map(vec![("a".into(), 2i64.into())]);
        assert_eq!(last_wins, single);
        assert_eq!(single, last_wins);
        assert_eq!(last_wins.get("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_map_builder_last_value_wins() {
        let mut builder = MapBuilder::default();
        builder.insert("a".into(), Value::UInt(1));
        builder.insert(Value::UInt(7), Value::Nil);
        builder.insert("b".into(), Value::UInt(2));
        builder.insert("a".into(), Value::UInt(3));
        builder.insert(Value::Int(7), Value::Bool(true));
        assert_eq!(builder.len(), 3);

        let value = builder.finish();
        assert_eq!(
            value.as_map(),
            Some(
                &[
                    ("a".into(), Value::UInt(3)),
                    (Value::UInt(7), Value::Bool(true)),
                    ("b".into(), Value::UInt(2)),
                ][..]
            )
        );
    }

    #[test]
    fn test_json_text_repeated_key_last_wins() {
        let value: Value = serde_json::from_str(r#"{"a": 1, "b": 0, "a": 2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::UInt(2)));
        assert_eq!(value.as_map().map(|m| m.len()), Some(2));
        assert_eq!(value.to_string(), r#"{"a":2,"b":0}"#);
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(1e-5), "1e-05");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(2.5), "2.5");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_array_equality_respects_order() {
        let a = Value::Array(vec![1i64.into(), 2i64.into()]);
        let b = Value::Array(vec![2i64.into(), 1i64.into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signed_and_unsigned_compare_by_value() {
        assert_eq!(Value::Int(5), Value::UInt(5));
        assert_ne!(Value::Int(-1), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_from_json_preserves_structure() {
        let value = Value::from(json!({"x": [1, 2, "y"], "neg": -3, "f": 1.5, "n": null}));
        assert_eq!(value.get("neg"), Some(&Value::Int(-3)));
        assert_eq!(value.get("f"), Some(&Value::Float(1.5)));
        assert_eq!(value.get("n"), Some(&Value::Nil));
        assert_eq!(
            value.get("x").and_then(Value::as_array).map(|a| a.len()),
            Some(3)
        );
    }

    #[test]
    fn test_to_json_stringifies_scalar_keys() {
        let value = Value::Map(vec![
            (Value::UInt(1), "one".into()),
            (Value::Bool(true), "yes".into()),
            (Value::Nil, "none".into()),
        ]);
        let json = value.to_json().unwrap();
        assert_eq!(json, json!({"1": "one", "true": "yes", "null": "none"}));
    }

    #[test]
    fn test_to_json_rejects_bytes_and_compound_keys() {
        assert!(Value::Bytes(vec![1, 2]).to_json().is_err());
        assert!(Value::Ext(3, vec![]).to_json().is_err());
        assert!(Value::Float(f64::NAN).to_json().is_err());

        let compound = Value::Map(vec![(Value::Array(vec![]), Value::Nil)]);
        assert!(compound.to_json().is_err());
    }

    #[test]
    fn test_deserialize_from_json_text() {
        let value: Value = serde_json::from_str(r#"{"b": [true, -1, 2.5]}"#).unwrap();
        assert_eq!(
            value,
            Value::Map(vec![(
                "b".into(),
                Value::Array(vec![true.into(), Value::Int(-1), 2.5.into()])
            )])
        );
    }

    #[test]
    fn test_display_falls_back_to_debug() {
        assert_eq!(Value::from(json!({"a": 1})).to_string(), r#"{"a":1}"#);
        assert_eq!(Value::Bytes(vec![7]).to_string(), "Bytes([7])");
    }
}
