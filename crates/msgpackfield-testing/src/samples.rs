//! Shared sample values.

use msgpackfield_types::Value;
use serde_json::json;

/// `{"a": 1}` packed by a reference encoder.
pub const PACKED_A1: &[u8] = &[0x81, 0xa1, b'a', 0x01];

/// A legacy record: a string-typed value whose payload is not UTF-8.
pub const LEGACY_RAW_STR: &[u8] = &[0x81, 0xa1, b'k', 0xa2, 0xc3, 0x28];

/// Byte sequences that are not a single MessagePack value.
pub fn corrupt_inputs() -> Vec<Vec<u8>> {
    vec![
        vec![],
        vec![0xc1],
        vec![0x92, 0x01],
        vec![0xdb, 0xff, 0xff, 0xff, 0xff],
        vec![0x01, 0x02],
        b"not msgpack at all".to_vec(),
    ]
}

/// Text that is not JSON.
pub fn invalid_json_texts() -> Vec<&'static str> {
    vec!["", "{", "{'a': 1}", "[1, 2,]", "undefined"]
}

/// Values representable in both JSON and MessagePack.
pub fn portable_values() -> Vec<Value> {
    vec![
        Value::from(json!(null)),
        Value::from(json!(true)),
        Value::from(json!(0)),
        Value::from(json!(-129)),
        Value::from(json!(18446744073709551615u64)),
        Value::from(json!(3.25)),
        Value::from(json!("")),
        Value::from(json!("snowman ☃")),
        Value::from(json!([])),
        Value::from(json!({})),
        Value::from(json!({"a": 1})),
        Value::from(json!({"x": [1, 2, "y"]})),
        Value::from(json!({"nested": {"list": [{"k": [null, false, -1.5]}], "s": "t"}})),
    ]
}
