use msgpackfield_types::*;

#[test]
fn test_raw_input_kind_follows_source_type() {
    assert_eq!(RawInput::from("{}").kind(), InputKind::Text);
    assert_eq!(RawInput::from(vec![0x80u8]).kind(), InputKind::Binary);
    assert_eq!(RawInput::from(&b"\xc0"[..]).kind(), InputKind::Binary);
}

#[test]
fn test_raw_input_len() {
    assert!(RawInput::from("").is_empty());
    assert_eq!(RawInput::from("héllo").len(), 6);
    assert_eq!(RawInput::Binary(vec![1, 2, 3]).len(), 3);
}

#[test]
fn test_input_kind_display() {
    assert_eq!(InputKind::Text.to_string(), "text");
    assert_eq!(InputKind::Binary.to_string(), "binary");
}
