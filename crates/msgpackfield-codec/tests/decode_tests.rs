use msgpackfield_codec::{BinaryMode, Codec, CodecOptions, DecodeStrategy, DisplayOptions, json_text};
use msgpackfield_testing::assertions::{assert_round_trip, assert_warnings};
use msgpackfield_testing::{RecordingDiagnostics, samples};
use msgpackfield_types::{InputKind, RawInput, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[test]
fn test_portable_values_round_trip() -> anyhow::Result<()> {
    let (codec, recorder) = RecordingDiagnostics::codec(CodecOptions::default());

    for value in samples::portable_values() {
        assert_round_trip(&codec, &value)?;
    }

    assert_eq!(recorder.count(), 0);
    Ok(())
}

#[test]
fn test_packed_reference_map() {
    let codec = Codec::default();
    let value = codec.decode(&RawInput::from(samples::PACKED_A1));
    assert_eq!(value, Some(Value::from(json!({"a": 1}))));
}

#[test]
fn test_corrupt_bytes_yield_none_with_one_warning_each() -> anyhow::Result<()> {
    let (codec, recorder) = RecordingDiagnostics::codec(CodecOptions::default());
    let inputs = samples::corrupt_inputs();

    for bytes in &inputs {
        assert_eq!(codec.decode(&RawInput::Binary(bytes.clone())), None);
    }

    assert_warnings(&recorder, InputKind::Binary, inputs.len())?;
    for failure in recorder.failures() {
        let strategies: Vec<_> = failure.attempts.iter().map(|a| a.strategy).collect();
        assert_eq!(
            strategies,
            vec![
                DecodeStrategy::MsgPack(BinaryMode::Utf8),
                DecodeStrategy::MsgPack(BinaryMode::Raw)
            ]
        );
    }
    Ok(())
}

#[test]
fn test_invalid_json_yields_none_with_one_warning_each() -> anyhow::Result<()> {
    let (codec, recorder) = RecordingDiagnostics::codec(CodecOptions::default());
    let texts = samples::invalid_json_texts();

    for text in &texts {
        assert_eq!(codec.decode(&RawInput::from(*text)), None);
    }

    assert_warnings(&recorder, InputKind::Text, texts.len())
}

#[test]
fn test_legacy_string_payload_falls_back_to_raw() {
    let (codec, recorder) = RecordingDiagnostics::codec(CodecOptions::default());

    let value = codec.decode(&RawInput::from(samples::LEGACY_RAW_STR));
    assert_eq!(
        value,
        Some(Value::Map(vec![(
            Value::Bytes(b"k".to_vec()),
            Value::Bytes(vec![0xc3, 0x28])
        )]))
    );
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_legacy_encoder_writes_bytes_as_strings() {
    let legacy = Codec::new(CodecOptions {
        use_bin_type: false,
        ..CodecOptions::default()
    });
    let (reader, recorder) = RecordingDiagnostics::codec(CodecOptions::default());

    let packed = legacy.pack(&Value::Bytes(b"plain text".to_vec())).unwrap();
    assert_eq!(packed[0], 0xaa);
    assert_eq!(
        reader.decode(&RawInput::Binary(packed)),
        Some(Value::from("plain text"))
    );

    let packed = legacy.pack(&Value::Bytes(vec![0xc3, 0x28])).unwrap();
    assert_eq!(
        reader.decode(&RawInput::Binary(packed)),
        Some(Value::Bytes(vec![0xc3, 0x28]))
    );

    let modern = Codec::default().pack(&Value::Bytes(b"plain text".to_vec())).unwrap();
    assert_eq!(modern[0], 0xc4);
    assert_eq!(
        reader.decode(&RawInput::Binary(modern)),
        Some(Value::Bytes(b"plain text".to_vec()))
    );
    assert_eq!(recorder.count(), 0);
}

#[test]
fn test_repeated_keys_read_and_display_the_same_value() {
    let codec = Codec::default();
    let packed = RawInput::Binary(vec![0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02]);
    let text = RawInput::from(r#"{"a": 1, "a": 2}"#);

    for input in [packed, text] {
        let value = codec.decode(&input).unwrap();
        assert_eq!(value.get("a"), Some(&Value::UInt(2)));
        assert_eq!(value, Value::from(json!({"a": 2})));
        assert_eq!(
            json_text::render(Some(&value), &DisplayOptions::default()).unwrap(),
            "{\n\t\"a\": 2\n}"
        );
    }
}

#[test]
fn test_json_text_decodes_to_same_value_as_packed() {
    let codec = Codec::default();
    let from_text = codec.decode(&RawInput::from(r#"{"x": [1, 2, "y"]}"#));
    let packed = codec.pack(&Value::from(json!({"x": [1, 2, "y"]}))).unwrap();
    let from_bytes = codec.decode(&RawInput::Binary(packed));

    assert!(from_text.is_some());
    assert_eq!(from_text, from_bytes);
}

#[test]
fn test_decoding_is_repeatable() {
    let codec = Codec::default();
    let input = RawInput::from(samples::PACKED_A1);
    assert_eq!(codec.decode(&input), codec.decode(&input));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    tags: Vec<String>,
    score: Option<f64>,
}

#[test]
fn test_serializable_structs_pack_as_maps() {
    let codec = Codec::default();
    let profile = Profile {
        name: "ada".to_string(),
        tags: vec!["admin".to_string()],
        score: Some(9.5),
    };

    let packed = codec.encode_serializable(&profile).unwrap();
    let value = codec.decode(&RawInput::Binary(packed.clone())).unwrap();
    assert_eq!(value.get("name"), Some(&Value::from("ada")));

    let typed: Option<Profile> = codec.decode_into(&packed);
    assert_eq!(typed, Some(profile));
}

#[test]
fn test_decode_into_wrong_shape_warns() {
    let (codec, recorder) = RecordingDiagnostics::codec(CodecOptions::default());

    let typed: Option<Profile> = codec.decode_into(samples::PACKED_A1);
    assert!(typed.is_none());

    let failures = recorder.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].attempts[0].strategy, DecodeStrategy::Typed);
}

#[test]
fn test_options_load_from_toml() {
    let options: CodecOptions = toml::from_str(
        r#"
        binary_modes = ["raw"]
        max_depth = 16
        "#,
    )
    .unwrap();

    assert_eq!(options.binary_modes, vec![BinaryMode::Raw]);
    assert_eq!(options.max_depth, 16);
    assert!(options.use_bin_type);
}
