//! Value Codec Tests
//!
//! Tests for typed values and their encoding tags.

use redikv::protocol::{Encoding, Primitive, Value};
use redikv::RediError;

fn json_object(text: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(text).unwrap() {
        serde_json::Value::Object(map) => Value::Json(map),
        other => panic!("Expected JSON object, got {}", other),
    }
}

fn round_trip(value: &Value) -> Value {
    let (bytes, encoding) = value.encode();
    Value::decode(&bytes, encoding).unwrap()
}

// =============================================================================
// Encoding Tag Tests
// =============================================================================

#[test]
fn test_encoding_tags() {
    assert_eq!(Encoding::String.tag(), 0);
    assert_eq!(Encoding::Array.tag(), 1);
    assert_eq!(Encoding::Number.tag(), 2);
    assert_eq!(Encoding::Json.tag(), 3);

    for tag in 0..4 {
        assert_eq!(Encoding::from_tag(tag).unwrap().tag(), tag);
    }
    assert_eq!(Encoding::from_tag(4), None);
    assert_eq!(Encoding::from_tag(u32::MAX), None);
}

#[test]
fn test_encoding_parses_names_and_tags() {
    assert_eq!("array".parse::<Encoding>().unwrap(), Encoding::Array);
    assert_eq!("3".parse::<Encoding>().unwrap(), Encoding::Json);
    assert!("yaml".parse::<Encoding>().is_err());
}

#[test]
fn test_encode_infers_tag_from_shape() {
    assert_eq!(Value::from("text").encode().1, Encoding::String);
    assert_eq!(Value::from(1.5).encode().1, Encoding::Number);
    assert_eq!(Value::Array(vec![]).encode().1, Encoding::Array);
    assert_eq!(json_object("{}").encode().1, Encoding::Json);
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_string_round_trip() {
    for text in ["", "hello", "multi word value", "ünïcødé ✓"] {
        let value = Value::from(text);
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_array_round_trip() {
    let value = Value::Array(vec![
        Primitive::from("product 1"),
        Primitive::from("product 2"),
    ]);
    assert_eq!(round_trip(&value), value);

    let mixed = Value::Array(vec![
        Primitive::from("a"),
        Primitive::from(1.5),
        Primitive::Bool(true),
        Primitive::Null,
    ]);
    assert_eq!(round_trip(&mixed), mixed);
}

#[test]
fn test_number_round_trip() {
    for n in [42.0, -3.5, 0.1, 0.0, 1e21, 1e-7, f64::MAX] {
        let value = Value::from(n);
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_json_round_trip() {
    let value = json_object(r#"{"name":"widget","tags":[1,2],"nested":{"ok":null}}"#);
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_number_renders_without_fraction() {
    let (bytes, _) = Value::from(42.0).encode();
    assert_eq!(bytes, b"42");
}

// =============================================================================
// Decode Tests
// =============================================================================

#[test]
fn test_decode_array_of_strings() {
    let value = Value::decode(br#"["product 1","product 2"]"#, Encoding::Array).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Primitive::from("product 1"), Primitive::from("product 2")])
    );
}

#[test]
fn test_decode_number_trims_whitespace() {
    assert_eq!(
        Value::decode(b" 42 ", Encoding::Number).unwrap(),
        Value::Number(42.0)
    );
}

#[test]
fn test_decode_unknown_tag_fails() {
    let result = Value::decode_tagged(b"anything", 7);
    assert!(matches!(result, Err(RediError::Decode(_))));
}

#[test]
fn test_decode_invalid_payloads_fail() {
    let cases: [(&[u8], Encoding); 9] = [
        (&[0xFF, 0xFE], Encoding::String),
        (b"not json", Encoding::Array),
        (br#"{"a":1}"#, Encoding::Array),
        (b"[[1,2]]", Encoding::Array),
        (b"abc", Encoding::Number),
        (b"", Encoding::Number),
        (b"NaN", Encoding::Number),
        (b"inf", Encoding::Number),
        (b"[1,2]", Encoding::Json),
    ];

    for (bytes, encoding) in cases {
        let result = Value::decode(bytes, encoding);
        assert!(
            matches!(result, Err(RediError::Decode(_))),
            "{:?} under {} should fail",
            String::from_utf8_lossy(bytes),
            encoding
        );
    }
}

// =============================================================================
// Inference Tests
// =============================================================================

#[test]
fn test_infer_reads_json_shapes() {
    assert_eq!(Value::infer("42"), Value::Number(42.0));
    assert_eq!(Value::infer("\"42\""), Value::from("42"));
    assert_eq!(
        Value::infer(r#"["a","b"]"#),
        Value::Array(vec![Primitive::from("a"), Primitive::from("b")])
    );
    assert_eq!(Value::infer(r#"{"a":1}"#), json_object(r#"{"a":1}"#));
}

#[test]
fn test_infer_falls_back_to_text() {
    assert_eq!(Value::infer("hello world"), Value::from("hello world"));
    // Booleans have no encoding of their own
    assert_eq!(Value::infer("true"), Value::from("true"));
}

#[test]
fn test_display() {
    assert_eq!(Value::from("plain").to_string(), "plain");
    assert_eq!(Value::from(42.0).to_string(), "42");
    assert_eq!(
        Value::Array(vec![Primitive::from("a"), Primitive::from(2.0)]).to_string(),
        r#"["a",2]"#
    );
}

#[test]
fn test_array_numbers_render_like_number_values() {
    let value = Value::decode(b"[1,2,-7,2.5]", Encoding::Array).unwrap();
    let (bytes, _) = value.encode();
    assert_eq!(bytes, b"[1,2,-7,2.5]");

    // Beyond 2^53 whole floats keep their float form
    let (bytes, _) = Value::Array(vec![Primitive::from(1e300)]).encode();
    assert_eq!(bytes, b"[1e300]");
}
