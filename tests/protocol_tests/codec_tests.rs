//! Codec Tests
//!
//! Tests for request frame decoding and response encoding.

use std::io::Cursor;

use redikv::protocol::{
    decode_request, decode_response, encode_command, encode_frame, encode_response,
    read_request, read_response, write_response, Command, CommandKind, ErrorCode, Payload,
    Primitive, Response, Status, Value, ValueFraming,
};
use redikv::RediError;

fn segment(bytes: &[u8]) -> Vec<u8> {
    let mut out = (bytes.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(bytes);
    out
}

fn set_data(key: &str, value: &[u8], tag: u32) -> Vec<u8> {
    let mut data = segment(key.as_bytes());
    data.extend(segment(value));
    data.extend_from_slice(&tag.to_be_bytes());
    data
}

/// Overwrite the total-length prefix of a frame
fn with_total_len(mut frame: Vec<u8>, total_len: u32) -> Vec<u8> {
    frame[..4].copy_from_slice(&total_len.to_be_bytes());
    frame
}

// =============================================================================
// Request Decoding Tests
// =============================================================================

#[test]
fn test_decode_ping() {
    let request = decode_request(&encode_frame(b"ping", Some(&b"alive?"[..])));
    assert!(request.valid);
    assert_eq!(request.cmd, CommandKind::Ping);
    assert!(request.errors.is_empty());
}

#[test]
fn test_decode_ping_without_data() {
    let request = decode_request(&encode_frame(b"ping", None));
    assert!(request.valid);
    assert_eq!(request.cmd, CommandKind::Ping);
}

#[test]
fn test_decode_keys_ignores_data() {
    let request = decode_request(&encode_frame(b"keys", Some(&b"whatever"[..])));
    assert!(request.valid);
    assert_eq!(request.cmd, CommandKind::Keys);
    assert_eq!(request.key, None);
}

#[test]
fn test_decode_unknown_command() {
    let request = decode_request(&encode_frame(b"pin", Some(&b"alive?"[..])));
    assert!(!request.valid);
    assert_eq!(request.cmd, CommandKind::Unknown);
    assert_eq!(request.errors, vec![ErrorCode::CmdInvalid]);
}

#[test]
fn test_decode_command_is_case_sensitive() {
    let request = decode_request(&encode_frame(b"GET", Some(segment(b"k").as_slice())));
    assert_eq!(request.errors, vec![ErrorCode::CmdInvalid]);
}

#[test]
fn test_decode_empty_command() {
    let request = decode_request(&encode_frame(b"", None));
    assert!(!request.valid);
    assert_eq!(request.cmd, CommandKind::Unknown);
    assert!(request.has_error(ErrorCode::CmdInvalid));
}

#[test]
fn test_decode_get() {
    let request = decode_request(&encode_frame(b"get", Some(segment(b"products").as_slice())));
    assert!(request.valid);
    assert_eq!(request.cmd, CommandKind::Get);
    assert_eq!(request.key.as_deref(), Some("products"));
    assert_eq!(request.value, None);
}

#[test]
fn test_decode_set_array() {
    let data = set_data("products", br#"["product 1","product 2"]"#, 1);
    let request = decode_request(&encode_frame(b"set", Some(data.as_slice())));

    assert!(request.valid, "errors: {}", request.error_summary());
    assert_eq!(request.key.as_deref(), Some("products"));
    assert_eq!(
        request.value,
        Some(Value::Array(vec![
            Primitive::from("product 1"),
            Primitive::from("product 2"),
        ]))
    );
    assert_eq!(
        request.to_command(),
        Some(Command::Set {
            key: "products".to_string(),
            value: Value::Array(vec![
                Primitive::from("product 1"),
                Primitive::from("product 2"),
            ]),
        })
    );
}

#[test]
fn test_decode_set_unknown_tag() {
    let data = set_data("k", b"v", 9);
    let request = decode_request(&encode_frame(b"set", Some(data.as_slice())));
    assert!(!request.valid);
    assert_eq!(request.cmd, CommandKind::Set);
    assert_eq!(request.errors, vec![ErrorCode::DataInvalid]);
}

#[test]
fn test_decode_set_value_not_matching_tag() {
    let data = set_data("n", b"abc", 2);
    let request = decode_request(&encode_frame(b"set", Some(data.as_slice())));
    assert!(!request.valid);
    assert_eq!(request.errors, vec![ErrorCode::DataInvalid]);
    assert_eq!(request.to_command(), None);
}

#[test]
fn test_decode_get_without_data() {
    let request = decode_request(&encode_frame(b"get", None));
    assert!(!request.valid);
    assert_eq!(request.errors, vec![ErrorCode::DataInvalid]);
}

#[test]
fn test_decode_delete_with_extra_bytes_after_key() {
    let mut data = segment(b"k");
    data.push(0x01);
    let request = decode_request(&encode_frame(b"delete", Some(data.as_slice())));
    assert!(!request.valid);
    assert_eq!(request.errors, vec![ErrorCode::DataInvalid]);
}

#[test]
fn test_decode_key_not_utf8() {
    let request = decode_request(&encode_frame(b"get", Some(segment(&[0xC3, 0x28]).as_slice())));
    assert!(!request.valid);
    assert!(request.has_error(ErrorCode::DataInvalid));
}

// =============================================================================
// Structural Failure Tests
// =============================================================================

#[test]
fn test_decode_buffer_shorter_than_prefix() {
    let request = decode_request(&[0x00, 0x00]);
    assert!(!request.valid);
    assert!(request.has_error(ErrorCode::FrameTruncated));
}

#[test]
fn test_decode_total_len_smaller_than_prefix() {
    let request = decode_request(&[0x00, 0x00, 0x00, 0x02, 0xAA, 0xBB]);
    assert!(!request.valid);
    assert!(request.has_error(ErrorCode::FrameMalformed));
}

#[test]
fn test_decode_total_len_past_buffer() {
    let frame = with_total_len(encode_frame(b"ping", None), 100);
    let request = decode_request(&frame);
    assert!(!request.valid);
    assert!(request.has_error(ErrorCode::FrameTruncated));
}

#[test]
fn test_decode_cmd_len_past_frame() {
    let mut frame = encode_frame(b"ping", None);
    frame[4..8].copy_from_slice(&50u32.to_be_bytes());
    let request = decode_request(&frame);
    assert!(!request.valid);
    assert!(request.has_error(ErrorCode::FrameTruncated));
}

#[test]
fn test_decode_data_len_past_frame() {
    let mut frame = encode_frame(b"get", Some(segment(b"key").as_slice()));
    // cmd segment is 4 + 3 bytes, data length follows
    frame[11..15].copy_from_slice(&200u32.to_be_bytes());
    let request = decode_request(&frame);

    assert!(!request.valid);
    assert_eq!(request.cmd, CommandKind::Get);
    assert_eq!(
        request.errors,
        vec![ErrorCode::DataInvalid, ErrorCode::FrameTruncated]
    );
}

#[test]
fn test_decode_key_len_past_data() {
    let mut data = 50u32.to_be_bytes().to_vec();
    data.push(b'k');
    let request = decode_request(&encode_frame(b"get", Some(data.as_slice())));

    assert!(!request.valid);
    assert_eq!(
        request.errors,
        vec![ErrorCode::DataInvalid, ErrorCode::FrameTruncated]
    );
}

#[test]
fn test_decode_ping_payload_overrun() {
    let mut frame = encode_frame(b"ping", Some(&b"alive?"[..]));
    frame[12..16].copy_from_slice(&99u32.to_be_bytes());
    let request = decode_request(&frame);
    assert!(!request.valid);
    assert_eq!(request.errors, vec![ErrorCode::FrameTruncated]);
}

#[test]
fn test_decode_trailing_bytes_inside_frame() {
    let mut frame = encode_frame(b"ping", Some(&b"alive?"[..]));
    frame.extend_from_slice(b"xyz");
    let total_len = frame.len() as u32;
    let request = decode_request(&with_total_len(frame, total_len));
    assert!(!request.valid);
    assert_eq!(request.errors, vec![ErrorCode::FrameMalformed]);
}

#[test]
fn test_decode_ignores_bytes_after_frame() {
    let mut buf = encode_frame(b"ping", Some(&b"alive?"[..]));
    buf.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    let request = decode_request(&buf);
    assert!(request.valid);
}

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_wire_format_ping() {
    let frame = encode_frame(b"ping", Some(&b"alive?"[..]));

    // [total 22][cmd_len 4][ping][data_len 6][alive?]
    assert_eq!(frame.len(), 22);
    assert_eq!(&frame[0..4], &[0x00, 0x00, 0x00, 0x16]);
    assert_eq!(&frame[4..8], &[0x00, 0x00, 0x00, 0x04]);
    assert_eq!(&frame[8..12], b"ping");
    assert_eq!(&frame[12..16], &[0x00, 0x00, 0x00, 0x06]);
    assert_eq!(&frame[16..22], b"alive?");
}

#[test]
fn test_wire_format_set() {
    let frame = encode_command(&Command::Set {
        key: "n".to_string(),
        value: Value::from(42.0),
    });

    let mut expected = Vec::new();
    expected.extend_from_slice(&30u32.to_be_bytes());
    expected.extend(segment(b"set"));
    expected.extend(segment(&set_data("n", b"42", 2)));
    assert_eq!(frame, expected);
}

#[test]
fn test_encoded_commands_decode_to_themselves() {
    let commands = vec![
        Command::Get {
            key: "a".to_string(),
        },
        Command::Set {
            key: "doc".to_string(),
            value: Value::infer(r#"{"id":7}"#),
        },
        Command::Delete {
            key: "a".to_string(),
        },
        Command::Keys,
        Command::Ping {
            payload: Vec::new(),
        },
    ];

    for command in commands {
        let request = decode_request(&encode_command(&command));
        assert!(request.valid, "{:?}: {}", command, request.error_summary());
        assert_eq!(request.to_command(), Some(command));
    }
}

// =============================================================================
// Response Encoding Tests
// =============================================================================

#[test]
fn test_wire_format_status_only() {
    assert_eq!(
        encode_response(&Response::ok(), ValueFraming::LengthPrefixed),
        vec![0x00, 0x00, 0x00, 0xC8]
    );
    assert_eq!(
        encode_response(&Response::not_found(), ValueFraming::LengthPrefixed),
        vec![0x00, 0x00, 0x01, 0x90]
    );
    assert_eq!(
        encode_response(&Response::error(), ValueFraming::Legacy),
        vec![0x00, 0x00, 0x01, 0xF4]
    );
}

#[test]
fn test_wire_format_get_hit() {
    let response = Response::value(Value::from("hi"));

    assert_eq!(
        encode_response(&response, ValueFraming::LengthPrefixed),
        vec![0, 0, 0, 200, 0, 0, 0, 0, 0, 0, 0, 2, b'h', b'i']
    );
    assert_eq!(
        encode_response(&response, ValueFraming::Legacy),
        vec![0, 0, 0, 200, 0, 0, 0, 0, b'h', b'i']
    );
}

#[test]
fn test_wire_format_keys() {
    let response = Response::keys(vec!["a".to_string(), "bc".to_string()]);
    assert_eq!(
        encode_response(&response, ValueFraming::LengthPrefixed),
        vec![0, 0, 0, 200, 0, 0, 0, 2, 0, 0, 0, 1, b'a', 0, 0, 0, 2, b'b', b'c']
    );
}

// =============================================================================
// Response Decoding Tests
// =============================================================================

#[test]
fn test_decode_get_response_both_framings() {
    let value = Value::Array(vec![Primitive::from("x"), Primitive::from(3.0)]);
    let response = Response::value(value.clone());

    for framing in [ValueFraming::LengthPrefixed, ValueFraming::Legacy] {
        let bytes = encode_response(&response, framing);
        let decoded = decode_response(&bytes, CommandKind::Get, framing).unwrap();
        assert_eq!(decoded.status, Status::Ok);
        assert_eq!(decoded.payload, Some(Payload::Value(value.clone())));
    }
}

#[test]
fn test_decode_keys_response() {
    let keys = vec!["alpha".to_string(), "beta".to_string()];
    let bytes = encode_response(&Response::keys(keys.clone()), ValueFraming::default());
    let decoded = decode_response(&bytes, CommandKind::Keys, ValueFraming::default()).unwrap();
    assert_eq!(decoded.payload, Some(Payload::Keys(keys)));
}

#[test]
fn test_decode_not_found_for_get() {
    let bytes = encode_response(&Response::not_found(), ValueFraming::default());
    let decoded = decode_response(&bytes, CommandKind::Get, ValueFraming::default()).unwrap();
    assert_eq!(decoded, Response::not_found());
}

#[test]
fn test_decode_unknown_response_status() {
    let result = decode_response(&[0, 0, 0, 201], CommandKind::Ping, ValueFraming::default());
    assert!(matches!(result, Err(RediError::Protocol(_))));
}

#[test]
fn test_decode_status_with_unexpected_body() {
    let result = decode_response(
        &[0, 0, 0, 200, 0xFF],
        CommandKind::Set,
        ValueFraming::default(),
    );
    assert!(matches!(result, Err(RediError::Protocol(_))));
}

#[test]
fn test_decode_truncated_get_response() {
    let result = decode_response(
        &[0, 0, 0, 200, 0, 0, 0, 0, 0, 0, 0, 9, b'x'],
        CommandKind::Get,
        ValueFraming::LengthPrefixed,
    );
    assert!(matches!(result, Err(RediError::FrameTruncated { .. })));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_read_request_takes_one_frame() {
    let frame = encode_frame(b"ping", Some(&b"alive?"[..]));
    let mut stream = frame.clone();
    stream.extend_from_slice(b"next frame");

    let mut cursor = Cursor::new(stream);
    let read = read_request(&mut cursor, 1024).unwrap();
    assert_eq!(read, frame);
    assert_eq!(cursor.position(), 22);
}

#[test]
fn test_read_request_rejects_oversize_frame() {
    let frame = encode_frame(b"ping", Some(&b"alive?"[..]));
    let mut cursor = Cursor::new(frame);
    let result = read_request(&mut cursor, 16);
    assert!(matches!(result, Err(RediError::FrameMalformed(_))));
}

#[test]
fn test_read_request_short_stream() {
    let frame = encode_frame(b"ping", Some(&b"alive?"[..]));
    let mut cursor = Cursor::new(frame[..10].to_vec());
    let result = read_request(&mut cursor, 1024);
    match result {
        Err(RediError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("Expected EOF, got {:?}", other),
    }
}

#[test]
fn test_read_request_passes_undersized_prefix_through() {
    let mut cursor = Cursor::new(vec![0, 0, 0, 2]);
    let read = read_request(&mut cursor, 1024).unwrap();
    assert_eq!(read, vec![0, 0, 0, 2]);
    assert!(decode_request(&read).has_error(ErrorCode::FrameMalformed));
}

#[test]
fn test_stream_write_read_response() {
    let response = Response::value(Value::from(12.5));

    let mut buffer = Vec::new();
    write_response(&mut buffer, &response, ValueFraming::Legacy).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_response(&mut cursor, CommandKind::Get, ValueFraming::Legacy).unwrap();
    assert_eq!(decoded, response);
}
