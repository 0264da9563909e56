//! Conversion Tests
//!
//! Tests for narrowing reply values into typed targets.

use std::collections::HashMap;

use bytes::Bytes;
use resplink::protocol::decode;
use resplink::{ClientError, ResultValue};

fn bulk(text: &str) -> ResultValue {
    ResultValue::Bulk(Bytes::copy_from_slice(text.as_bytes()))
}

// =============================================================================
// Scalar Targets
// =============================================================================

#[test]
fn test_integer_reply_to_integer() {
    let value = decode(b":42\r\n").unwrap();

    assert_eq!(value.as_integer().unwrap(), 42);
    assert_eq!(value.convert::<i64>().unwrap(), 42);
}

#[test]
fn test_numeric_bulk_to_integer() {
    assert_eq!(bulk("-15").as_integer().unwrap(), -15);
    assert!(matches!(bulk("fifteen").as_integer(), Err(ClientError::ParseInt(_))));
}

#[test]
fn test_integer_is_never_stringified() {
    let value = ResultValue::Integer(7);

    assert!(matches!(
        value.as_text(),
        Err(ClientError::TypeMismatch { target: "text", found: "integer" })
    ));
}

#[test]
fn test_bulk_and_status_to_text() {
    assert_eq!(bulk("hello").as_text().unwrap(), "hello");
    assert_eq!(ResultValue::status("OK").as_text().unwrap(), "OK");
    assert_eq!(ResultValue::status("OK").convert::<String>().unwrap(), "OK");
}

#[test]
fn test_non_utf8_bulk_to_text_fails_but_bytes_succeed() {
    let value = ResultValue::Bulk(Bytes::from_static(&[0xff, 0x00, 0x41]));

    assert!(matches!(value.as_text(), Err(ClientError::Utf8(_))));
    assert_eq!(value.as_bytes().unwrap(), vec![0xff, 0x00, 0x41]);
}

// =============================================================================
// Error and Nil
// =============================================================================

#[test]
fn test_error_reply_fails_every_target() {
    let value = decode(b"-ERR wrong type\r\n").unwrap();

    let server_error = |e: ClientError| matches!(e, ClientError::Server(ref m) if m == "ERR wrong type");
    assert!(server_error(value.as_text().unwrap_err()));
    assert!(server_error(value.as_bytes().unwrap_err()));
    assert!(server_error(value.as_integer().unwrap_err()));
    assert!(server_error(value.as_text_sequence().unwrap_err()));
    assert!(server_error(value.as_text_mapping().unwrap_err()));
    assert!(server_error(value.clone().convert::<Option<String>>().unwrap_err()));
}

#[test]
fn test_nil_fails_plain_targets() {
    let value = ResultValue::Nil;

    assert!(matches!(value.as_text(), Err(ClientError::TypeMismatch { found: "nil", .. })));
    assert!(matches!(value.as_integer(), Err(ClientError::TypeMismatch { .. })));
    assert!(matches!(value.as_text_sequence(), Err(ClientError::TypeMismatch { .. })));
}

#[test]
fn test_nil_to_optional_target() {
    assert_eq!(ResultValue::Nil.convert::<Option<String>>().unwrap(), None);
    assert_eq!(bulk("x").convert::<Option<String>>().unwrap(), Some("x".to_string()));
}

// =============================================================================
// Sequence and Mapping
// =============================================================================

#[test]
fn test_array_to_text_sequence() {
    let value = ResultValue::Array(vec![bulk("a"), ResultValue::status("b"), bulk("")]);

    assert_eq!(value.as_text_sequence().unwrap(), vec!["a", "b", ""]);
}

#[test]
fn test_empty_array_to_sequence_and_mapping() {
    let value = decode(b"*0\r\n").unwrap();

    assert!(value.as_text_sequence().unwrap().is_empty());
    assert!(value.as_text_mapping().unwrap().is_empty());
}

#[test]
fn test_sequence_with_integer_fails() {
    let value = ResultValue::Array(vec![bulk("a"), ResultValue::Integer(1), bulk("c")]);

    assert!(matches!(
        value.as_text_sequence(),
        Err(ClientError::TypeMismatch { found: "integer", .. })
    ));
}

#[test]
fn test_array_to_mapping() {
    let value = decode(b"*4\r\n$4\r\nname\r\n$3\r\nbob\r\n$3\r\nage\r\n$2\r\n42\r\n").unwrap();
    let map = value.as_text_mapping().unwrap();

    let mut expected = HashMap::new();
    expected.insert("name".to_string(), "bob".to_string());
    expected.insert("age".to_string(), "42".to_string());
    assert_eq!(map, expected);
}

#[test]
fn test_mapping_duplicate_key_last_wins() {
    let value = ResultValue::Array(vec![bulk("k"), bulk("1"), bulk("k"), bulk("2")]);

    assert_eq!(value.as_text_mapping().unwrap()["k"], "2");
}

#[test]
fn test_odd_mapping_fails_with_dedicated_error() {
    let value = ResultValue::Array(vec![bulk("a"), bulk("1"), bulk("b")]);

    assert!(matches!(value.as_text_mapping(), Err(ClientError::OddMappingLength(3))));
}

#[test]
fn test_mapping_with_integer_fails() {
    let value = ResultValue::Array(vec![bulk("a"), ResultValue::Integer(1)]);

    assert!(matches!(value.as_text_mapping(), Err(ClientError::TypeMismatch { .. })));
}

// =============================================================================
// Purity
// =============================================================================

#[test]
fn test_conversions_are_repeatable() {
    let value = ResultValue::Array(vec![bulk("a"), bulk("1"), bulk("b"), bulk("2")]);

    assert_eq!(value.as_text_mapping().unwrap(), value.as_text_mapping().unwrap());
    assert_eq!(value.as_text_sequence().unwrap(), value.as_text_sequence().unwrap());
    assert_eq!(
        value.as_integer().unwrap_err().to_string(),
        value.as_integer().unwrap_err().to_string()
    );
}

// =============================================================================
// Display
// =============================================================================

#[test]
fn test_display_like_redis_cli() {
    assert_eq!(ResultValue::Nil.to_string(), "(nil)");
    assert_eq!(ResultValue::Integer(3).to_string(), "(integer) 3");
    assert_eq!(ResultValue::status("OK").to_string(), "OK");
    assert_eq!(ResultValue::Error("ERR x".into()).to_string(), "(error) ERR x");
    assert_eq!(bulk("a\"b").to_string(), "\"a\\\"b\"");
    assert_eq!(ResultValue::Array(vec![]).to_string(), "(empty array)");
    assert_eq!(
        ResultValue::Array(vec![bulk("a"), ResultValue::Array(vec![ResultValue::Integer(1), ResultValue::Nil])])
            .to_string(),
        "1) \"a\"\n2) 1) (integer) 1\n   2) (nil)"
    );
}
