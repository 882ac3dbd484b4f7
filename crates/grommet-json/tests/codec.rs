//! Integration tests for the decoder and encoder.
//!
//! These tests drive the public API the way the protocol engine does and
//! cross-check the codec against `serde_json`.

use grommet_json::{decode, encode, try_decode, DecodeError, JsonObject, JsonValue};
use proptest::prelude::*;
use rstest::rstest;

#[rstest]
#[case::null("null", JsonValue::Null)]
#[case::boolean("true", JsonValue::Bool(true))]
#[case::integer("42", JsonValue::Integer(42))]
#[case::negative("-17", JsonValue::Integer(-17))]
#[case::fraction("0.5", JsonValue::Float(0.5))]
#[case::exponent("2e2", JsonValue::Float(200.0))]
#[case::escaped_string(r#""tab\there""#, JsonValue::string("tab\there"))]
#[case::unicode_escape(r#""\u00e9""#, JsonValue::string("\u{e9}"))]
#[case::raw_unicode("\"\u{4e16}\u{754c}\"", JsonValue::string("\u{4e16}\u{754c}"))]
#[case::padded("  \n[ ]\t", JsonValue::array())]
fn decodes_scalar_and_literal_forms(#[case] text: &str, #[case] expected: JsonValue) {
    assert_eq!(try_decode(text).unwrap(), expected);
}

#[rstest]
#[case::unterminated_object(r#"{"a": 1"#)]
#[case::missing_colon(r#"{"a" 1}"#)]
#[case::bare_word("hello")]
#[case::two_values("1 2")]
#[case::unterminated_string(r#"["abc"#)]
#[case::bad_escape(r#""\x41""#)]
#[case::leading_comma("[,1]")]
fn rejects_malformed_input(#[case] text: &str) {
    assert!(try_decode(text).is_err(), "accepted {text:?}");
    assert!(decode(text).is_null());
}

#[test]
fn canonical_text_round_trips() {
    let text = r#"{"Int": 42, "Float": 3.14}"#;
    assert_eq!(encode(&decode(text)), text);
}

#[test]
fn escaped_quotes_are_consumed() {
    assert_eq!(
        decode(r#""Hello \"World\"""#).as_str(),
        Some("Hello \"World\"")
    );
}

#[rstest]
#[case::object("{}", true)]
#[case::array("[]", false)]
fn empty_containers_decode_empty(#[case] text: &str, #[case] is_object: bool) {
    let value = decode(text);
    assert_eq!(value.is_object(), is_object);
    assert_eq!(value.len(), 0);
    assert_eq!(encode(&value), text);
}

#[test]
fn repeated_set_keeps_one_pair() {
    let mut object = JsonValue::object();
    object.set("k", 1);
    object.set("k", 2);
    assert_eq!(object.len(), 1);
    assert_eq!(object["k"].as_i64(), Some(2));
}

#[rstest]
#[case::none(0)]
#[case::one(1)]
#[case::hundred(100)]
#[case::many_growths(10_000)]
fn array_appends_preserve_order_and_length(#[case] count: i64) {
    let mut array = JsonValue::array();
    for i in 0..count {
        array.push(i);
    }

    assert_eq!(i64::try_from(array.len()).unwrap(), count);
    let read_back: Vec<i64> = array
        .as_array()
        .unwrap()
        .iter()
        .filter_map(JsonValue::as_i64)
        .collect();
    assert_eq!(read_back, (0..count).collect::<Vec<_>>());
}

#[test]
fn error_offsets_point_into_the_input() {
    let err = try_decode(r#"{"ok": true, "bad": tru}"#).unwrap_err();
    assert_eq!(
        err,
        DecodeError::InvalidLiteral {
            literal: "tru".to_string(),
            offset: 20,
        }
    );
    assert_eq!(err.offset(), 20);
}

#[test]
fn decodes_an_initialize_response() {
    let text = r#"{"jsonrpc": "2.0", "id": 1, "result": {
        "capabilities": {"hoverProvider": true, "completionProvider": {"triggerCharacters": ["."]}},
        "serverInfo": {"name": "demo-ls", "version": "0.1.0"}
    }}"#;

    let value = decode(text);

    assert_eq!(value["id"].as_i64(), Some(1));
    let result = &value["result"];
    assert_eq!(result["serverInfo"]["name"].as_str(), Some("demo-ls"));
    assert_eq!(
        result["capabilities"]["hoverProvider"].as_bool(),
        Some(true)
    );
    assert_eq!(
        result["capabilities"]["completionProvider"]["triggerCharacters"][0].as_str(),
        Some(".")
    );
    assert!(result["capabilities"]["renameProvider"].is_null());
}

#[test]
fn encoded_request_matches_expected_text() {
    let mut params = JsonObject::new();
    params.set("processId", JsonValue::Null);
    params.set("rootUri", "file:///tmp/project");

    let mut request = JsonValue::object();
    request.set("jsonrpc", "2.0");
    request.set("id", 1);
    request.set("method", "initialize");
    request.set("params", params);

    assert_eq!(
        encode(&request),
        r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"processId": null, "rootUri": "file:///tmp/project"}}"#
    );
}

#[test]
fn encoder_output_is_accepted_by_serde_json() {
    let value = decode(r#"{"s": "a\"b\\c\n\u0001", "f": 1.0, "n": [-1, 1e-3]}"#);
    let text = encode(&value);

    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["s"], "a\"b\\c\n\u{1}");
    assert_eq!(parsed["f"], 1.0);
    assert_eq!(parsed["n"][1], 0.001);
}

fn json_value() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::Integer),
        // Quarters keep the decimal spelling short and exact.
        (-4_000_000i32..4_000_000).prop_map(|n| JsonValue::Float(f64::from(n) / 4.0)),
        ".*".prop_map(JsonValue::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::from),
            prop::collection::vec(("[a-zA-Z_]{1,8}", inner), 0..6)
                .prop_map(|pairs| JsonValue::Object(pairs.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn decodes_what_serde_json_writes(value in json_value()) {
        let text = serde_json::to_string(&value).unwrap();
        prop_assert_eq!(try_decode(&text).unwrap(), value);
    }

    #[test]
    fn serde_json_reads_what_we_write(value in json_value()) {
        let ours: serde_json::Value = serde_json::from_str(&encode(&value)).unwrap();
        let theirs = serde_json::to_value(&value).unwrap();
        prop_assert_eq!(ours, theirs);
    }

    #[test]
    fn decode_never_panics(text in ".{0,64}") {
        let _ = decode(&text);
    }
}
