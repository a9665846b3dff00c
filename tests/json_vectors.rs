#![allow(clippy::unwrap_used)]

use cid::Cid;
use dagwire::{cbor, json, DecodeOptions, ErrorCode, Value};

const S5_CID: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

fn enc(v: &Value) -> String {
    String::from_utf8(json::encode_value(v).unwrap()).unwrap()
}

#[test]
fn nested_list_matches_cbor_value() {
    let input = b"[[],[null,42,true]]";
    let from_json = json::decode_value(input).unwrap();
    let from_cbor = cbor::decode_value(&[0x82, 0x80, 0x83, 0xf6, 0x18, 0x2a, 0xf5]).unwrap();
    from_json.expect_eq(&from_cbor).unwrap();

    assert_eq!(enc(&from_json).as_bytes(), input);
}

#[test]
fn scalars_render_minimally() {
    assert_eq!(enc(&Value::Null), "null");
    assert_eq!(enc(&Value::Bool(true)), "true");
    assert_eq!(enc(&Value::Bool(false)), "false");
    assert_eq!(enc(&Value::Integer(0)), "0");
    assert_eq!(enc(&Value::Integer(-42)), "-42");
    assert_eq!(enc(&Value::Integer(i64::MAX)), "9223372036854775807");
    assert_eq!(enc(&Value::Integer(i64::MIN)), "-9223372036854775808");
    assert_eq!(enc(&Value::string("hi")), "\"hi\"");
}

#[test]
fn map_keys_sort_byte_lexicographic() {
    // Unlike dag-cbor there is no length prefix: "aa" < "b".
    let v = Value::map([
        ("b", Value::Integer(1)),
        ("aa", Value::Integer(2)),
    ]);
    assert_eq!(enc(&v), r#"{"aa":2,"b":1}"#);
}

#[test]
fn link_form() {
    let cid = Cid::try_from(S5_CID).unwrap();
    let v = Value::link(cid);
    let text = enc(&v);
    assert_eq!(text, format!("{{\"/\":\"{S5_CID}\"}}"));

    let back = json::decode_value(text.as_bytes()).unwrap();
    assert_eq!(back.as_link(), Some(&cid));
}

#[test]
fn bytes_form_uses_base64url_nopad() {
    let v = Value::bytes([0x01, 0x02, 0x03, 0x04, 0x05]);
    let text = enc(&v);
    assert_eq!(text, r#"{"/":{"bytes":"AQIDBAU"}}"#);

    let back = json::decode_value(text.as_bytes()).unwrap();
    assert_eq!(back.as_bytes(), Some(&[0x01, 0x02, 0x03, 0x04, 0x05][..]));

    assert_eq!(enc(&Value::bytes([])), r#"{"/":{"bytes":""}}"#);
}

#[test]
fn malformed_reserved_objects_are_invalid() {
    // Bad base64 payload.
    let err = json::decode_value(br#"{"/":{"bytes":"@@@"}}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
    // Bad CID text.
    let err = json::decode_value(br#"{"/":"not-a-cid"}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
    // Wrong inner key.
    let err = json::decode_value(br#"{"/":{"data":"AQ"}}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
    // Extra member after the link.
    let err = json::decode_value(&{
        let cid = S5_CID;
        format!("{{\"/\":\"{cid}\",\"x\":1}}").into_bytes()
    })
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
    // A number under "/" is neither a link nor bytes.
    let err = json::decode_value(br#"{"/":7}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[test]
fn reserved_key_is_rejected_in_plain_maps() {
    // As a non-first key on decode.
    let err = json::decode_value(br#"{"a":1,"/":2}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);

    // And on encode, wherever it sorts.
    let v = Value::map([("/", Value::Integer(1)), ("a", Value::Integer(2))]);
    let err = json::encode_value(&v).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[test]
fn duplicate_map_keys_are_invalid() {
    let err = json::decode_value(br#"{"a":1,"a":2}"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[test]
fn integer_overflow_vector() {
    // Within range decodes; one past u64::MAX-style fixtures are a hard error.
    let v = json::decode_value(br#"[{"foo":"bar"},9223372036854775807]"#).unwrap();
    assert_eq!(
        v.as_list().unwrap().get(1),
        Some(&Value::Integer(i64::MAX))
    );

    let err = json::decode_value(br#"[{"foo":"bar"},18446744073709551615]"#).unwrap_err();
    assert_eq!(err.code, ErrorCode::Overflow);
}

#[test]
fn string_escapes_roundtrip() {
    let v = Value::string("a\"b\\c\nd\te\u{8}f\u{c}g\rh\u{1}i");
    let text = enc(&v);
    assert_eq!(text, r#""a\"b\\c\nd\te\bf\fg\rh\u0001i""#);
    assert_eq!(json::decode_value(text.as_bytes()).unwrap(), v);

    // Unicode stays raw by default.
    assert_eq!(enc(&Value::string("héllo")), "\"héllo\"");
    let opts = json::EncodeOptions {
        escape_unicode: true,
        ..json::EncodeOptions::default()
    };
    let escaped = json::encode_value_with(&Value::string("héllo😀"), opts).unwrap();
    assert_eq!(escaped, br#""h\u00e9llo\ud83d\ude00""#);
}

#[test]
fn escaped_input_decodes() {
    let v = json::decode_value(br#""\u0041\u00e9\ud83d\ude00""#).unwrap();
    assert_eq!(v, Value::string("Aé😀"));
}

#[test]
fn whitespace_between_tokens_is_accepted() {
    let v = json::decode_value(b" [ 1 , {\"a\" : null} ] ").unwrap();
    v.expect_eq(&Value::list(vec![
        Value::Integer(1),
        Value::map([("a", Value::Null)]),
    ]))
    .unwrap();
}

#[test]
fn trailing_tokens_and_bytes() {
    let err = json::decode_value(b"1 2").unwrap_err();
    assert_eq!(err.code, ErrorCode::ExpectedEod);

    let err = json::decode_value(b"1 @").unwrap_err();
    assert_eq!(err.code, ErrorCode::ExtraneousData);
}

#[test]
fn syntax_errors_are_invalid_type() {
    for input in [
        &b"{"[..],
        &b"[1,]"[..],
        &b"{\"a\":}"[..],
        &b"tru"[..],
        &b"+1"[..],
        &b"1."[..],
        &b"\"\\q\""[..],
    ] {
        let err = json::decode_value(input).unwrap_err();
        assert!(
            matches!(err.code, ErrorCode::InvalidType | ErrorCode::UnexpectedEof),
            "input {input:?} gave {err:?}"
        );
    }
}

#[test]
fn float_formats_on_the_wire() {
    use dagwire::json::FloatFormat;

    let fmt = |v: f64, float_format| {
        let opts = json::EncodeOptions {
            float_format,
            ..json::EncodeOptions::default()
        };
        String::from_utf8(json::encode_value_with(&Value::Float(v), opts).unwrap()).unwrap()
    };

    assert_eq!(fmt(1.0, FloatFormat::Decimal), "1.0");
    assert_eq!(fmt(10.0, FloatFormat::Decimal), "10.0");
    assert_eq!(fmt(99.99, FloatFormat::Decimal), "99.99");
    assert_eq!(fmt(1.0, FloatFormat::Scientific), "1e0");

    let ranged = FloatFormat::DecimalInRange {
        min_exp10: Some(-1),
        max_exp10: Some(1),
    };
    assert_eq!(fmt(100.111, ranged), "1.00111e2");
    assert_eq!(fmt(10.0, ranged), "10.0");
    assert_eq!(fmt(99.99, ranged), "99.99");

    let err = json::encode_value(&Value::Float(f64::NAN)).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedValue);
}

#[test]
fn lenient_mode_only_affects_records() {
    // Dynamic maps accept any key order in both modes.
    let v = json::decode_value(br#"{"b":1,"aa":2}"#).unwrap();
    let v2 = json::decode_value_with(br#"{"b":1,"aa":2}"#, DecodeOptions::lenient()).unwrap();
    v.expect_eq(&v2).unwrap();
}

#[test]
fn reader_and_writer_variants_match_slices() {
    let v = Value::map([("k", Value::list(vec![Value::Integer(7)]))]);
    let direct = json::encode_value(&v).unwrap();

    let mut streamed = Vec::new();
    json::encode_value_to(&v, &mut streamed).unwrap();
    assert_eq!(streamed, direct);

    let back = json::decode_value_from(direct.as_slice()).unwrap();
    back.expect_eq(&v).unwrap();
}

#[test]
fn typed_and_dynamic_paths_emit_identical_bytes() {
    let typed = json::encode(&(vec![1i64, 2], Some("hi"), Option::<bool>::None)).unwrap();
    let dynamic = json::encode_value(&Value::list(vec![
        Value::list(vec![Value::Integer(1), Value::Integer(2)]),
        Value::string("hi"),
        Value::Null,
    ]))
    .unwrap();
    assert_eq!(typed, dynamic);

    let (nums, s, none): (Vec<i64>, Option<String>, Option<bool>) =
        json::decode(&typed).unwrap();
    assert_eq!(nums, vec![1, 2]);
    assert_eq!(s.as_deref(), Some("hi"));
    assert_eq!(none, None);
}
