#![allow(clippy::unwrap_used)]

use cid::Cid;
use dagwire::{cbor, json, Decode, DecodeOptions, Encode, Error, ErrorCode, Value};

const CID_A: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

#[derive(Debug, PartialEq, Encode, Decode)]
struct Account {
    id: u32,
    email: String,
}

#[test]
fn record_field_order_differs_per_codec() {
    let v = Account {
        id: 10,
        email: "johndoe@example.com".to_owned(),
    };

    // dag-json sorts byte-lexicographic: email before id.
    let bytes = json::encode(&v).unwrap();
    assert_eq!(
        bytes,
        br#"{"email":"johndoe@example.com","id":10}"#.to_vec()
    );
    assert_eq!(json::decode::<Account>(&bytes).unwrap(), v);

    // dag-cbor sorts length-then-lex: "id" (2) before "email" (5).
    let bytes = cbor::encode(&v).unwrap();
    let mut expected = vec![0xa2];
    expected.extend_from_slice(&[0x62, b'i', b'd', 0x0a]);
    expected.extend_from_slice(&[0x65, b'e', b'm', b'a', b'i', b'l']);
    expected.extend_from_slice(&[0x73]);
    expected.extend_from_slice(b"johndoe@example.com");
    assert_eq!(bytes, expected);
    assert_eq!(cbor::decode::<Account>(&bytes).unwrap(), v);
}

#[test]
fn record_bytes_match_the_dynamic_codec() {
    let v = Account {
        id: 10,
        email: "johndoe@example.com".to_owned(),
    };
    let dynamic = Value::map([
        ("id", Value::Integer(10)),
        ("email", Value::string("johndoe@example.com")),
    ]);
    assert_eq!(
        cbor::encode(&v).unwrap(),
        cbor::encode_value(&dynamic).unwrap()
    );
    assert_eq!(
        json::encode(&v).unwrap(),
        json::encode_value(&dynamic).unwrap()
    );
}

#[test]
fn strict_record_decode_requires_canonical_order() {
    let shuffled = br#"{"id":10,"email":"x"}"#;
    let err = json::decode::<Account>(shuffled).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);

    let v = json::decode_with::<Account>(shuffled, DecodeOptions::lenient()).unwrap();
    assert_eq!(
        v,
        Account {
            id: 10,
            email: "x".to_owned()
        }
    );
}

#[test]
fn record_decode_field_discipline() {
    // Missing field.
    let err = json::decode_with::<Account>(br#"{"id":10}"#, DecodeOptions::lenient()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);
    // Unknown field.
    let err = json::decode_with::<Account>(
        br#"{"email":"x","id":1,"zz":2}"#,
        DecodeOptions::lenient(),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);
    // Duplicate field.
    let err = json::decode_with::<Account>(
        br#"{"email":"x","email":"y","id":1}"#,
        DecodeOptions::lenient(),
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);

    // Same discipline on the cbor path: {"id": 1} alone is short.
    let missing = [0xa1, 0x62, b'i', b'd', 0x01];
    let err = cbor::decode_with::<Account>(&missing, DecodeOptions::lenient()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Renamed {
    #[ipld(rename = "n")]
    number: i64,
}

#[test]
fn field_rename_changes_the_wire_key() {
    let bytes = json::encode(&Renamed { number: 5 }).unwrap();
    assert_eq!(bytes, br#"{"n":5}"#.to_vec());
    assert_eq!(
        json::decode::<Renamed>(&bytes).unwrap(),
        Renamed { number: 5 }
    );
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Pair(i64, String);

#[test]
fn tuple_structs_are_lists() {
    let v = Pair(7, "x".to_owned());
    let bytes = cbor::encode(&v).unwrap();
    assert_eq!(bytes, vec![0x82, 0x07, 0x61, b'x']);
    assert_eq!(cbor::decode::<Pair>(&bytes).unwrap(), v);

    let bytes = json::encode(&v).unwrap();
    assert_eq!(bytes, br#"[7,"x"]"#.to_vec());
    assert_eq!(json::decode::<Pair>(&bytes).unwrap(), v);
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Nested {
    link: Cid,
    payload: Option<Vec<u8>>,
    tags: Vec<String>,
}

#[test]
fn nested_record_roundtrips_both_codecs() {
    let v = Nested {
        link: Cid::try_from(CID_A).unwrap(),
        payload: Some(vec![1, 2, 3, 4, 5]),
        tags: vec!["a".to_owned(), "b".to_owned()],
    };

    let bytes = cbor::encode(&v).unwrap();
    assert_eq!(cbor::decode::<Nested>(&bytes).unwrap(), v);

    let bytes = json::encode(&v).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.starts_with(&format!("{{\"link\":{{\"/\":\"{CID_A}\"}}")));
    assert!(text.contains(r#""payload":{"/":{"bytes":"AQIDBAU"}}"#));
    assert_eq!(json::decode::<Nested>(&bytes).unwrap(), v);

    // Absent optional travels as null and comes back as None.
    let none = Nested {
        payload: None,
        ..json::decode::<Nested>(&bytes).unwrap()
    };
    let bytes = json::encode(&none).unwrap();
    assert!(String::from_utf8(bytes.clone())
        .unwrap()
        .contains(r#""payload":null"#));
    assert_eq!(json::decode::<Nested>(&bytes).unwrap(), none);
}

#[derive(Debug, PartialEq, Encode, Decode)]
enum Phase {
    Solid,
    Liquid = 5,
    Gas,
}

#[test]
fn int_repr_enums_use_discriminants() {
    assert_eq!(cbor::encode(&Phase::Solid).unwrap(), vec![0x00]);
    assert_eq!(cbor::encode(&Phase::Liquid).unwrap(), vec![0x05]);
    assert_eq!(cbor::encode(&Phase::Gas).unwrap(), vec![0x06]);
    assert_eq!(json::encode(&Phase::Gas).unwrap(), b"6".to_vec());

    assert_eq!(cbor::decode::<Phase>(&[0x05]).unwrap(), Phase::Liquid);
    assert_eq!(json::decode::<Phase>(b"6").unwrap(), Phase::Gas);

    let err = cbor::decode::<Phase>(&[0x01]).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
    let err = json::decode::<Phase>(b"99").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[derive(Debug, PartialEq, Encode, Decode)]
#[ipld(repr = "string")]
enum Mode {
    Read,
    #[ipld(rename = "rw")]
    ReadWrite,
}

#[test]
fn string_repr_enums_use_variant_names() {
    assert_eq!(json::encode(&Mode::Read).unwrap(), br#""Read""#.to_vec());
    assert_eq!(json::encode(&Mode::ReadWrite).unwrap(), br#""rw""#.to_vec());
    assert_eq!(
        cbor::encode(&Mode::ReadWrite).unwrap(),
        vec![0x62, b'r', b'w']
    );

    assert_eq!(json::decode::<Mode>(br#""rw""#).unwrap(), Mode::ReadWrite);
    assert_eq!(
        cbor::decode::<Mode>(&[0x64, b'R', b'e', b'a', b'd']).unwrap(),
        Mode::Read
    );

    let err = json::decode::<Mode>(br#""w""#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[derive(Debug, PartialEq, Encode, Decode)]
#[ipld(adapter = "string")]
struct Semver {
    major: u8,
    minor: u8,
}

impl dagwire::StringRepr for Semver {
    fn write_string(&self, out: &mut String) -> Result<(), Error> {
        use std::fmt::Write as _;
        let _ = write!(out, "{}.{}", self.major, self.minor);
        Ok(())
    }

    fn parse_string(s: &str) -> Result<Self, Error> {
        let parse = |part: Option<&str>| {
            part.and_then(|p| p.parse().ok())
                .ok_or(Error::new(ErrorCode::InvalidValue, 0))
        };
        let mut parts = s.split('.');
        let major = parse(parts.next())?;
        let minor = parse(parts.next())?;
        if parts.next().is_some() {
            return Err(Error::new(ErrorCode::InvalidValue, 0));
        }
        Ok(Self { major, minor })
    }
}

#[test]
fn string_adapter_frames_as_text() {
    let v = Semver { major: 1, minor: 9 };
    assert_eq!(json::encode(&v).unwrap(), br#""1.9""#.to_vec());
    assert_eq!(
        cbor::encode(&v).unwrap(),
        vec![0x63, b'1', b'.', b'9']
    );
    assert_eq!(json::decode::<Semver>(br#""1.9""#).unwrap(), v);
    assert_eq!(
        cbor::decode::<Semver>(&[0x63, b'1', b'.', b'9']).unwrap(),
        v
    );

    let err = json::decode::<Semver>(br#""1.9.3""#).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[derive(Debug, PartialEq, Encode, Decode)]
#[ipld(adapter = "bytes")]
struct Fingerprint([u8; 4]);

impl dagwire::BytesRepr for Fingerprint {
    fn write_bytes(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.extend_from_slice(&self.0);
        Ok(())
    }

    fn parse_bytes(b: &[u8]) -> Result<Self, Error> {
        b.try_into()
            .map(Self)
            .map_err(|_| Error::new(ErrorCode::InvalidValue, 0))
    }
}

#[test]
fn bytes_adapter_frames_as_byte_string() {
    let v = Fingerprint([1, 2, 3, 4]);
    assert_eq!(
        cbor::encode(&v).unwrap(),
        vec![0x44, 0x01, 0x02, 0x03, 0x04]
    );
    assert_eq!(
        json::encode(&v).unwrap(),
        br#"{"/":{"bytes":"AQIDBA"}}"#.to_vec()
    );
    assert_eq!(
        cbor::decode::<Fingerprint>(&[0x44, 1, 2, 3, 4]).unwrap(),
        v
    );
    assert_eq!(
        json::decode::<Fingerprint>(br#"{"/":{"bytes":"AQIDBA"}}"#).unwrap(),
        v
    );
}

#[derive(Debug, PartialEq, Encode, Decode)]
#[ipld(adapter = "int")]
struct Timestamp(i64);

impl dagwire::IntRepr for Timestamp {
    fn encode_integer(&self) -> i64 {
        self.0
    }

    fn decode_integer(v: i64) -> Result<Self, Error> {
        if v < 0 {
            return Err(Error::new(ErrorCode::InvalidValue, 0));
        }
        Ok(Self(v))
    }
}

#[test]
fn int_adapter_frames_as_integer() {
    let v = Timestamp(1_700_000_000);
    let bytes = cbor::encode(&v).unwrap();
    assert_eq!(cbor::decode::<Timestamp>(&bytes).unwrap(), v);
    assert_eq!(json::encode(&v).unwrap(), b"1700000000".to_vec());

    let err = json::decode::<Timestamp>(b"-4").unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidValue);
}

#[derive(Debug, PartialEq, Encode, Decode)]
struct Outer {
    inner: Account,
    phase: Phase,
}

#[test]
fn records_nest() {
    let v = Outer {
        inner: Account {
            id: 3,
            email: "e".to_owned(),
        },
        phase: Phase::Liquid,
    };
    let bytes = cbor::encode(&v).unwrap();
    assert_eq!(cbor::decode::<Outer>(&bytes).unwrap(), v);

    let bytes = json::encode(&v).unwrap();
    assert_eq!(
        bytes,
        br#"{"inner":{"email":"e","id":3},"phase":5}"#.to_vec()
    );
    assert_eq!(json::decode::<Outer>(&bytes).unwrap(), v);
}

#[test]
fn fixed_arrays_and_tuples_are_lists() {
    let arr = [1u8, 2, 3];
    let bytes = cbor::encode(&arr).unwrap();
    assert_eq!(bytes, vec![0x83, 0x01, 0x02, 0x03]);
    assert_eq!(cbor::decode::<[u8; 3]>(&bytes).unwrap(), arr);

    let err = cbor::decode::<[u8; 4]>(&bytes).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidType);

    let bytes = json::encode(&arr).unwrap();
    assert_eq!(bytes, b"[1,2,3]".to_vec());
    assert_eq!(json::decode::<[u8; 3]>(&bytes).unwrap(), arr);
}

#[test]
fn u64_beyond_i64_is_an_overflow() {
    let err = cbor::encode(&u64::MAX).unwrap_err();
    assert_eq!(err.code, ErrorCode::Overflow);
    let err = json::encode(&u64::MAX).unwrap_err();
    assert_eq!(err.code, ErrorCode::Overflow);
}
