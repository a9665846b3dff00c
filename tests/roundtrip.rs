// Property-based round-trip and cross-codec equivalence checks.
//
// These are intentionally conservative in size/depth to keep CI fast.
#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use cid::Cid;
use dagwire::{cbor, json, DecodeOptions, Value};
use proptest::prelude::*;

const CID_A: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

fn arb_key() -> impl Strategy<Value = String> {
    let ascii = proptest::collection::vec(proptest::char::range('a', 'z'), 0..=24)
        .prop_map(|chars| chars.into_iter().collect::<String>());
    let unicode = proptest::collection::vec(proptest::char::range('\u{00a1}', '\u{00ff}'), 1..=8)
        .prop_map(|chars| chars.into_iter().collect::<String>());
    prop_oneof![
        8 => ascii,
        1 => unicode,
    ]
}

fn arb_float() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite floats only", |f| f.is_finite())
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    let int_boundaries = prop_oneof![
        Just(Value::Integer(i64::MIN)),
        Just(Value::Integer(i64::MAX)),
        Just(Value::Integer(23)),
        Just(Value::Integer(24)),
        Just(Value::Integer(-24)),
        Just(Value::Integer(-25)),
    ];

    prop_oneof![
        8 => any::<i64>().prop_map(Value::Integer),
        1 => int_boundaries,
        6 => arb_key().prop_map(Value::string),
        6 => proptest::collection::vec(any::<u8>(), 0..=48).prop_map(Value::bytes),
        4 => any::<bool>().prop_map(Value::Bool),
        4 => arb_float().prop_map(Value::Float),
        1 => Just(Value::Null),
        1 => Just(Value::link(Cid::try_from(CID_A).unwrap())),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 128, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::list),
            proptest::collection::vec((arb_key(), inner), 0..8).prop_map(|pairs| {
                // Deduplicate keys; maps require uniqueness.
                let entries: BTreeMap<String, Value> = pairs.into_iter().collect();
                Value::map(entries)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn cbor_roundtrip(v in arb_value()) {
        let bytes = cbor::encode_value(&v).unwrap();
        let back = cbor::decode_value(&bytes).unwrap();
        prop_assert!(back == v, "mismatch: {:?}", back.expect_eq(&v));

        // Re-encoding canonical bytes is the identity.
        let bytes2 = cbor::encode_value(&back).unwrap();
        prop_assert_eq!(&bytes, &bytes2);
    }

    #[test]
    fn json_roundtrip(v in arb_value()) {
        let bytes = json::encode_value(&v).unwrap();
        let back = json::decode_value(&bytes).unwrap();
        prop_assert!(back == v, "mismatch: {:?}", back.expect_eq(&v));

        let bytes2 = json::encode_value(&back).unwrap();
        prop_assert_eq!(&bytes, &bytes2);
    }

    #[test]
    fn cross_codec_equivalence(v in arb_value()) {
        let cbor_bytes = cbor::encode_value(&v).unwrap();
        let json_bytes = json::encode_value(&v).unwrap();

        let from_cbor = cbor::decode_value(&cbor_bytes).unwrap();
        let from_json = json::decode_value(&json_bytes).unwrap();
        prop_assert!(from_cbor == from_json, "{:?}", from_cbor.expect_eq(&from_json));

        // Transcoding reproduces the other codec's canonical bytes.
        prop_assert_eq!(cbor::encode_value(&from_json).unwrap(), cbor_bytes);
        prop_assert_eq!(json::encode_value(&from_cbor).unwrap(), json_bytes);
    }

    #[test]
    fn lenient_agrees_with_strict_on_canonical_input(v in arb_value()) {
        let bytes = cbor::encode_value(&v).unwrap();
        let strict = cbor::decode_value(&bytes).unwrap();
        let lenient = cbor::decode_value_with(&bytes, DecodeOptions::lenient()).unwrap();
        prop_assert!(strict == lenient);
    }

    #[test]
    fn cbor_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = cbor::decode_value(&bytes);
        let _ = cbor::decode_value_with(&bytes, DecodeOptions::lenient());
    }

    #[test]
    fn json_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = json::decode_value(&bytes);
    }

    #[test]
    fn typed_integer_roundtrip(v in any::<i64>()) {
        let bytes = cbor::encode(&v).unwrap();
        prop_assert_eq!(cbor::decode::<i64>(&bytes).unwrap(), v);
        let bytes = json::encode(&v).unwrap();
        prop_assert_eq!(json::decode::<i64>(&bytes).unwrap(), v);
    }

    #[test]
    fn typed_string_roundtrip(s in arb_key()) {
        let bytes = cbor::encode(s.as_str()).unwrap();
        prop_assert_eq!(cbor::decode::<String>(&bytes).unwrap(), s.clone());
        let bytes = json::encode(s.as_str()).unwrap();
        prop_assert_eq!(json::decode::<String>(&bytes).unwrap(), s);
    }
}
