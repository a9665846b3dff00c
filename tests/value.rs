#![allow(clippy::unwrap_used)]

use cid::Cid;
use dagwire::{Kind, List, Map, Value};

const CID: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";

#[test]
fn constructors_and_kinds() {
    assert_eq!(Value::Null.kind(), Kind::Null);
    assert_eq!(Value::Bool(true).kind(), Kind::Bool);
    assert_eq!(Value::Integer(1).kind(), Kind::Integer);
    assert_eq!(Value::Float(1.0).kind(), Kind::Float);
    assert_eq!(Value::string("x").kind(), Kind::String);
    assert_eq!(Value::bytes([1]).kind(), Kind::Bytes);
    assert_eq!(Value::list(vec![]).kind(), Kind::List);
    assert_eq!(Value::map::<&str>([]).kind(), Kind::Map);
    let cid = Cid::try_from(CID).unwrap();
    assert_eq!(Value::link(cid).kind(), Kind::Link);
}

#[test]
fn accessors() {
    assert!(Value::Null.is_null());
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Integer(7).as_integer(), Some(7));
    assert_eq!(Value::Float(0.5).as_float(), Some(0.5));
    assert_eq!(Value::string("s").as_str(), Some("s"));
    assert_eq!(Value::bytes([9]).as_bytes(), Some(&[9u8][..]));
    assert_eq!(Value::Integer(7).as_str(), None);
}

#[test]
fn list_operations() {
    let mut list = List::new();
    assert!(list.is_empty());
    list.push(Value::Integer(1));
    list.push(Value::Integer(3));
    list.insert(1, Value::Integer(2));
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1), Some(&Value::Integer(2)));

    assert_eq!(list.remove(0), Value::Integer(1));
    assert_eq!(list.pop(), Some(Value::Integer(3)));
    assert_eq!(list.len(), 1);
    assert_eq!(list.pop(), Some(Value::Integer(2)));
    assert_eq!(list.pop(), None);
}

#[test]
fn map_set_overwrites_and_preserves_insertion_order() {
    let mut map = Map::new();
    map.set("z", Value::Integer(1));
    map.set("a", Value::Integer(2));
    map.set("z", Value::Integer(3));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("z"), Some(&Value::Integer(3)));

    let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["z", "a"]);

    assert_eq!(map.remove("z"), Some(Value::Integer(3)));
    assert_eq!(map.remove("z"), None);
    assert_eq!(map.len(), 1);
}

#[test]
fn map_sort_by_reorders_entries() {
    let mut map = Map::from_entries([
        ("bb", Value::Integer(1)),
        ("a", Value::Integer(2)),
        ("c", Value::Integer(3)),
    ]);
    map.sort_by(dagwire::cmp_cbor_keys);
    let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["a", "c", "bb"]);
}

#[test]
fn clones_share_until_mutated() {
    let mut a = List::new();
    a.push(Value::Integer(1));
    let b = a.clone();
    a.push(Value::Integer(2));
    assert_eq!(a.len(), 2);
    // Mutation is only observable through the handle it happened on.
    assert_eq!(b.len(), 1);
}

#[test]
fn equality_is_structural() {
    assert_eq!(Value::Integer(1), Value::Integer(1));
    assert_ne!(Value::Integer(1), Value::Float(1.0));
    assert_eq!(Value::string("x"), Value::string("x"));
    assert_eq!(Value::bytes([1, 2]), Value::bytes([1, 2]));
    assert_ne!(Value::bytes([1, 2]), Value::bytes([2, 1]));

    // Floats compare bitwise: the two zeroes differ.
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
}

#[test]
fn map_equality_is_order_independent() {
    let a = Value::map([("x", Value::Integer(1)), ("y", Value::Integer(2))]);
    let b = Value::map([("y", Value::Integer(2)), ("x", Value::Integer(1))]);
    assert_eq!(a, b);

    let c = Value::map([("x", Value::Integer(1)), ("y", Value::Integer(3))]);
    assert_ne!(a, c);
    let d = Value::map([("x", Value::Integer(1))]);
    assert_ne!(a, d);
}

#[test]
fn expect_eq_reports_the_mismatch_path() {
    let actual = Value::map([(
        "outer",
        Value::list(vec![Value::Integer(1), Value::Integer(2)]),
    )]);
    let expected = Value::map([(
        "outer",
        Value::list(vec![Value::Integer(1), Value::Integer(9)]),
    )]);

    actual.expect_eq(&actual.clone()).unwrap();
    let msg = actual.expect_eq(&expected).unwrap_err();
    assert!(msg.contains("$.outer[1]"), "unexpected message: {msg}");

    let msg = Value::Integer(1)
        .expect_eq(&Value::string("1"))
        .unwrap_err();
    assert!(msg.contains("expected string"), "unexpected message: {msg}");
}

#[test]
fn debug_rendering_is_readable() {
    let v = Value::map([
        ("n", Value::Null),
        ("b", Value::bytes([0xde, 0xad])),
        ("l", Value::list(vec![Value::Bool(true)])),
    ]);
    let rendered = format!("{v:?}");
    assert!(rendered.contains("\"n\": null"), "{rendered}");
    assert!(rendered.contains("h'dead'"), "{rendered}");
    assert!(rendered.contains("[true]"), "{rendered}");
}
