//! Record traversal through the derive macro.

use objwire_codec::{
    binary,
    value::{from_value, to_value, Value},
    Error, FieldCache, Kind, Record, RecordDescriptor,
};
use objwire_macros::test_traced;
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, Default, PartialEq, Record)]
pub struct Sparse {
    #[wire("A,omitempty")]
    pub a: u32,
    #[wire("B,omitempty")]
    pub b: u32,
}

#[derive(Debug, Default, PartialEq, Record)]
pub struct Inner {
    pub label: String,
    pub weights: Vec<f32>,
}

#[derive(Debug, Default, PartialEq, Record)]
pub struct Outer {
    pub id: u64,
    #[wire("child")]
    pub inner: Inner,
    #[wire(",omitzero")]
    pub parent: Option<Box<Outer>>,
    pub attrs: BTreeMap<String, i32>,
    pub raw: Vec<u8>,
    #[wire("-")]
    pub cached: u32,
    private: u32,
}

#[derive(Debug, Default, PartialEq, Record)]
pub struct Shadowed {
    #[wire("x")]
    pub first: u8,
    #[wire("x")]
    pub second: u8,
}

fn outer() -> Outer {
    Outer {
        id: 42,
        inner: Inner {
            label: "root".into(),
            weights: vec![0.5, -1.25],
        },
        parent: Some(Box::new(Outer {
            id: 1,
            ..Outer::default()
        })),
        attrs: BTreeMap::from([("a".to_string(), -1), ("b".to_string(), 2)]),
        raw: vec![0, 1, 255],
        cached: 0,
        private: 0,
    }
}

#[test]
fn test_omitempty() {
    let encoded = to_value(&Sparse { a: 1, b: 0 }).unwrap();
    assert_eq!(
        encoded,
        Value::Map(vec![(Value::from("A"), Value::Uint(1))])
    );
    assert_eq!(from_value::<Sparse>(&encoded), Ok(Sparse { a: 1, b: 0 }));

    let empty = to_value(&Sparse::default()).unwrap();
    assert_eq!(empty, Value::Map(vec![]));
}

#[test]
fn test_nested_roundtrip() {
    let original = outer();
    let encoded = to_value(&original).unwrap();
    assert_eq!(encoded.get("child").and_then(|v| v.get("label")), Some(&Value::from("root")));
    assert_eq!(
        encoded.get("raw"),
        Some(&Value::Bytes(bytes::Bytes::from_static(&[0, 1, 255])))
    );
    assert!(encoded.get("cached").is_none());
    assert!(encoded.get("private").is_none());
    assert_eq!(from_value::<Outer>(&encoded), Ok(original));

    let wire = binary::to_bytes(&outer()).unwrap();
    assert_eq!(binary::from_bytes::<Outer>(wire), Ok(outer()));
}

#[test]
fn test_omitzero_record() {
    let mut original = outer();
    original.parent = None;
    let encoded = to_value(&original).unwrap();
    assert!(encoded.get("parent").is_none());
    assert_eq!(from_value::<Outer>(&encoded), Ok(original));
}

#[test]
fn test_unresolved_keys_skipped() {
    let wire = Value::Map(vec![
        (Value::from("extra"), Value::Array(vec![Value::Int(1), Value::Map(vec![])])),
        (Value::from("A"), Value::Uint(5)),
        (Value::from("a"), Value::Uint(9)),
    ]);
    assert_eq!(from_value::<Sparse>(&wire), Ok(Sparse { a: 5, b: 0 }));
}

#[test]
fn test_nil_resets() {
    assert_eq!(from_value::<Sparse>(&Value::Nil), Ok(Sparse::default()));
}

#[test]
fn test_wrong_kind() {
    assert_eq!(
        from_value::<Sparse>(&Value::from("nope")),
        Err(Error::conversion(Kind::String, Kind::Map))
    );
}

#[test]
fn test_field_out_of_bounds() {
    let wire = Value::Map(vec![(Value::from("A"), Value::Int(-1))]);
    assert_eq!(
        from_value::<Sparse>(&wire),
        Err(Error::OutOfBounds {
            value: -1,
            ty: "u32"
        })
    );
}

#[test_traced]
fn test_duplicate_wire_name() {
    let descriptor = FieldCache::global().lookup::<Shadowed>();
    assert_eq!(descriptor.fields().len(), 1);
    assert_eq!(descriptor.field("x").map(|f| f.index), Some(0));

    let encoded = to_value(&Shadowed { first: 1, second: 2 }).unwrap();
    assert_eq!(encoded, Value::Map(vec![(Value::from("x"), Value::Uint(1))]));
}

#[test]
fn test_cache_idempotent() {
    let cache = FieldCache::new();
    let first = cache.lookup::<Outer>();
    let second = cache.lookup::<Outer>();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    let rebuilt = RecordDescriptor::build::<Outer>();
    assert_eq!(rebuilt.fields(), first.fields());
    let names: Vec<_> = first.fields().iter().map(|f| f.name).collect();
    assert_eq!(names, ["id", "child", "parent", "attrs", "raw"]);
}

#[test]
fn test_cache_concurrent() {
    let cache = Arc::new(FieldCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            std::thread::spawn(move || cache.lookup::<Inner>())
        })
        .collect();
    let descriptors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for descriptor in &descriptors[1..] {
        assert!(Arc::ptr_eq(&descriptors[0], descriptor));
    }
    assert_eq!(cache.len(), 1);
}
