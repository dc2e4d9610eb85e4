#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use objwire_codec::{
    binary,
    value::{from_value, to_value},
    Decode, Encode, Error,
};
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt::Debug,
};

fn roundtrip<T: Encode + Decode + Default + PartialEq + Debug>(value: T) {
    let encoded = binary::to_bytes(&value).expect("failed to encode");
    let decoded: T = binary::from_bytes(encoded).expect("failed to decode an encoded value");
    assert_eq!(value, decoded);

    let tree = to_value(&value).expect("failed to build value");
    let decoded: T = from_value(&tree).expect("failed to decode a built value");
    assert_eq!(value, decoded);
}

/// Floats compare by bits so NaN payloads survive the round trip check.
fn roundtrip_float(value: f64) {
    let encoded = binary::to_bytes(&value).expect("failed to encode");
    let decoded: f64 = binary::from_bytes(encoded).expect("failed to decode");
    assert_eq!(value.to_bits(), decoded.to_bits());
}

fn roundtrip_wide(value: i128) {
    match binary::to_bytes(&value) {
        Ok(encoded) => assert_eq!(binary::from_bytes::<i128>(encoded), Ok(value)),
        Err(err) => {
            assert!(i64::try_from(value).is_err());
            assert!(matches!(err, Error::OutOfBounds { .. }));
        }
    }
}

/// Narrowing either succeeds with the same number or reports the value out of bounds.
fn narrow(value: i64) {
    let encoded = binary::to_bytes(&value).expect("failed to encode");
    match binary::from_bytes::<u8>(encoded) {
        Ok(narrowed) => assert_eq!(i64::from(narrowed), value),
        Err(err) => assert_eq!(
            err,
            Error::OutOfBounds {
                value: value.into(),
                ty: "u8"
            }
        ),
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    F64(f64),
    Narrow(i64),
    String(String),
    Bytes(Vec<u8>),
    Vec(Vec<u32>),
    Nested(Vec<Vec<i16>>),
    Deque(VecDeque<String>),
    Array([i32; 4]),
    Option(Option<u64>),
    Tuple((u8, String, bool)),
    BTreeMap(BTreeMap<u16, String>),
    HashMap(HashMap<String, Vec<u8>>),
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Bool(v) => roundtrip(v),
        FuzzInput::U8(v) => roundtrip(v),
        FuzzInput::U16(v) => roundtrip(v),
        FuzzInput::U32(v) => roundtrip(v),
        FuzzInput::U64(v) => roundtrip(v),
        FuzzInput::Usize(v) => roundtrip(v),
        FuzzInput::I8(v) => roundtrip(v),
        FuzzInput::I16(v) => roundtrip(v),
        FuzzInput::I32(v) => roundtrip(v),
        FuzzInput::I64(v) => roundtrip(v),
        FuzzInput::I128(v) => roundtrip_wide(v),
        FuzzInput::F64(v) => roundtrip_float(v),
        FuzzInput::Narrow(v) => narrow(v),
        FuzzInput::String(v) => roundtrip(v),
        FuzzInput::Bytes(v) => roundtrip(Bytes::from(v)),
        FuzzInput::Vec(v) => roundtrip(v),
        FuzzInput::Nested(v) => roundtrip(v),
        FuzzInput::Deque(v) => roundtrip(v),
        FuzzInput::Array(v) => roundtrip(v),
        FuzzInput::Option(v) => roundtrip(v),
        FuzzInput::Tuple(v) => roundtrip(v),
        FuzzInput::BTreeMap(v) => roundtrip(v),
        FuzzInput::HashMap(v) => roundtrip(v),
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
