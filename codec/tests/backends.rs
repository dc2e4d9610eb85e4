//! Round trips through both reference backends.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};
use objwire_codec::{
    binary::{self, BinaryReader, BinaryWriter},
    decode,
    value::{to_value, Value, ValueReader},
    Error, Failure, Record, StreamDecoder, StreamEncoder,
};
use std::collections::HashMap;
use test_case::test_case;

#[derive(Debug, Default, PartialEq, Record)]
pub struct Event {
    pub seq: u32,
    pub at: DateTime<Utc>,
    pub took: TimeDelta,
    pub payload: Bytes,
    pub failure: Option<Failure>,
    pub scores: HashMap<String, f64>,
    pub pair: (i8, String),
    pub window: [u16; 3],
}

fn event(seq: u32) -> Event {
    Event {
        seq,
        at: DateTime::from_timestamp(1_700_000_000, 123_000_000).unwrap(),
        took: TimeDelta::milliseconds(-1500),
        payload: Bytes::from_static(b"\x00\xffpayload"),
        failure: Some(Failure::new("disk full")),
        scores: HashMap::from([("p50".to_string(), 1.5), ("p99".to_string(), 9.75)]),
        pair: (-3, "x".into()),
        window: [1, 2, 3],
    }
}

#[test_case(false; "known lengths")]
#[test_case(true; "unknown lengths")]
fn test_value_backend(unknown: bool) {
    let original = event(7);
    let tree = to_value(&original).unwrap();
    let mut reader = ValueReader::new(&tree);
    if unknown {
        reader = reader.with_unknown_lengths();
    }
    let mut decoded = Event::default();
    decode(&mut reader, &mut decoded).unwrap();
    assert!(reader.is_done());
    assert_eq!(decoded, original);
}

#[test]
fn test_binary_backend() {
    let original = event(8);
    let wire = binary::to_bytes(&original).unwrap();
    assert_eq!(binary::from_bytes::<Event>(wire.clone()), Ok(original));

    // The same bytes decode without a static destination
    let dynamic: Value = binary::from_bytes(wire).unwrap();
    assert_eq!(dynamic.get("seq"), Some(&Value::Uint(8)));
    assert_eq!(dynamic.get("failure"), Some(&Value::Error("disk full".into())));
}

#[test]
fn test_trailing_bytes() {
    let mut wire = BytesMut::from(&binary::to_bytes(&1u8).unwrap()[..]);
    wire.extend_from_slice(&[0, 0]);
    assert_eq!(binary::from_bytes::<u8>(wire.freeze()), Err(Error::ExtraData(2)));
}

#[test]
fn test_binary_stream() {
    let mut writer = BinaryWriter::new(BytesMut::new());
    let mut stream = StreamEncoder::new(&mut writer);
    for seq in 0..3 {
        stream.encode(&event(seq)).unwrap();
    }
    stream.close().unwrap();
    let wire = writer.into_inner().freeze();

    let mut reader = BinaryReader::new(wire);
    let mut stream = StreamDecoder::new(&mut reader);
    assert_eq!(stream.len(), Ok(None));
    let mut seen = Vec::new();
    while let Some(event) = stream.next::<Event>().unwrap() {
        seen.push(event.seq);
    }
    assert_eq!(seen, [0, 1, 2]);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_stream_closed_early() {
    let mut writer = BinaryWriter::new(Vec::new());
    let mut stream = StreamEncoder::new(&mut writer);
    stream.open(3).unwrap();
    stream.encode(&1u8).unwrap();
    assert_eq!(
        stream.close(),
        Err(Error::ArrayLength {
            expected: 3,
            found: 1
        })
    );
    assert!(stream.is_closed());
}

#[test]
fn test_stream_declared_count() {
    let mut writer = BinaryWriter::new(Vec::new());
    let mut stream = StreamEncoder::new(&mut writer);
    stream.open(3).unwrap();
    for value in ["a", "b", "c"] {
        stream.encode(value).unwrap();
    }
    assert_eq!(stream.encode("d"), Err(Error::StreamClosed));
    let wire = Bytes::from(writer.into_inner());

    let decoded: Vec<String> = binary::from_bytes(wire).unwrap();
    assert_eq!(decoded, ["a", "b", "c"]);
}
