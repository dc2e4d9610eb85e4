//! Call order between the engines and a backend.

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use objwire_codec::{
    decode, encode,
    value::{Value, ValueReader},
    Decoder, Encoder, EncodeConfig, Error, Kind, Next, Reader, Writer,
};
use std::collections::{BTreeMap, HashMap};

/// A writer that records every call it receives.
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl Recorder {
    fn push(&mut self, call: impl Into<String>) -> Result<(), Error> {
        self.calls.push(call.into());
        Ok(())
    }
}

impl Writer for Recorder {
    fn emit_nil(&mut self) -> Result<(), Error> {
        self.push("nil")
    }
    fn emit_bool(&mut self, value: bool) -> Result<(), Error> {
        self.push(format!("bool {value}"))
    }
    fn emit_int64(&mut self, value: i64) -> Result<(), Error> {
        self.push(format!("int {value}"))
    }
    fn emit_uint64(&mut self, value: u64) -> Result<(), Error> {
        self.push(format!("uint {value}"))
    }
    fn emit_float64(&mut self, value: f64) -> Result<(), Error> {
        self.push(format!("float {value}"))
    }
    fn emit_string(&mut self, value: &str) -> Result<(), Error> {
        self.push(format!("string {value}"))
    }
    fn emit_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.push(format!("bytes {value:?}"))
    }
    fn emit_time(&mut self, value: DateTime<Utc>) -> Result<(), Error> {
        self.push(format!("time {}", value.to_rfc3339()))
    }
    fn emit_duration(&mut self, value: TimeDelta) -> Result<(), Error> {
        self.push(format!("duration {value}"))
    }
    fn emit_error(&mut self, message: &str) -> Result<(), Error> {
        self.push(format!("error {message}"))
    }
    fn array_begin(&mut self, len: isize) -> Result<(), Error> {
        self.push(format!("array_begin {len}"))
    }
    fn array_next(&mut self) -> Result<(), Error> {
        self.push("array_next")
    }
    fn array_end(&mut self) -> Result<(), Error> {
        self.push("array_end")
    }
    fn map_begin(&mut self, len: isize) -> Result<(), Error> {
        self.push(format!("map_begin {len}"))
    }
    fn map_value(&mut self) -> Result<(), Error> {
        self.push("map_value")
    }
    fn map_next(&mut self) -> Result<(), Error> {
        self.push("map_next")
    }
    fn map_end(&mut self) -> Result<(), Error> {
        self.push("map_end")
    }
}

/// A reader that records the aggregate calls it forwards.
struct Tracing<'v> {
    inner: ValueReader<'v>,
    calls: Vec<String>,
}

impl<'v> Tracing<'v> {
    fn new(inner: ValueReader<'v>) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }
}

impl Reader for Tracing<'_> {
    fn kind(&mut self) -> Result<Kind, Error> {
        self.inner.kind()
    }
    fn nil(&mut self) -> Result<(), Error> {
        self.calls.push("nil".into());
        self.inner.nil()
    }
    fn bool(&mut self) -> Result<bool, Error> {
        self.inner.bool()
    }
    fn int64(&mut self) -> Result<i64, Error> {
        self.inner.int64()
    }
    fn uint64(&mut self) -> Result<u64, Error> {
        let value = self.inner.uint64()?;
        self.calls.push(format!("uint {value}"));
        Ok(value)
    }
    fn float64(&mut self) -> Result<f64, Error> {
        self.inner.float64()
    }
    fn string(&mut self) -> Result<String, Error> {
        let value = self.inner.string()?;
        self.calls.push(format!("string {value}"));
        Ok(value)
    }
    fn bytes(&mut self) -> Result<Bytes, Error> {
        self.inner.bytes()
    }
    fn time(&mut self) -> Result<DateTime<Utc>, Error> {
        self.inner.time()
    }
    fn duration(&mut self) -> Result<TimeDelta, Error> {
        self.inner.duration()
    }
    fn error(&mut self) -> Result<String, Error> {
        self.inner.error()
    }
    fn array_begin(&mut self) -> Result<isize, Error> {
        let len = self.inner.array_begin()?;
        self.calls.push(format!("array_begin {len}"));
        Ok(len)
    }
    fn array_next(&mut self, index: usize) -> Result<Next, Error> {
        let next = self.inner.array_next(index)?;
        self.calls.push(format!("array_next {index} {next:?}"));
        Ok(next)
    }
    fn array_end(&mut self, count: usize) -> Result<(), Error> {
        self.calls.push(format!("array_end {count}"));
        self.inner.array_end(count)
    }
    fn map_begin(&mut self) -> Result<isize, Error> {
        let len = self.inner.map_begin()?;
        self.calls.push(format!("map_begin {len}"));
        Ok(len)
    }
    fn map_value(&mut self, index: usize) -> Result<(), Error> {
        self.calls.push(format!("map_value {index}"));
        self.inner.map_value(index)
    }
    fn map_next(&mut self, index: usize) -> Result<Next, Error> {
        let next = self.inner.map_next(index)?;
        self.calls.push(format!("map_next {index} {next:?}"));
        Ok(next)
    }
    fn map_end(&mut self, count: usize) -> Result<(), Error> {
        self.calls.push(format!("map_end {count}"));
        self.inner.map_end(count)
    }
}

#[test]
fn test_encode_separators() {
    let value = BTreeMap::from([("a", vec![1u32, 2]), ("b", vec![])]);
    let mut recorder = Recorder::default();
    encode(&mut recorder, &value).unwrap();
    assert_eq!(
        recorder.calls,
        [
            "map_begin 2",
            "string a",
            "map_value",
            "array_begin 2",
            "uint 1",
            "array_next",
            "uint 2",
            "array_end",
            "map_next",
            "string b",
            "map_value",
            "array_begin 0",
            "array_end",
            "map_end",
        ]
    );
}

#[test]
fn test_encode_nested_maps() {
    // One separator per pair, issued by whichever call opens the value
    let inner = BTreeMap::from([("x", Some(1u8)), ("y", None)]);
    let outer = BTreeMap::from([("k", inner)]);
    let mut recorder = Recorder::default();
    encode(&mut recorder, &outer).unwrap();
    assert_eq!(
        recorder.calls,
        [
            "map_begin 1",
            "string k",
            "map_value",
            "map_begin 2",
            "string x",
            "map_value",
            "uint 1",
            "map_next",
            "string y",
            "map_value",
            "nil",
            "map_end",
            "map_end",
        ]
    );
}

#[test]
fn test_encode_sorted_keys() {
    let value = HashMap::from([(3u16, "c"), (1, "a"), (2, "b")]);
    let mut recorder = Recorder::default();
    let mut enc = Encoder::with_config(&mut recorder, EncodeConfig::default().with_sort_keys(true));
    enc.encode(&value).unwrap();
    let keys: Vec<_> = recorder
        .calls
        .iter()
        .filter(|call| call.starts_with("uint"))
        .cloned()
        .collect();
    assert_eq!(keys, ["uint 1", "uint 2", "uint 3"]);
}

#[test]
fn test_decode_unknown_length_empty() {
    let wire = Value::Array(vec![]);
    let mut reader = Tracing::new(ValueReader::new(&wire).with_unknown_lengths());
    let mut dst = vec![7u32];
    decode(&mut reader, &mut dst).unwrap();
    assert!(dst.is_empty());
    assert_eq!(
        reader.calls,
        ["array_begin -1", "array_next 0 End", "array_end 0"]
    );
}

#[test]
fn test_decode_unknown_length_map() {
    let wire = Value::Map(vec![
        (Value::from("a"), Value::Uint(1)),
        (Value::from("b"), Value::Uint(2)),
    ]);
    let mut reader = Tracing::new(ValueReader::new(&wire).with_unknown_lengths());
    let mut dst = BTreeMap::<String, u64>::new();
    decode(&mut reader, &mut dst).unwrap();
    assert_eq!(dst, BTreeMap::from([("a".into(), 1), ("b".into(), 2)]));
    assert_eq!(
        reader.calls,
        [
            "map_begin -1",
            "map_next 0 Item",
            "string a",
            "map_value 0",
            "uint 1",
            "map_next 1 Item",
            "string b",
            "map_value 1",
            "uint 2",
            "map_next 2 End",
            "map_end 2",
        ]
    );
}

#[test]
fn test_decode_known_length() {
    let wire = Value::Array(vec![Value::Uint(4), Value::Uint(5)]);
    let mut reader = Tracing::new(ValueReader::new(&wire));
    let mut dst = Vec::<u16>::new();
    decode(&mut reader, &mut dst).unwrap();
    assert_eq!(dst, [4, 5]);
    assert_eq!(
        reader.calls,
        [
            "array_begin 2",
            "uint 4",
            "array_next 1 Item",
            "uint 5",
            "array_end 2",
        ]
    );
}

#[test]
fn test_decode_skipped_value_consumes_separator() {
    let wire = Value::Map(vec![
        (Value::from("skip"), Value::Array(vec![Value::Nil])),
        (Value::from("keep"), Value::Uint(3)),
    ]);
    let mut reader = Tracing::new(ValueReader::new(&wire));
    let mut dec = Decoder::new(&mut reader);
    let mut kept = 0u64;
    let count = dec
        .decode_map(
            |dec| {
                let mut key = String::new();
                dec.decode_string(&mut key)?;
                Ok(key)
            },
            |dec, key| match key.as_str() {
                "keep" => dec.decode(&mut kept),
                _ => dec.skip(),
            },
        )
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(kept, 3);
    assert!(reader.inner.is_done());
    assert_eq!(
        reader.calls.iter().filter(|c| c.starts_with("map_value")).count(),
        2
    );
}
