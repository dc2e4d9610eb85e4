//! An in-memory value tree and the backend that reads and writes it.
//!
//! [Value] mirrors the kind model one variant per kind, so any wire value can be decoded
//! without a static destination. [ValueWriter] and [ValueReader] implement the backend
//! contracts over a [Value] and enforce their call protocol: a separator issued out of place
//! or a value read before its separator fails with [Error::Protocol].

use crate::{
    config::DecodeConfig,
    decoder::Decoder,
    encode,
    sequence::{Indexed, IndexedPairs},
    Decode, Encode, Encoder, Error, Kind, Next, Reader, Shape, SortKey, Writer,
};
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

/// A dynamically typed wire value.
///
/// Maps keep their pairs in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    Time(DateTime<Utc>),
    Duration(TimeDelta),
    Error(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Uint(_) => Kind::Uint,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Bytes(_) => Kind::Bytes,
            Value::Time(_) => Kind::Time,
            Value::Duration(_) => Kind::Duration,
            Value::Error(_) => Kind::Error,
            Value::Array(_) => Kind::Array,
            Value::Map(_) => Kind::Map,
        }
    }

    /// Looks up the value of the first pair whose key is the string `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let Value::Map(pairs) = self else {
            return None;
        };
        pairs
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if s == key))
            .map(|(_, v)| v)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Uint(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        match self {
            Value::Nil => enc.emit_nil(),
            Value::Bool(v) => enc.emit_bool(*v),
            Value::Int(v) => enc.emit_int64(*v),
            Value::Uint(v) => enc.emit_uint64(*v),
            Value::Float(v) => enc.emit_float64(*v),
            Value::String(v) => enc.emit_string(v),
            Value::Bytes(v) => enc.emit_bytes(v),
            Value::Time(v) => enc.emit_time(*v),
            Value::Duration(v) => enc.emit_duration(*v),
            Value::Error(v) => enc.emit_error(v),
            Value::Array(items) => enc.encode_sequence(&mut Indexed::new(items)),
            Value::Map(pairs) => enc.encode_mapping(&mut IndexedPairs::new(pairs)),
        }
    }

    fn is_empty_value(&self) -> bool {
        match self {
            Value::Nil => true,
            Value::Bool(v) => !v,
            Value::Int(v) => *v == 0,
            Value::Uint(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::String(v) | Value::Error(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Duration(v) => v.is_zero(),
            Value::Time(_) => false,
            Value::Array(v) => v.is_empty(),
            Value::Map(v) => v.is_empty(),
        }
    }

    fn is_zero_value(&self) -> bool {
        match self {
            Value::Time(v) => v.is_zero_value(),
            other => other.is_empty_value(),
        }
    }

    fn sort_key(&self) -> Option<SortKey<'_>> {
        match self {
            Value::Int(v) => Some(SortKey::Int(*v)),
            Value::Uint(v) => Some(SortKey::Uint(*v)),
            Value::Float(v) => Some(SortKey::Float(*v)),
            Value::String(v) => Some(SortKey::String(v)),
            _ => None,
        }
    }
}

impl Decode for Value {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        *self = match dec.kind()? {
            Kind::Nil => {
                dec.nil()?;
                Value::Nil
            }
            Kind::Bool => Value::Bool(dec.bool()?),
            Kind::Int => Value::Int(dec.int64()?),
            Kind::Uint => Value::Uint(dec.uint64()?),
            Kind::Float => Value::Float(dec.float64()?),
            Kind::String => Value::String(dec.string()?),
            Kind::Bytes => Value::Bytes(dec.bytes()?),
            Kind::Time => Value::Time(dec.time()?),
            Kind::Duration => Value::Duration(dec.duration()?),
            Kind::Error => Value::Error(dec.error()?),
            Kind::Array => {
                let mut items = Vec::new();
                dec.decode_array(|dec, _| {
                    let mut item = Value::Nil;
                    dec.decode(&mut item)?;
                    items.push(item);
                    Ok(())
                })?;
                Value::Array(items)
            }
            Kind::Map => {
                let mut pairs = Vec::new();
                dec.decode_map(
                    |dec| {
                        let mut key = Value::Nil;
                        dec.decode(&mut key)?;
                        Ok(key)
                    },
                    |dec, key| {
                        let mut value = Value::Nil;
                        dec.decode(&mut value)?;
                        pairs.push((key, value));
                        Ok(())
                    },
                )?;
                Value::Map(pairs)
            }
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Dynamic
    }
}

/// Encodes `value` into a [Value].
pub fn to_value<T: Encode + ?Sized>(value: &T) -> Result<Value, Error> {
    let mut writer = ValueWriter::new();
    encode(&mut writer, value)?;
    writer.finish()
}

/// Decodes a fresh `T` from `value`.
pub fn from_value<T: Decode + Default>(value: &Value) -> Result<T, Error> {
    let mut dst = T::default();
    decode_into(value, &mut dst)?;
    Ok(dst)
}

/// Decodes `value` into an existing destination.
pub fn decode_into<T: Decode + ?Sized>(value: &Value, dst: &mut T) -> Result<(), Error> {
    let mut reader = ValueReader::new(value);
    Decoder::with_config(&mut reader, DecodeConfig::default()).decode(dst)
}

#[derive(Debug)]
enum WriteFrame {
    Array(Vec<Value>),
    Map {
        pairs: Vec<(Value, Value)>,
        key: Option<Value>,
        separated: bool,
    },
}

/// A [Writer] that builds a [Value].
#[derive(Debug, Default)]
pub struct ValueWriter {
    stack: Vec<WriteFrame>,
    root: Option<Value>,
}

impl ValueWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written value and resets the writer.
    pub fn finish(&mut self) -> Result<Value, Error> {
        if !self.stack.is_empty() {
            return Err(Error::Protocol("unterminated aggregate"));
        }
        self.root.take().ok_or(Error::Protocol("no value written"))
    }

    fn push(&mut self, value: Value) -> Result<(), Error> {
        match self.stack.last_mut() {
            None if self.root.is_some() => Err(Error::Protocol("multiple top-level values")),
            None => {
                self.root = Some(value);
                Ok(())
            }
            Some(WriteFrame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(WriteFrame::Map {
                pairs,
                key,
                separated,
            }) => match key.take() {
                None => {
                    *key = Some(value);
                    Ok(())
                }
                Some(_) if !*separated => Err(Error::Protocol("map value before separator")),
                Some(k) => {
                    pairs.push((k, value));
                    *separated = false;
                    Ok(())
                }
            },
        }
    }
}

impl Writer for ValueWriter {
    fn emit_nil(&mut self) -> Result<(), Error> {
        self.push(Value::Nil)
    }

    fn emit_bool(&mut self, value: bool) -> Result<(), Error> {
        self.push(Value::Bool(value))
    }

    fn emit_int64(&mut self, value: i64) -> Result<(), Error> {
        self.push(Value::Int(value))
    }

    fn emit_uint64(&mut self, value: u64) -> Result<(), Error> {
        self.push(Value::Uint(value))
    }

    fn emit_float64(&mut self, value: f64) -> Result<(), Error> {
        self.push(Value::Float(value))
    }

    fn emit_string(&mut self, value: &str) -> Result<(), Error> {
        self.push(Value::from(value))
    }

    fn emit_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.push(Value::Bytes(Bytes::copy_from_slice(value)))
    }

    fn emit_time(&mut self, value: DateTime<Utc>) -> Result<(), Error> {
        self.push(Value::Time(value))
    }

    fn emit_duration(&mut self, value: TimeDelta) -> Result<(), Error> {
        self.push(Value::Duration(value))
    }

    fn emit_error(&mut self, message: &str) -> Result<(), Error> {
        self.push(Value::Error(message.to_string()))
    }

    fn array_begin(&mut self, len: isize) -> Result<(), Error> {
        let capacity = usize::try_from(len).unwrap_or(0);
        self.stack.push(WriteFrame::Array(Vec::with_capacity(
            capacity.min(DecodeConfig::MAX_PREALLOC),
        )));
        Ok(())
    }

    fn array_next(&mut self) -> Result<(), Error> {
        match self.stack.last() {
            Some(WriteFrame::Array(items)) if !items.is_empty() => Ok(()),
            _ => Err(Error::Protocol("array_next out of place")),
        }
    }

    fn array_end(&mut self) -> Result<(), Error> {
        match self.stack.pop() {
            Some(WriteFrame::Array(items)) => self.push(Value::Array(items)),
            _ => Err(Error::Protocol("array_end without array")),
        }
    }

    fn map_begin(&mut self, len: isize) -> Result<(), Error> {
        let capacity = usize::try_from(len).unwrap_or(0);
        self.stack.push(WriteFrame::Map {
            pairs: Vec::with_capacity(capacity.min(DecodeConfig::MAX_PREALLOC)),
            key: None,
            separated: false,
        });
        Ok(())
    }

    fn map_value(&mut self) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(WriteFrame::Map {
                key: Some(_),
                separated,
                ..
            }) if !*separated => {
                *separated = true;
                Ok(())
            }
            _ => Err(Error::Protocol("map_value out of place")),
        }
    }

    fn map_next(&mut self) -> Result<(), Error> {
        match self.stack.last() {
            Some(WriteFrame::Map {
                pairs, key: None, ..
            }) if !pairs.is_empty() => Ok(()),
            _ => Err(Error::Protocol("map_next out of place")),
        }
    }

    fn map_end(&mut self) -> Result<(), Error> {
        match self.stack.pop() {
            Some(WriteFrame::Map {
                pairs, key: None, ..
            }) => self.push(Value::Map(pairs)),
            _ => Err(Error::Protocol("map_end without complete map")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Key,
    Separator,
    Value,
}

#[derive(Debug)]
enum ReadFrame<'v> {
    Array {
        items: &'v [Value],
        pos: usize,
    },
    Map {
        pairs: &'v [(Value, Value)],
        pos: usize,
        slot: Slot,
    },
}

/// A [Reader] over a borrowed [Value].
///
/// With [ValueReader::with_unknown_lengths], aggregates report a negative length hint and
/// signal their end through `*_next`, the way a streaming format would.
#[derive(Debug)]
pub struct ValueReader<'v> {
    root: Option<&'v Value>,
    stack: Vec<ReadFrame<'v>>,
    unknown_lengths: bool,
}

impl<'v> ValueReader<'v> {
    pub fn new(value: &'v Value) -> Self {
        Self {
            root: Some(value),
            stack: Vec::new(),
            unknown_lengths: false,
        }
    }

    /// Hides aggregate lengths from the engine.
    pub fn with_unknown_lengths(mut self) -> Self {
        self.unknown_lengths = true;
        self
    }

    /// Returns true once the root value has been fully consumed.
    pub fn is_done(&self) -> bool {
        self.root.is_none() && self.stack.is_empty()
    }

    fn hint(&self, len: usize) -> isize {
        if self.unknown_lengths {
            -1
        } else {
            isize::try_from(len).unwrap_or(isize::MAX)
        }
    }

    fn peek(&self) -> Result<&'v Value, Error> {
        match self.stack.last() {
            None => self.root.ok_or(Error::EndOfBuffer),
            Some(ReadFrame::Array { items, pos }) => items.get(*pos).ok_or(Error::EndOfBuffer),
            Some(ReadFrame::Map { pairs, pos, slot }) => {
                let (key, value) = pairs.get(*pos).ok_or(Error::EndOfBuffer)?;
                match slot {
                    Slot::Key => Ok(key),
                    Slot::Separator => Err(Error::Protocol("map value read before separator")),
                    Slot::Value => Ok(value),
                }
            }
        }
    }

    fn advance(&mut self) {
        match self.stack.last_mut() {
            None => self.root = None,
            Some(ReadFrame::Array { pos, .. }) => *pos += 1,
            Some(ReadFrame::Map { pos, slot, .. }) => match slot {
                Slot::Key => *slot = Slot::Separator,
                Slot::Separator | Slot::Value => {
                    *slot = Slot::Key;
                    *pos += 1;
                }
            },
        }
    }

    fn take<T>(&mut self, want: Kind, extract: impl FnOnce(&'v Value) -> Option<T>) -> Result<T, Error> {
        let value = self.peek()?;
        let out = extract(value).ok_or(Error::conversion(value.kind(), want))?;
        self.advance();
        Ok(out)
    }

    fn remaining(&self) -> Option<(usize, usize)> {
        match self.stack.last()? {
            ReadFrame::Array { items, pos } => Some((items.len(), *pos)),
            ReadFrame::Map { pairs, pos, .. } => Some((pairs.len(), *pos)),
        }
    }
}

impl Reader for ValueReader<'_> {
    fn kind(&mut self) -> Result<Kind, Error> {
        self.peek().map(Value::kind)
    }

    fn nil(&mut self) -> Result<(), Error> {
        self.take(Kind::Nil, |v| matches!(v, Value::Nil).then_some(()))
    }

    fn bool(&mut self) -> Result<bool, Error> {
        self.take(Kind::Bool, |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })
    }

    fn int64(&mut self) -> Result<i64, Error> {
        self.take(Kind::Int, |v| match v {
            Value::Int(i) => Some(*i),
            _ => None,
        })
    }

    fn uint64(&mut self) -> Result<u64, Error> {
        self.take(Kind::Uint, |v| match v {
            Value::Uint(u) => Some(*u),
            _ => None,
        })
    }

    fn float64(&mut self) -> Result<f64, Error> {
        self.take(Kind::Float, |v| match v {
            Value::Float(f) => Some(*f),
            _ => None,
        })
    }

    fn string(&mut self) -> Result<String, Error> {
        self.take(Kind::String, |v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    fn bytes(&mut self) -> Result<Bytes, Error> {
        self.take(Kind::Bytes, |v| match v {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        })
    }

    fn time(&mut self) -> Result<DateTime<Utc>, Error> {
        self.take(Kind::Time, |v| match v {
            Value::Time(t) => Some(*t),
            _ => None,
        })
    }

    fn duration(&mut self) -> Result<TimeDelta, Error> {
        self.take(Kind::Duration, |v| match v {
            Value::Duration(d) => Some(*d),
            _ => None,
        })
    }

    fn error(&mut self) -> Result<String, Error> {
        self.take(Kind::Error, |v| match v {
            Value::Error(e) => Some(e.clone()),
            _ => None,
        })
    }

    fn array_begin(&mut self) -> Result<isize, Error> {
        let items = self.take(Kind::Array, |v| match v {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        })?;
        self.stack.push(ReadFrame::Array { items, pos: 0 });
        Ok(self.hint(items.len()))
    }

    fn array_next(&mut self, _: usize) -> Result<Next, Error> {
        match self.remaining() {
            Some((len, pos)) if pos < len => Ok(Next::Item),
            _ => Ok(Next::End),
        }
    }

    fn array_end(&mut self, _: usize) -> Result<(), Error> {
        match self.stack.pop() {
            Some(ReadFrame::Array { .. }) => Ok(()),
            _ => Err(Error::Protocol("array_end without array")),
        }
    }

    fn map_begin(&mut self) -> Result<isize, Error> {
        let pairs = self.take(Kind::Map, |v| match v {
            Value::Map(pairs) => Some(pairs.as_slice()),
            _ => None,
        })?;
        self.stack.push(ReadFrame::Map {
            pairs,
            pos: 0,
            slot: Slot::Key,
        });
        Ok(self.hint(pairs.len()))
    }

    fn map_value(&mut self, _: usize) -> Result<(), Error> {
        match self.stack.last_mut() {
            Some(ReadFrame::Map { slot, .. }) if *slot == Slot::Separator => {
                *slot = Slot::Value;
                Ok(())
            }
            _ => Err(Error::Protocol("map_value out of place")),
        }
    }

    fn map_next(&mut self, _: usize) -> Result<Next, Error> {
        match self.remaining() {
            Some((len, pos)) if pos < len => Ok(Next::Item),
            _ => Ok(Next::End),
        }
    }

    fn map_end(&mut self, _: usize) -> Result<(), Error> {
        match self.stack.pop() {
            Some(ReadFrame::Map { .. }) => Ok(()),
            _ => Err(Error::Protocol("map_end without map")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_value;

    fn sample() -> Value {
        Value::Map(vec![
            (Value::from("name"), Value::from("gauge")),
            (
                Value::from("samples"),
                Value::Array(vec![Value::Float(0.5), Value::Nil, Value::Int(-3)]),
            ),
            (
                Value::from("nested"),
                Value::Map(vec![(Value::Uint(1), Value::Bytes(Bytes::from_static(b"x")))]),
            ),
            (Value::from("failure"), Value::Error("boom".into())),
        ])
    }

    #[test]
    fn test_dynamic_round_trip() {
        let value = sample();
        assert_eq!(to_value(&value), Ok(value.clone()));
        assert_eq!(from_value::<Value>(&value), Ok(value.clone()));

        let mut reader = ValueReader::new(&value).with_unknown_lengths();
        assert_eq!(decode_value::<Value>(&mut reader), Ok(value.clone()));
        assert!(reader.is_done());
    }

    #[test]
    fn test_get() {
        let value = sample();
        assert_eq!(value.get("name"), Some(&Value::from("gauge")));
        assert_eq!(value.get("missing"), None);
        assert_eq!(Value::Nil.get("name"), None);
    }

    #[test]
    fn test_writer_protocol() {
        let mut writer = ValueWriter::new();
        writer.map_begin(1).unwrap();
        writer.emit_string("k").unwrap();
        assert_eq!(
            writer.emit_bool(true),
            Err(Error::Protocol("map value before separator"))
        );

        let mut writer = ValueWriter::new();
        assert_eq!(
            writer.array_next(),
            Err(Error::Protocol("array_next out of place"))
        );
        writer.emit_nil().unwrap();
        assert_eq!(
            writer.emit_nil(),
            Err(Error::Protocol("multiple top-level values"))
        );

        let mut writer = ValueWriter::new();
        writer.array_begin(-1).unwrap();
        assert_eq!(writer.finish(), Err(Error::Protocol("unterminated aggregate")));
    }

    #[test]
    fn test_reader_protocol() {
        let value = Value::Map(vec![(Value::from("k"), Value::Bool(true))]);
        let mut reader = ValueReader::new(&value);
        assert_eq!(reader.map_begin(), Ok(1));
        assert_eq!(reader.string(), Ok("k".to_string()));
        assert_eq!(
            reader.bool(),
            Err(Error::Protocol("map value read before separator"))
        );
        reader.map_value(0).unwrap();
        assert_eq!(reader.kind(), Ok(Kind::Bool));
        assert_eq!(reader.kind(), Ok(Kind::Bool));
        assert_eq!(
            reader.int64(),
            Err(Error::conversion(Kind::Bool, Kind::Int))
        );
        assert_eq!(reader.bool(), Ok(true));
        assert_eq!(reader.map_next(1), Ok(Next::End));
        reader.map_end(1).unwrap();
        assert!(reader.is_done());
    }

    #[test]
    fn test_unknown_length_first_next() {
        let value = Value::Array(vec![]);
        let mut reader = ValueReader::new(&value).with_unknown_lengths();
        assert_eq!(reader.array_begin(), Ok(-1));
        assert_eq!(reader.array_next(0), Ok(Next::End));
        reader.array_end(0).unwrap();
    }
}
