//! A compact, self-describing binary backend.
//!
//! Every value starts with a one-byte tag naming its kind:
//!
//! | Tag    | Kind     | Payload                                                |
//! |--------|----------|--------------------------------------------------------|
//! | `0x00` | Nil      | none                                                   |
//! | `0x01` | Bool     | one byte, `0` or `1`                                   |
//! | `0x02` | Int      | ZigZag varint                                          |
//! | `0x03` | Uint     | varint                                                 |
//! | `0x04` | Float    | big-endian `f64`                                       |
//! | `0x05` | String   | varint length, UTF-8 bytes                             |
//! | `0x06` | Bytes    | varint length, bytes                                   |
//! | `0x07` | Time     | ZigZag varint seconds, varint nanoseconds (since epoch)|
//! | `0x08` | Duration | ZigZag varint nanoseconds                              |
//! | `0x09` | Error    | varint length, UTF-8 message                           |
//! | `0x0A` | Array    | varint count, elements                                 |
//! | `0x0B` | Array    | elements, then `0x0E` (length unknown when written)    |
//! | `0x0C` | Map      | varint count, key/value pairs                          |
//! | `0x0D` | Map      | key/value pairs, then `0x0E`                           |
//! | `0x0E` | -        | end of a streamed aggregate                            |
//!
//! Separators are implicit; `array_next`, `map_next` and `map_value` write nothing.

use crate::{
    config::{DecodeConfig, EncodeConfig},
    util::at_least,
    varint, Decode, Decoder, Encode, Encoder, Error, Kind, Next, RangeCfg, Reader, Writer,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};

const NIL: u8 = 0x00;
const BOOL: u8 = 0x01;
const INT: u8 = 0x02;
const UINT: u8 = 0x03;
const FLOAT: u8 = 0x04;
const STRING: u8 = 0x05;
const BYTES: u8 = 0x06;
const TIME: u8 = 0x07;
const DURATION: u8 = 0x08;
const ERROR: u8 = 0x09;
const ARRAY: u8 = 0x0A;
const ARRAY_STREAM: u8 = 0x0B;
const MAP: u8 = 0x0C;
const MAP_STREAM: u8 = 0x0D;
const END: u8 = 0x0E;

/// Encodes `value` into a new buffer.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Result<Bytes, Error> {
    to_bytes_with(value, EncodeConfig::default())
}

pub fn to_bytes_with<T: Encode + ?Sized>(value: &T, config: EncodeConfig) -> Result<Bytes, Error> {
    let mut writer = BinaryWriter::new(BytesMut::new());
    Encoder::with_config(&mut writer, config).encode(value)?;
    Ok(writer.into_inner().freeze())
}

/// Decodes a `T` from `buf`, which must contain exactly one value.
pub fn from_bytes<T: Decode + Default>(buf: impl Buf) -> Result<T, Error> {
    from_bytes_with(buf, DecodeConfig::default())
}

pub fn from_bytes_with<T: Decode + Default>(buf: impl Buf, config: DecodeConfig) -> Result<T, Error> {
    let mut reader = BinaryReader::new(buf);
    let mut value = T::default();
    Decoder::with_config(&mut reader, config).decode(&mut value)?;
    let remaining = reader.buf.remaining();
    if remaining > 0 {
        return Err(Error::ExtraData(remaining));
    }
    Ok(value)
}

fn write_len(len: usize, buf: &mut impl BufMut) -> Result<(), Error> {
    let len = u64::try_from(len).map_err(|_| Error::InvalidLength(len))?;
    varint::write(len, buf);
    Ok(())
}

/// A [Writer] appending to any [BufMut].
#[derive(Debug)]
pub struct BinaryWriter<B: BufMut> {
    buf: B,
    /// Whether each open aggregate was begun with an unknown length.
    streaming: Vec<bool>,
}

impl<B: BufMut> BinaryWriter<B> {
    pub fn new(buf: B) -> Self {
        Self {
            buf,
            streaming: Vec::new(),
        }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }

    fn payload(&mut self, tag: u8, payload: &[u8]) -> Result<(), Error> {
        self.buf.put_u8(tag);
        write_len(payload.len(), &mut self.buf)?;
        self.buf.put_slice(payload);
        Ok(())
    }

    fn begin(&mut self, len: isize, known: u8, unknown: u8) -> Result<(), Error> {
        match usize::try_from(len) {
            Ok(len) => {
                self.buf.put_u8(known);
                write_len(len, &mut self.buf)?;
                self.streaming.push(false);
            }
            Err(_) => {
                self.buf.put_u8(unknown);
                self.streaming.push(true);
            }
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), Error> {
        match self.streaming.pop() {
            Some(true) => self.buf.put_u8(END),
            Some(false) => {}
            None => return Err(Error::Protocol("aggregate end without begin")),
        }
        Ok(())
    }
}

impl<B: BufMut> Writer for BinaryWriter<B> {
    fn emit_nil(&mut self) -> Result<(), Error> {
        self.buf.put_u8(NIL);
        Ok(())
    }

    fn emit_bool(&mut self, value: bool) -> Result<(), Error> {
        self.buf.put_u8(BOOL);
        self.buf.put_u8(value.into());
        Ok(())
    }

    fn emit_int64(&mut self, value: i64) -> Result<(), Error> {
        self.buf.put_u8(INT);
        varint::write_signed(value, &mut self.buf);
        Ok(())
    }

    fn emit_uint64(&mut self, value: u64) -> Result<(), Error> {
        self.buf.put_u8(UINT);
        varint::write(value, &mut self.buf);
        Ok(())
    }

    fn emit_float64(&mut self, value: f64) -> Result<(), Error> {
        self.buf.put_u8(FLOAT);
        self.buf.put_f64(value);
        Ok(())
    }

    fn emit_string(&mut self, value: &str) -> Result<(), Error> {
        self.payload(STRING, value.as_bytes())
    }

    fn emit_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.payload(BYTES, value)
    }

    fn emit_time(&mut self, value: DateTime<Utc>) -> Result<(), Error> {
        self.buf.put_u8(TIME);
        varint::write_signed(value.timestamp(), &mut self.buf);
        varint::write(value.timestamp_subsec_nanos(), &mut self.buf);
        Ok(())
    }

    fn emit_duration(&mut self, value: TimeDelta) -> Result<(), Error> {
        let nanos = value.num_nanoseconds().ok_or_else(|| {
            Error::InvalidData("duration", "exceeds the nanosecond range".to_string())
        })?;
        self.buf.put_u8(DURATION);
        varint::write_signed(nanos, &mut self.buf);
        Ok(())
    }

    fn emit_error(&mut self, message: &str) -> Result<(), Error> {
        self.payload(ERROR, message.as_bytes())
    }

    fn array_begin(&mut self, len: isize) -> Result<(), Error> {
        self.begin(len, ARRAY, ARRAY_STREAM)
    }

    fn array_next(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn array_end(&mut self) -> Result<(), Error> {
        self.end()
    }

    fn map_begin(&mut self, len: isize) -> Result<(), Error> {
        self.begin(len, MAP, MAP_STREAM)
    }

    fn map_value(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn map_next(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn map_end(&mut self) -> Result<(), Error> {
        self.end()
    }
}

/// A [Reader] consuming any [Buf].
#[derive(Debug)]
pub struct BinaryReader<B: Buf> {
    buf: B,
    max_len: RangeCfg<usize>,
    streaming: Vec<bool>,
}

impl<B: Buf> BinaryReader<B> {
    pub fn new(buf: B) -> Self {
        Self {
            buf,
            max_len: RangeCfg::from(..),
            streaming: Vec::new(),
        }
    }

    /// Limits the length of string, byte and error payloads.
    pub fn with_max_len(mut self, range: impl Into<RangeCfg<usize>>) -> Self {
        self.max_len = range.into();
        self
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn tag(&self) -> Result<u8, Error> {
        self.buf.chunk().first().copied().ok_or(Error::EndOfBuffer)
    }

    /// Consumes the tag of the next value, which must be of kind `want`.
    fn open(&mut self, want: Kind) -> Result<u8, Error> {
        let tag = self.tag()?;
        let kind = self.kind()?;
        if kind != want {
            return Err(Error::conversion(kind, want));
        }
        self.buf.advance(1);
        Ok(tag)
    }

    fn count(&mut self) -> Result<usize, Error> {
        let len = varint::read::<u64>(&mut self.buf)?;
        usize::try_from(len).map_err(|_| Error::InvalidLength(usize::MAX))
    }

    fn payload(&mut self, want: Kind) -> Result<Bytes, Error> {
        self.open(want)?;
        let len = self.count()?;
        if !self.max_len.contains(&len) {
            return Err(Error::InvalidLength(len));
        }
        at_least(&self.buf, len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    fn text(&mut self, want: Kind, context: &'static str) -> Result<String, Error> {
        let payload = self.payload(want)?;
        String::from_utf8(payload.to_vec()).map_err(|err| Error::InvalidData(context, err.to_string()))
    }

    fn begin(&mut self, want: Kind, known: u8) -> Result<isize, Error> {
        if self.open(want)? == known {
            let len = self.count()?;
            self.streaming.push(false);
            return isize::try_from(len).map_err(|_| Error::InvalidLength(len));
        }
        self.streaming.push(true);
        Ok(-1)
    }

    fn next(&mut self) -> Result<Next, Error> {
        match self.streaming.last() {
            Some(true) if self.tag()? == END => Ok(Next::End),
            Some(_) => Ok(Next::Item),
            None => Err(Error::Protocol("next outside aggregate")),
        }
    }

    fn end(&mut self) -> Result<(), Error> {
        match self.streaming.pop() {
            Some(true) => {
                if self.tag()? != END {
                    return Err(Error::InvalidData(
                        "aggregate",
                        "elements remain at end of stream".to_string(),
                    ));
                }
                self.buf.advance(1);
                Ok(())
            }
            Some(false) => Ok(()),
            None => Err(Error::Protocol("aggregate end without begin")),
        }
    }
}

impl<B: Buf> Reader for BinaryReader<B> {
    fn kind(&mut self) -> Result<Kind, Error> {
        Ok(match self.tag()? {
            NIL => Kind::Nil,
            BOOL => Kind::Bool,
            INT => Kind::Int,
            UINT => Kind::Uint,
            FLOAT => Kind::Float,
            STRING => Kind::String,
            BYTES => Kind::Bytes,
            TIME => Kind::Time,
            DURATION => Kind::Duration,
            ERROR => Kind::Error,
            ARRAY | ARRAY_STREAM => Kind::Array,
            MAP | MAP_STREAM => Kind::Map,
            tag => return Err(Error::InvalidTag(tag)),
        })
    }

    fn nil(&mut self) -> Result<(), Error> {
        self.open(Kind::Nil).map(drop)
    }

    fn bool(&mut self) -> Result<bool, Error> {
        self.open(Kind::Bool)?;
        at_least(&self.buf, 1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(Error::InvalidData("bool", format!("{byte:#04x}"))),
        }
    }

    fn int64(&mut self) -> Result<i64, Error> {
        self.open(Kind::Int)?;
        varint::read_signed::<u64, i64>(&mut self.buf)
    }

    fn uint64(&mut self) -> Result<u64, Error> {
        self.open(Kind::Uint)?;
        varint::read(&mut self.buf)
    }

    fn float64(&mut self) -> Result<f64, Error> {
        self.open(Kind::Float)?;
        at_least(&self.buf, 8)?;
        Ok(self.buf.get_f64())
    }

    fn string(&mut self) -> Result<String, Error> {
        self.text(Kind::String, "string")
    }

    fn bytes(&mut self) -> Result<Bytes, Error> {
        self.payload(Kind::Bytes)
    }

    fn time(&mut self) -> Result<DateTime<Utc>, Error> {
        self.open(Kind::Time)?;
        let secs = varint::read_signed::<u64, i64>(&mut self.buf)?;
        let nanos = varint::read::<u32>(&mut self.buf)?;
        DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| Error::InvalidData("time", format!("{secs}s {nanos}ns out of range")))
    }

    fn duration(&mut self) -> Result<TimeDelta, Error> {
        self.open(Kind::Duration)?;
        varint::read_signed::<u64, i64>(&mut self.buf).map(TimeDelta::nanoseconds)
    }

    fn error(&mut self) -> Result<String, Error> {
        self.text(Kind::Error, "error")
    }

    fn array_begin(&mut self) -> Result<isize, Error> {
        self.begin(Kind::Array, ARRAY)
    }

    fn array_next(&mut self, _: usize) -> Result<Next, Error> {
        self.next()
    }

    fn array_end(&mut self, _: usize) -> Result<(), Error> {
        self.end()
    }

    fn map_begin(&mut self) -> Result<isize, Error> {
        self.begin(Kind::Map, MAP)
    }

    fn map_value(&mut self, _: usize) -> Result<(), Error> {
        Ok(())
    }

    fn map_next(&mut self, _: usize) -> Result<Next, Error> {
        self.next()
    }

    fn map_end(&mut self, _: usize) -> Result<(), Error> {
        self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stream::StreamEncoder, value::Value};
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    #[test]
    fn test_scalar_layout() {
        assert_eq!(to_bytes(&true).unwrap(), Bytes::from_static(&[BOOL, 1]));
        assert_eq!(to_bytes(&-1i32).unwrap(), Bytes::from_static(&[INT, 0x01]));
        assert_eq!(to_bytes(&300u16).unwrap(), Bytes::from_static(&[UINT, 0xAC, 0x02]));
        assert_eq!(
            to_bytes("hi").unwrap(),
            Bytes::from_static(&[STRING, 2, b'h', b'i'])
        );
        assert_eq!(
            to_bytes(&1.0f64).unwrap(),
            Bytes::from_static(&[FLOAT, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0])
        );
        assert_eq!(to_bytes(&None::<u8>).unwrap(), Bytes::from_static(&[NIL]));
    }

    #[test]
    fn test_aggregate_layout() {
        assert_eq!(
            to_bytes(&vec![1u32, 2]).unwrap(),
            Bytes::from_static(&[ARRAY, 2, UINT, 1, UINT, 2])
        );
        let map: BTreeMap<String, bool> = [("a".to_string(), false)].into();
        assert_eq!(
            to_bytes(&map).unwrap(),
            Bytes::from_static(&[MAP, 1, STRING, 1, b'a', BOOL, 0])
        );
    }

    #[test]
    fn test_value_round_trip() {
        let time = Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 40).unwrap();
        let value = Value::Map(vec![
            (Value::from("nil"), Value::Nil),
            (Value::from("float"), Value::Float(-0.25)),
            (Value::from("bytes"), Value::Bytes(Bytes::from_static(&[0, 255]))),
            (Value::from("time"), Value::Time(time)),
            (Value::from("duration"), Value::Duration(TimeDelta::seconds(-3))),
            (Value::from("error"), Value::Error("bad".into())),
            (
                Value::Int(-7),
                Value::Array(vec![Value::Uint(u64::MAX), Value::Int(i64::MIN)]),
            ),
        ]);
        let encoded = to_bytes(&value).unwrap();
        assert_eq!(from_bytes::<Value>(encoded), Ok(value));
    }

    #[test]
    fn test_streamed_array() {
        let mut writer = BinaryWriter::new(Vec::new());
        let mut stream = StreamEncoder::new(&mut writer);
        stream.encode(&1u8).unwrap();
        stream.encode(&2u8).unwrap();
        stream.close().unwrap();
        let encoded = writer.into_inner();
        assert_eq!(encoded, vec![ARRAY_STREAM, UINT, 1, UINT, 2, END]);
        assert_eq!(from_bytes::<Vec<u16>>(&encoded[..]), Ok(vec![1, 2]));
        assert_eq!(from_bytes::<Vec<u16>>(&[ARRAY_STREAM, END][..]), Ok(vec![]));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(from_bytes::<u8>(&[][..]), Err(Error::EndOfBuffer));
        assert_eq!(from_bytes::<u8>(&[0x7F][..]), Err(Error::InvalidTag(0x7F)));
        assert_eq!(
            from_bytes::<bool>(&[BOOL, 2][..]),
            Err(Error::InvalidData("bool", "0x02".to_string()))
        );
        assert_eq!(
            from_bytes::<String>(&[STRING, 5, b'a'][..]),
            Err(Error::EndOfBuffer)
        );
        assert!(matches!(
            from_bytes::<String>(&[STRING, 1, 0xFF][..]),
            Err(Error::InvalidData("string", _))
        ));
        assert_eq!(from_bytes::<u8>(&[UINT, 1, NIL][..]), Err(Error::ExtraData(1)));
        assert_eq!(
            from_bytes::<Vec<u8>>(&[ARRAY_STREAM, UINT, 1][..]),
            Err(Error::EndOfBuffer)
        );
        assert_eq!(
            from_bytes::<u8>(&[INT, 0x01][..]),
            Err(Error::OutOfBounds { value: -1, ty: "u8" })
        );
    }

    #[test]
    fn test_deep_nesting() {
        let nested = vec![ARRAY_STREAM; 200_000];
        assert_eq!(
            from_bytes::<Value>(&nested[..]),
            Err(Error::DepthExceeded(DecodeConfig::DEFAULT_MAX_DEPTH))
        );
        let config = DecodeConfig::default().with_max_depth(8);
        assert_eq!(
            from_bytes_with::<Value>(&nested[..], config),
            Err(Error::DepthExceeded(8))
        );

        let mut shallow = vec![ARRAY_STREAM; 4];
        shallow.extend([END; 4]);
        assert!(from_bytes::<Value>(&shallow[..]).is_ok());
    }

    #[test]
    fn test_max_len() {
        let encoded = to_bytes("long string").unwrap();
        let mut reader = BinaryReader::new(encoded).with_max_len(..=4);
        let mut dst = String::new();
        assert_eq!(
            Decoder::new(&mut reader).decode(&mut dst),
            Err(Error::InvalidLength(11))
        );

        let huge = [ARRAY, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F];
        let config = DecodeConfig::default().with_max_len(..=1024);
        assert_eq!(
            from_bytes_with::<Vec<u8>>(&huge[..], config),
            Err(Error::InvalidLength(u32::MAX as usize))
        );
    }
}
