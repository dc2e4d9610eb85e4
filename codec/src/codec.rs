//! Core contracts: the backend-facing [Reader] and [Writer], and the value-facing [Encode] and
//! [Decode] capabilities.

use crate::{Decoder, Encoder, Error, Kind};
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

/// Outcome of advancing an aggregate cursor with [Reader::array_next] or [Reader::map_next].
///
/// [Next::End] is the sentinel that terminates an unknown-length traversal. It is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Next {
    /// Another element (or key/value pair) follows.
    Item,
    /// The aggregate is exhausted.
    End,
}

/// Pull-based contract implemented by a format backend.
///
/// The engine first asks for the [Kind] of the next value and then makes exactly one matching
/// extraction call. Aggregates are read with a begin/next/end triad:
///
/// - `array_begin` / `map_begin` return a length hint; a negative hint means the length is not
///   known in advance.
/// - For a known length `n`, `*_next` is called once between consecutive elements (never before
///   the first).
/// - For an unknown length, `*_next` is called before every element, including the first, and
///   the traversal stops when it returns [Next::End].
/// - `map_value` consumes the separator between a key and its value, exactly once per pair.
pub trait Reader {
    /// Reports the kind of the next value without consuming it.
    ///
    /// Must be callable any number of times until the matching extraction call is made.
    fn kind(&mut self) -> Result<Kind, Error>;

    fn nil(&mut self) -> Result<(), Error>;
    fn bool(&mut self) -> Result<bool, Error>;
    fn int64(&mut self) -> Result<i64, Error>;
    fn uint64(&mut self) -> Result<u64, Error>;
    fn float64(&mut self) -> Result<f64, Error>;
    fn string(&mut self) -> Result<String, Error>;
    fn bytes(&mut self) -> Result<Bytes, Error>;
    fn time(&mut self) -> Result<DateTime<Utc>, Error>;
    fn duration(&mut self) -> Result<TimeDelta, Error>;

    /// Reads an error value, returning its message.
    fn error(&mut self) -> Result<String, Error>;

    fn array_begin(&mut self) -> Result<isize, Error>;
    fn array_next(&mut self, index: usize) -> Result<Next, Error>;
    fn array_end(&mut self, count: usize) -> Result<(), Error>;

    fn map_begin(&mut self) -> Result<isize, Error>;
    fn map_value(&mut self, index: usize) -> Result<(), Error>;
    fn map_next(&mut self, index: usize) -> Result<Next, Error>;
    fn map_end(&mut self, count: usize) -> Result<(), Error>;
}

/// Push-based contract implemented by a format backend; the mirror of [Reader].
///
/// The encode engine calls `array_next` / `map_next` only between elements, and `map_value`
/// once between each key and its value. A negative length passed to `array_begin` /
/// `map_begin` means the number of elements is not known in advance.
pub trait Writer {
    fn emit_nil(&mut self) -> Result<(), Error>;
    fn emit_bool(&mut self, value: bool) -> Result<(), Error>;
    fn emit_int64(&mut self, value: i64) -> Result<(), Error>;
    fn emit_uint64(&mut self, value: u64) -> Result<(), Error>;
    fn emit_float64(&mut self, value: f64) -> Result<(), Error>;
    fn emit_string(&mut self, value: &str) -> Result<(), Error>;
    fn emit_bytes(&mut self, value: &[u8]) -> Result<(), Error>;
    fn emit_time(&mut self, value: DateTime<Utc>) -> Result<(), Error>;
    fn emit_duration(&mut self, value: TimeDelta) -> Result<(), Error>;
    fn emit_error(&mut self, message: &str) -> Result<(), Error>;

    fn array_begin(&mut self, len: isize) -> Result<(), Error>;
    fn array_next(&mut self) -> Result<(), Error>;
    fn array_end(&mut self) -> Result<(), Error>;

    fn map_begin(&mut self, len: isize) -> Result<(), Error>;
    fn map_value(&mut self) -> Result<(), Error>;
    fn map_next(&mut self) -> Result<(), Error>;
    fn map_end(&mut self) -> Result<(), Error>;
}

/// Static shape of a decode destination.
///
/// Every implementation provided by this crate reports the strategy it uses. A type that
/// implements [Decode] itself keeps the default, [Shape::Custom], and the engine then defers to
/// it unconditionally (see the `Option<T>` implementation).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Time,
    Duration,
    Error,
    FixedArray,
    Array,
    Map,
    Record,
    Indirect,
    Dynamic,
    Custom,
    Unsupported,
}

/// Ordering key a map key exposes when key sorting is enabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SortKey<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(&'a str),
}

/// A value that can drive a [Writer] through an [Encoder].
///
/// The trait is object-safe: records and the sequence abstraction hand values around as
/// `&dyn Encode`.
pub trait Encode {
    /// Encodes the value.
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error>;

    /// Whether the value is the empty value for its kind (consulted by `omitempty`).
    fn is_empty_value(&self) -> bool {
        false
    }

    /// Whether the value is the zero value for its type (consulted by `omitzero`).
    fn is_zero_value(&self) -> bool {
        false
    }

    /// Key used to order map entries when [crate::EncodeConfig::sort_keys] is set.
    fn sort_key(&self) -> Option<SortKey<'_>> {
        None
    }

    /// Encodes a contiguous run of values.
    ///
    /// Overridden by `u8` so byte sequences are emitted as [Kind::Bytes] rather than as an
    /// array of integers.
    #[doc(hidden)]
    fn encode_slice(items: &[Self], enc: &mut Encoder<'_>) -> Result<(), Error>
    where
        Self: Sized,
    {
        enc.encode_sequence(&mut crate::sequence::Indexed::new(items))
    }
}

/// A destination that can be populated from a [Reader] through a [Decoder].
pub trait Decode {
    /// Decodes into `self`, overwriting its current contents.
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error>;

    /// The strategy this type decodes with.
    fn shape() -> Shape
    where
        Self: Sized,
    {
        Shape::Custom
    }

    /// Decodes a growable sequence of values.
    ///
    /// Overridden by `u8` so byte destinations read [Kind::Bytes].
    #[doc(hidden)]
    fn decode_vec(dst: &mut Vec<Self>, dec: &mut Decoder<'_>) -> Result<(), Error>
    where
        Self: Sized + Default,
    {
        dec.decode_growable(dst)
    }

    /// Decodes into fixed slots by position.
    #[doc(hidden)]
    fn decode_fixed(dst: &mut [Self], dec: &mut Decoder<'_>) -> Result<(), Error>
    where
        Self: Sized + Default,
    {
        dec.decode_slots(dst)
    }
}
