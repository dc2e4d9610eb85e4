//! The decode engine.
//!
//! A [Decoder] drives a [Reader] to populate a destination. Dispatch happens through the
//! destination's [Decode] implementation, which selects one of the strategies below
//! (scalars, growable and fixed sequences, associative collections, records, indirection).
//!
//! The decoder is also the traversal cursor: it carries the "pending separator" state of the
//! map being decoded. When the engine enters the value half of a key/value pair it does not
//! consume the separator immediately; the first primitive issued for the value does. A nested
//! aggregate therefore consumes its parent's separator exactly once, with the call that opens
//! it.

use crate::{
    config::DecodeConfig,
    num::{narrow_signed, narrow_unsigned, Float, Integer, Wide},
    record::{FieldCache, Record},
    Decode, Error, Kind, Next, Reader, Shape,
};
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};

/// Decodes one value from `reader` into `dst`.
pub fn decode<T: Decode + ?Sized>(reader: &mut dyn Reader, dst: &mut T) -> Result<(), Error> {
    Decoder::new(reader).decode(dst)
}

/// Decodes one value from `reader` into a fresh `T`.
pub fn decode_value<T: Decode + Default>(reader: &mut dyn Reader) -> Result<T, Error> {
    let mut value = T::default();
    decode(reader, &mut value)?;
    Ok(value)
}

/// Decode cursor over a [Reader].
///
/// A decoder is owned by a single in-flight decode; it is not meant to be shared.
pub struct Decoder<'r> {
    reader: &'r mut dyn Reader,
    config: DecodeConfig,
    /// Index of the map pair whose separator has not been consumed yet.
    pending: Option<usize>,
    /// Number of open arrays and maps.
    depth: usize,
}

macro_rules! forward {
    ($($(#[$doc:meta])* $name:ident -> $ret:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ret, Error> {
                self.separate()?;
                self.reader.$name()
            }
        )*
    };
}

impl<'r> Decoder<'r> {
    pub fn new(reader: &'r mut dyn Reader) -> Self {
        Self::with_config(reader, DecodeConfig::default())
    }

    pub fn with_config(reader: &'r mut dyn Reader, config: DecodeConfig) -> Self {
        Self {
            reader,
            config,
            pending: None,
            depth: 0,
        }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decodes the next value into `dst`.
    pub fn decode<T: Decode + ?Sized>(&mut self, dst: &mut T) -> Result<(), Error> {
        dst.decode(self)
    }

    /// Consumes the pending key/value separator, if any.
    fn separate(&mut self) -> Result<(), Error> {
        if let Some(index) = self.pending.take() {
            self.reader.map_value(index)?;
        }
        Ok(())
    }

    forward! {
        /// Kind of the next value.
        kind -> Kind;
        nil -> ();
        bool -> bool;
        int64 -> i64;
        uint64 -> u64;
        float64 -> f64;
        string -> String;
        bytes -> Bytes;
        time -> DateTime<Utc>;
        duration -> TimeDelta;
        /// Reads an error value, returning its message.
        error -> String;
    }

    /// Checks the kind of the next value against `want`.
    ///
    /// Returns `false` after consuming a nil, `true` if the next value has kind `want`, and a
    /// conversion error otherwise.
    pub fn present(&mut self, want: Kind) -> Result<bool, Error> {
        match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                Ok(false)
            }
            kind if kind == want => Ok(true),
            kind => Err(Error::conversion(kind, want)),
        }
    }

    /// Consumes the next value without storing it.
    pub fn skip(&mut self) -> Result<(), Error> {
        match self.kind()? {
            Kind::Nil => self.nil(),
            Kind::Bool => self.bool().map(drop),
            Kind::Int => self.int64().map(drop),
            Kind::Uint => self.uint64().map(drop),
            Kind::Float => self.float64().map(drop),
            Kind::String => self.string().map(drop),
            Kind::Bytes => self.bytes().map(drop),
            Kind::Time => self.time().map(drop),
            Kind::Duration => self.duration().map(drop),
            Kind::Error => self.error().map(drop),
            Kind::Array => self.decode_array(|dec, _| dec.skip()).map(drop),
            Kind::Map => self
                .decode_map(|dec| dec.skip(), |dec, ()| dec.skip())
                .map(drop),
        }
    }

    fn check_len(&self, len: isize) -> Result<(), Error> {
        if let Ok(len) = usize::try_from(len) {
            if !self.config.max_len.contains(&len) {
                return Err(Error::InvalidLength(len));
            }
        }
        Ok(())
    }

    /// Accounts for one more open aggregate.
    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.config.max_depth {
            return Err(Error::DepthExceeded(self.config.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn begin_array(&mut self) -> Result<isize, Error> {
        self.separate()?;
        self.enter()?;
        let len = self.reader.array_begin()?;
        self.check_len(len)?;
        Ok(len)
    }

    pub(crate) fn next_element(&mut self, index: usize) -> Result<Next, Error> {
        self.reader.array_next(index)
    }

    pub(crate) fn end_array(&mut self, count: usize) -> Result<(), Error> {
        self.reader.array_end(count)?;
        self.leave();
        Ok(())
    }

    fn array_elements(
        &mut self,
        len: isize,
        mut each: impl FnMut(&mut Self, usize) -> Result<(), Error>,
    ) -> Result<usize, Error> {
        let known = usize::try_from(len).ok();
        let mut count = 0;
        while known.map_or(true, |n| count < n) {
            if (count != 0 || known.is_none()) && self.next_element(count)? == Next::End {
                break;
            }
            each(self, count)?;
            count += 1;
        }
        self.end_array(count)?;
        Ok(count)
    }

    /// Drives the array triad, calling `each` with the index of every element.
    ///
    /// The next value must be an array. Returns the number of elements.
    pub fn decode_array(
        &mut self,
        each: impl FnMut(&mut Self, usize) -> Result<(), Error>,
    ) -> Result<usize, Error> {
        let len = self.begin_array()?;
        self.array_elements(len, each)
    }

    /// Drives the map triad.
    ///
    /// For every pair, `key` decodes the key and `value` decodes the value given the key. The
    /// separator between them is consumed by the first primitive `value` issues (or after it
    /// returns, if it issued none). The next value must be a map. Returns the number of pairs.
    pub fn decode_map<K>(
        &mut self,
        mut key: impl FnMut(&mut Self) -> Result<K, Error>,
        mut value: impl FnMut(&mut Self, K) -> Result<(), Error>,
    ) -> Result<usize, Error> {
        self.separate()?;
        self.enter()?;
        let len = self.reader.map_begin()?;
        self.check_len(len)?;

        let known = usize::try_from(len).ok();
        let mut count = 0;
        while known.map_or(true, |n| count < n) {
            if (count != 0 || known.is_none()) && self.reader.map_next(count)? == Next::End {
                break;
            }
            let k = key(self)?;
            self.pending = Some(count);
            value(self, k)?;
            self.separate()?;
            count += 1;
        }
        self.reader.map_end(count)?;
        self.leave();
        Ok(count)
    }

    pub fn decode_bool(&mut self, dst: &mut bool) -> Result<(), Error> {
        *dst = match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                false
            }
            Kind::Bool => self.bool()?,
            kind => return Err(Error::conversion(kind, Kind::Bool)),
        };
        Ok(())
    }

    /// Decodes an integer of either signedness into `dst`, checking bounds.
    pub fn decode_int<T: Integer>(&mut self, dst: &mut T) -> Result<(), Error> {
        *dst = match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                T::default()
            }
            Kind::Int => narrow_signed(self.int64()?)?,
            Kind::Uint => narrow_unsigned(self.uint64()?)?,
            kind => {
                let want = if T::SIGNED { Kind::Int } else { Kind::Uint };
                return Err(Error::conversion(kind, want));
            }
        };
        Ok(())
    }

    /// Decodes a float (or an exactly representable integer) into `dst`.
    pub fn decode_float<T: Float>(&mut self, dst: &mut T) -> Result<(), Error> {
        *dst = match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                T::default()
            }
            Kind::Float => T::from_wire(self.float64()?),
            Kind::Int => T::from_integer(Wide::Int(self.int64()?))?,
            Kind::Uint => T::from_integer(Wide::Uint(self.uint64()?))?,
            kind => return Err(Error::conversion(kind, Kind::Float)),
        };
        Ok(())
    }

    pub fn decode_string(&mut self, dst: &mut String) -> Result<(), Error> {
        match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                dst.clear();
            }
            Kind::String => *dst = self.string()?,
            Kind::Bytes => {
                let bytes = self.bytes()?;
                *dst = String::from_utf8(bytes.to_vec())
                    .map_err(|err| Error::InvalidData("string", err.to_string()))?;
            }
            kind => return Err(Error::conversion(kind, Kind::String)),
        }
        Ok(())
    }

    /// Reads a byte payload; nil yields an empty payload.
    pub fn decode_bytes(&mut self) -> Result<Bytes, Error> {
        match self.kind()? {
            Kind::Nil => {
                self.nil()?;
                Ok(Bytes::new())
            }
            Kind::Bytes => self.bytes(),
            Kind::String => Ok(Bytes::from(self.string()?)),
            kind => Err(Error::conversion(kind, Kind::Bytes)),
        }
    }

    /// Decodes a growable sequence, one freshly defaulted element at a time.
    ///
    /// A nil leaves `dst` empty.
    pub fn decode_growable<T: Decode + Default>(&mut self, dst: &mut Vec<T>) -> Result<(), Error> {
        dst.clear();
        if !self.present(Kind::Array)? {
            return Ok(());
        }
        let len = self.begin_array()?;
        if let Ok(len) = usize::try_from(len) {
            dst.reserve(len.min(DecodeConfig::MAX_PREALLOC));
        }
        self.array_elements(len, |dec, _| {
            let mut slot = T::default();
            dec.decode(&mut slot)?;
            dst.push(slot);
            Ok(())
        })?;
        Ok(())
    }

    /// Drives an array into `capacity` positional slots.
    ///
    /// A known length different from `capacity` fails with [Error::ArrayLength]. With an
    /// unknown length, elements beyond `capacity` are decoded and discarded and missing
    /// elements leave their slots untouched. The caller handles nil.
    pub fn decode_positional(
        &mut self,
        capacity: usize,
        mut slot: impl FnMut(&mut Self, usize) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let len = self.begin_array()?;
        if let Ok(found) = usize::try_from(len) {
            if found != capacity {
                return Err(Error::ArrayLength {
                    expected: capacity,
                    found,
                });
            }
        }
        self.array_elements(len, |dec, index| {
            if index < capacity {
                slot(dec, index)
            } else {
                dec.decode(&mut Discard)
            }
        })?;
        Ok(())
    }

    /// Decodes into fixed slots by position, resetting every slot first.
    pub fn decode_slots<T: Decode + Default>(&mut self, dst: &mut [T]) -> Result<(), Error> {
        dst.iter_mut().for_each(|slot| *slot = T::default());
        if !self.present(Kind::Array)? {
            return Ok(());
        }
        self.decode_positional(dst.len(), |dec, index| dec.decode(&mut dst[index]))
    }

    /// Decodes an associative collection, handing every fresh entry to `insert`.
    ///
    /// A nil yields no entries.
    pub fn decode_entries<K, V>(&mut self, mut insert: impl FnMut(K, V)) -> Result<(), Error>
    where
        K: Decode + Default,
        V: Decode + Default,
    {
        if !self.present(Kind::Map)? {
            return Ok(());
        }
        self.decode_map(
            |dec| {
                let mut key = K::default();
                dec.decode(&mut key)?;
                Ok(key)
            },
            |dec, key| {
                let mut value = V::default();
                dec.decode(&mut value)?;
                insert(key, value);
                Ok(())
            },
        )?;
        Ok(())
    }

    /// Decodes a record from a map keyed by wire name.
    ///
    /// Keys absent from the record's descriptor have their values skipped. A nil resets the
    /// record to its default.
    pub fn decode_record<T: Record + Default>(&mut self, dst: &mut T) -> Result<(), Error> {
        if !self.present(Kind::Map)? {
            *dst = T::default();
            return Ok(());
        }
        let descriptor = FieldCache::global().lookup::<T>();
        self.decode_map(
            |dec| {
                let mut name = String::new();
                dec.decode_string(&mut name)?;
                Ok(name)
            },
            |dec, name| {
                let Some(field) = descriptor.field(&name) else {
                    return dec.decode(&mut Discard);
                };
                match dst.field_mut(field.index) {
                    Some(slot) => slot.decode(dec),
                    None => Err(Error::Unsupported(descriptor.type_name())),
                }
            },
        )?;
        Ok(())
    }
}

/// A destination that consumes and drops any value.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Decode for Discard {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        dec.skip()
    }

    fn shape() -> Shape {
        Shape::Dynamic
    }
}
