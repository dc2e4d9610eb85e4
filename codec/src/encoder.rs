//! The encode engine.
//!
//! An [Encoder] drives a [Writer] from an in-memory value. Like the [crate::Decoder], it is the
//! traversal cursor and carries the pending key/value separator of the map being encoded: the
//! first primitive emitted for a map value (including the `begin` of a nested aggregate) emits
//! the separator before itself.

use crate::{
    config::EncodeConfig,
    num::{Float, Integer, Wide},
    record::{FieldCache, Record},
    sequence::{Mapping, Sequence},
    Encode, Error, SortKey, Writer,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::{cmp::Ordering, mem::discriminant};

/// Encodes `value` into `writer`.
pub fn encode<T: Encode + ?Sized>(writer: &mut dyn Writer, value: &T) -> Result<(), Error> {
    Encoder::new(writer).encode(value)
}

type Pair<'a> = (&'a dyn Encode, &'a dyn Encode);

fn hint(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

/// Encode cursor over a [Writer].
pub struct Encoder<'w> {
    writer: &'w mut dyn Writer,
    config: EncodeConfig,
    /// Whether the next primitive is a map value whose separator has not been emitted yet.
    pending: bool,
}

macro_rules! forward {
    ($($name:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            pub fn $name(&mut self, $($arg: $ty),*) -> Result<(), Error> {
                self.separate()?;
                self.writer.$name($($arg),*)
            }
        )*
    };
}

impl<'w> Encoder<'w> {
    pub fn new(writer: &'w mut dyn Writer) -> Self {
        Self::with_config(writer, EncodeConfig::default())
    }

    pub fn with_config(writer: &'w mut dyn Writer, config: EncodeConfig) -> Self {
        Self {
            writer,
            config,
            pending: false,
        }
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    /// Encodes `value`.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value.encode(self)
    }

    fn separate(&mut self) -> Result<(), Error> {
        if std::mem::take(&mut self.pending) {
            self.writer.map_value()?;
        }
        Ok(())
    }

    forward! {
        emit_nil();
        emit_bool(value: bool);
        emit_int64(value: i64);
        emit_uint64(value: u64);
        emit_float64(value: f64);
        emit_string(value: &str);
        emit_bytes(value: &[u8]);
        emit_time(value: DateTime<Utc>);
        emit_duration(value: TimeDelta);
        emit_error(message: &str);
    }

    /// Emits an integer of any width as [crate::Kind::Int] or [crate::Kind::Uint].
    pub fn emit_int<T: Integer>(&mut self, value: T) -> Result<(), Error> {
        match value.widen()? {
            Wide::Int(v) => self.emit_int64(v),
            Wide::Uint(v) => self.emit_uint64(v),
        }
    }

    pub fn emit_float<T: Float>(&mut self, value: T) -> Result<(), Error> {
        self.emit_float64(value.to_wire())
    }

    pub(crate) fn begin_array(&mut self, len: isize) -> Result<(), Error> {
        self.separate()?;
        self.writer.array_begin(len)
    }

    pub(crate) fn next_element(&mut self) -> Result<(), Error> {
        self.writer.array_next()
    }

    pub(crate) fn end_array(&mut self) -> Result<(), Error> {
        self.writer.array_end()
    }

    /// Encodes a sequence as an array.
    ///
    /// A handle reporting a known length must yield exactly that many elements, otherwise the
    /// encode fails with [Error::ArrayLength].
    pub fn encode_sequence<'a>(&mut self, seq: &mut dyn Sequence<'a>) -> Result<(), Error> {
        let len = seq.len_hint();
        self.begin_array(len)?;
        let mut count = 0;
        while let Some(item) = seq.next() {
            if count != 0 {
                self.next_element()?;
            }
            item.encode(self)?;
            count += 1;
        }
        check_count(len, count)?;
        self.end_array()
    }

    /// Encodes a mapping as a map.
    ///
    /// With [EncodeConfig::sort_keys] set, entries are collected and emitted in ascending key
    /// order when all keys sort in the same domain; otherwise they are emitted in iteration
    /// order.
    pub fn encode_mapping<'a>(&mut self, map: &mut dyn Mapping<'a>) -> Result<(), Error> {
        let len = map.len_hint();
        if len == 0 {
            self.separate()?;
            self.writer.map_begin(0)?;
            return self.writer.map_end();
        }
        if !self.config.sort_keys {
            return self.encode_pairs(len, std::iter::from_fn(|| map.next()));
        }

        let mut entries: Vec<Pair<'a>> = std::iter::from_fn(|| map.next()).collect();
        check_count(len, entries.len())?;
        sort_entries(&mut entries);
        self.encode_pairs(hint(entries.len()), entries.into_iter())
    }

    fn encode_pairs<'a>(
        &mut self,
        len: isize,
        pairs: impl Iterator<Item = Pair<'a>>,
    ) -> Result<(), Error> {
        self.separate()?;
        self.writer.map_begin(len)?;
        let mut count = 0;
        for (key, value) in pairs {
            if count != 0 {
                self.writer.map_next()?;
            }
            key.encode(self)?;
            self.encode_value(value)?;
            count += 1;
        }
        check_count(len, count)?;
        self.writer.map_end()
    }

    /// Encodes the value half of a pair whose key was just emitted.
    fn encode_value(&mut self, value: &dyn Encode) -> Result<(), Error> {
        self.pending = true;
        value.encode(self)?;
        self.separate()
    }

    /// Encodes a record as a map from wire names to field values.
    ///
    /// Omitted fields are excluded from both the announced length and the output.
    pub fn encode_record<T: Record>(&mut self, record: &T) -> Result<(), Error> {
        let descriptor = FieldCache::global().lookup::<T>();
        let mut present = Vec::with_capacity(descriptor.fields().len());
        for field in descriptor.fields() {
            let value = record
                .field(field.index)
                .ok_or(Error::Unsupported(descriptor.type_name()))?;
            if !field.omit.omits(value) {
                present.push((field.name, value));
            }
        }

        self.separate()?;
        self.writer.map_begin(hint(present.len()))?;
        for (index, (name, value)) in present.into_iter().enumerate() {
            if index != 0 {
                self.writer.map_next()?;
            }
            self.emit_string(name)?;
            self.encode_value(value)?;
        }
        self.writer.map_end()
    }
}

fn check_count(len: isize, count: usize) -> Result<(), Error> {
    match usize::try_from(len) {
        Ok(expected) if expected != count => Err(Error::ArrayLength {
            expected,
            found: count,
        }),
        _ => Ok(()),
    }
}

/// Sort domain of a map key.
#[derive(Clone, Copy, Debug)]
enum Ordinal<'a> {
    Integer(i128),
    Float(f64),
    String(&'a str),
}

impl<'a> From<SortKey<'a>> for Ordinal<'a> {
    fn from(key: SortKey<'a>) -> Self {
        match key {
            SortKey::Int(v) => Ordinal::Integer(v.into()),
            SortKey::Uint(v) => Ordinal::Integer(v.into()),
            SortKey::Float(v) => Ordinal::Float(v),
            SortKey::String(v) => Ordinal::String(v),
        }
    }
}

impl Ordinal<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Ordinal::Integer(a), Ordinal::Integer(b)) => a.cmp(b),
            (Ordinal::Float(a), Ordinal::Float(b)) => a.total_cmp(b),
            (Ordinal::String(a), Ordinal::String(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Sorts `entries` by key if every key falls in the same sort domain.
fn sort_entries<'a>(entries: &mut Vec<Pair<'a>>) {
    let Some(keys) = entries
        .iter()
        .map(|&(key, _)| key.sort_key().map(Ordinal::from))
        .collect::<Option<Vec<_>>>()
    else {
        return;
    };
    let Some(first) = keys.first() else {
        return;
    };
    if keys.iter().any(|key| discriminant(key) != discriminant(first)) {
        return;
    }

    let mut keyed: Vec<_> = keys.into_iter().zip(entries.drain(..)).collect();
    keyed.sort_by(|(a, _), (b, _)| a.compare(b));
    entries.extend(keyed.into_iter().map(|(_, pair)| pair));
}
