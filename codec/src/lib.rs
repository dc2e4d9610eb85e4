//! Drive pluggable wire formats from structured values.
//!
//! # Overview
//!
//! A format-agnostic serialization engine. One generic traversal converts between in-memory
//! values and any wire format that implements the small [Reader] / [Writer] contract: a kind
//! probe, one extraction (or emission) call per [Kind], and a begin/next/end triad for arrays
//! and maps. Backends never see Rust types, and types never see backends.
//!
//! - [Encode] / [Decode] describe how a type maps onto kinds. They are implemented for
//!   primitives, strings, byte buffers, collections, tuples, `Option`, `Box`, times and
//!   durations, and derived for records with `#[derive(Record)]`.
//! - [Encoder] / [Decoder] are the traversal cursors. Integers are narrowed with bounds
//!   checks, unknown-length aggregates are driven until the backend reports [Next::End], and
//!   map separators are issued exactly once per pair however deeply values nest.
//! - [StreamEncoder] / [StreamDecoder] treat a whole output or input as one top-level
//!   sequence, element by element.
//!
//! Two reference backends are included: [value] (an in-memory tree, handy for tests and for
//! decoding without a static destination) and [binary] (a compact tagged format).
//!
//! # Example
//!
//! ```
//! use objwire_codec::{binary, Record};
//!
//! #[derive(Debug, Default, PartialEq, Record)]
//! pub struct Reading {
//!     pub sensor: String,
//!     #[wire("v")]
//!     pub value: f64,
//!     #[wire(",omitempty")]
//!     pub tags: Vec<String>,
//! }
//!
//! let reading = Reading {
//!     sensor: "t1".into(),
//!     value: 21.5,
//!     tags: vec![],
//! };
//! let encoded = binary::to_bytes(&reading).unwrap();
//! let decoded: Reading = binary::from_bytes(encoded).unwrap();
//! assert_eq!(reading, decoded);
//! ```
//!
//! # Custom types
//!
//! A type may implement [Encode] and [Decode] by hand, driving the cursor's primitives
//! directly. Such a type keeps the default [Decode::shape] ([Shape::Custom]), which tells the
//! engine to hand it every value, nil included.
//!
//! ```
//! use objwire_codec::{value, Decode, Decoder, Encode, Encoder, Error, Kind};
//!
//! /// A color carried as a "#rrggbb" string.
//! #[derive(Debug, Default, PartialEq)]
//! struct Rgb(u8, u8, u8);
//!
//! impl Encode for Rgb {
//!     fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
//!         enc.emit_string(&format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2))
//!     }
//! }
//!
//! impl Decode for Rgb {
//!     fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
//!         if dec.kind()? != Kind::String {
//!             return Err(Error::custom("color must be a string"));
//!         }
//!         let text = dec.string()?;
//!         let channel = |i: usize| {
//!             text.get(i..i + 2)
//!                 .and_then(|hex| u8::from_str_radix(hex, 16).ok())
//!                 .ok_or_else(|| Error::custom("malformed color"))
//!         };
//!         *self = Rgb(channel(1)?, channel(3)?, channel(5)?);
//!         Ok(())
//!     }
//! }
//!
//! let encoded = value::to_value(&Rgb(255, 0, 16)).unwrap();
//! assert_eq!(encoded, value::Value::from("#ff0010"));
//! assert_eq!(value::from_value::<Rgb>(&encoded), Ok(Rgb(255, 0, 16)));
//! ```

// Lets the derive macros refer to `::objwire_codec` from inside this crate's own tests.
extern crate self as objwire_codec;

pub mod binary;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod kind;
pub mod num;
pub mod record;
pub mod sequence;
pub mod stream;
pub mod types;
pub mod util;
pub mod value;
pub mod varint;

// Re-export main types and traits
pub use codec::{Decode, Encode, Next, Reader, Shape, SortKey, Writer};
pub use config::{DecodeConfig, EncodeConfig, RangeCfg};
pub use decoder::{decode, decode_value, Decoder, Discard};
pub use encoder::{encode, Encoder};
pub use error::Error;
pub use kind::Kind;
pub use record::{FieldCache, FieldDecl, Omit, Record, RecordDescriptor};
pub use sequence::{Indexed, IndexedPairs, Lazy, LazyPairs, Mapping, Sequence, Single, SinglePair};
pub use stream::{StreamDecoder, StreamEncoder};
pub use types::primitives::Failure;
pub use value::Value;

/// Derives [Record], [Encode] and [Decode] for a struct with named fields.
///
/// Only `pub` fields travel. A field's wire name and omission rule come from an optional
/// `#[wire("name,flags")]` attribute (see [record]). The struct must implement `Default`.
#[cfg(feature = "derive")]
pub use objwire_macros::Record;
