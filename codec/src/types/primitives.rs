//! Encode and Decode for scalars: `bool`, integers, floats, strings and error values.
//!
//! # Integers
//!
//! Every integer width is supported. Values travel as [Kind::Int] when negative or when the
//! type is signed and as [Kind::Uint] otherwise; decoding accepts either kind and checks that
//! the value fits the destination. `i128`/`u128` values outside the 64-bit wire range fail to
//! encode.
//!
//! # Bytes
//!
//! `u8` overrides the slice hooks of [Encode] and [Decode] so that `Vec<u8>`, `[u8]` and
//! `[u8; N]` travel as a single [Kind::Bytes] value. Decoding also accepts a [Kind::String]
//! payload or an array of integers.

use crate::{
    num::{Float, Integer, Wide},
    Decode, Decoder, Encode, Encoder, Error, Kind, Shape, SortKey,
};
use std::fmt;

impl Encode for bool {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_bool(*self)
    }

    fn is_empty_value(&self) -> bool {
        !*self
    }

    fn is_zero_value(&self) -> bool {
        !*self
    }
}

impl Decode for bool {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        dec.decode_bool(self)
    }

    fn shape() -> Shape {
        Shape::Bool
    }
}

fn integer_key<T: Integer>(value: T) -> Option<SortKey<'static>> {
    match value.widen().ok()? {
        Wide::Int(v) => Some(SortKey::Int(v)),
        Wide::Uint(v) => Some(SortKey::Uint(v)),
    }
}

macro_rules! impl_integer {
    ($($type:ty),*) => {
        $(
            impl Encode for $type {
                #[inline]
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
                    enc.emit_int(*self)
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0
                }

                fn is_zero_value(&self) -> bool {
                    *self == 0
                }

                fn sort_key(&self) -> Option<SortKey<'_>> {
                    integer_key(*self)
                }
            }

            impl Decode for $type {
                #[inline]
                fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
                    dec.decode_int(self)
                }

                fn shape() -> Shape {
                    if <$type as Integer>::SIGNED {
                        Shape::Int
                    } else {
                        Shape::Uint
                    }
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize);

impl Encode for u8 {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_uint64((*self).into())
    }

    fn is_empty_value(&self) -> bool {
        *self == 0
    }

    fn is_zero_value(&self) -> bool {
        *self == 0
    }

    fn sort_key(&self) -> Option<SortKey<'_>> {
        Some(SortKey::Uint((*self).into()))
    }

    fn encode_slice(items: &[Self], enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_bytes(items)
    }
}

impl Decode for u8 {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        dec.decode_int(self)
    }

    fn shape() -> Shape {
        Shape::Uint
    }

    fn decode_vec(dst: &mut Vec<Self>, dec: &mut Decoder<'_>) -> Result<(), Error> {
        if dec.kind()? == Kind::Array {
            return dec.decode_growable(dst);
        }
        let bytes = dec.decode_bytes()?;
        dst.clear();
        dst.extend_from_slice(&bytes);
        Ok(())
    }

    fn decode_fixed(dst: &mut [Self], dec: &mut Decoder<'_>) -> Result<(), Error> {
        match dec.kind()? {
            Kind::Array => dec.decode_slots(dst),
            Kind::Nil => {
                dec.nil()?;
                dst.fill(0);
                Ok(())
            }
            _ => {
                let bytes = dec.decode_bytes()?;
                if bytes.len() != dst.len() {
                    return Err(Error::ArrayLength {
                        expected: dst.len(),
                        found: bytes.len(),
                    });
                }
                dst.copy_from_slice(&bytes);
                Ok(())
            }
        }
    }
}

macro_rules! impl_float {
    ($($type:ty),*) => {
        $(
            impl Encode for $type {
                #[inline]
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
                    enc.emit_float(*self)
                }

                fn is_empty_value(&self) -> bool {
                    *self == 0.0
                }

                fn is_zero_value(&self) -> bool {
                    *self == 0.0
                }

                fn sort_key(&self) -> Option<SortKey<'_>> {
                    Some(SortKey::Float(self.to_wire()))
                }
            }

            impl Decode for $type {
                #[inline]
                fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
                    dec.decode_float(self)
                }

                fn shape() -> Shape {
                    Shape::Float
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl Encode for str {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_string(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }

    fn sort_key(&self) -> Option<SortKey<'_>> {
        Some(SortKey::String(self))
    }
}

impl Encode for String {
    #[inline]
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_string(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }

    fn is_zero_value(&self) -> bool {
        self.is_empty()
    }

    fn sort_key(&self) -> Option<SortKey<'_>> {
        Some(SortKey::String(self))
    }
}

impl Decode for String {
    #[inline]
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        dec.decode_string(self)
    }

    fn shape() -> Shape {
        Shape::String
    }
}

/// An error value, carried on the wire as its message ([Kind::Error]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Failure {
    message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Captures the message of any error.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl Encode for Failure {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<(), Error> {
        enc.emit_error(&self.message)
    }

    fn is_zero_value(&self) -> bool {
        self.message.is_empty()
    }
}

impl Decode for Failure {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<(), Error> {
        self.message = match dec.kind()? {
            Kind::Nil => {
                dec.nil()?;
                String::new()
            }
            Kind::Error => dec.error()?,
            Kind::String => dec.string()?,
            kind => return Err(Error::conversion(kind, Kind::Error)),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Error
    }
}
