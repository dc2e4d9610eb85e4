//! LEB128 variable-length integers, used by the binary backend for lengths, unsigned values
//! and (through ZigZag) signed values.
//!
//! Each byte carries 7 data bits, least significant group first; the high bit is set on every
//! byte except the last.

use crate::Error;
use bytes::{Buf, BufMut};
use std::ops::{BitOrAssign, Shl, ShrAssign};

const DATA_BITS: usize = 7;
const DATA_MASK: u8 = 0x7F;
const CONTINUATION: u8 = 0x80;

/// An unsigned integer that can be written as a varint.
pub trait UInt:
    Copy + From<u8> + ShrAssign<usize> + Shl<usize, Output = Self> + BitOrAssign<Self> + PartialOrd
{
    /// Width of the type in bits.
    const BITS: usize;

    fn leading_zeros(self) -> u32;

    /// The low byte, truncating.
    fn low_byte(self) -> u8;
}

macro_rules! impl_uint {
    ($($type:ty),*) => {
        $(
            impl UInt for $type {
                const BITS: usize = <$type>::BITS as usize;

                #[inline]
                fn leading_zeros(self) -> u32 {
                    self.leading_zeros()
                }

                #[inline]
                fn low_byte(self) -> u8 {
                    self as u8
                }
            }
        )*
    };
}

impl_uint!(u16, u32, u64);

/// A signed integer mapped onto its unsigned counterpart with ZigZag encoding, so values of
/// small magnitude stay short whatever their sign.
pub trait SInt<U: UInt> {
    fn zigzag(self) -> U;
    fn unzigzag(value: U) -> Self;
}

macro_rules! impl_sint {
    ($($type:ty => $utype:ty),*) => {
        $(
            impl SInt<$utype> for $type {
                #[inline]
                fn zigzag(self) -> $utype {
                    ((self << 1) ^ (self >> (<$type>::BITS - 1))) as $utype
                }

                #[inline]
                fn unzigzag(value: $utype) -> Self {
                    ((value >> 1) as $type) ^ -((value & 1) as $type)
                }
            }
        )*
    };
}

impl_sint!(i16 => u16, i32 => u32, i64 => u64);

/// Writes `value` as a varint.
pub fn write<T: UInt>(value: T, buf: &mut impl BufMut) {
    let threshold = T::from(CONTINUATION);
    let mut rest = value;
    while rest >= threshold {
        buf.put_u8(rest.low_byte() | CONTINUATION);
        rest >>= DATA_BITS;
    }
    buf.put_u8(rest.low_byte());
}

/// Reads a varint into `T`.
///
/// Fails with [Error::InvalidVarint] if the encoding carries bits beyond the width of `T` and
/// with [Error::EndOfBuffer] if the input ends mid-varint.
pub fn read<T: UInt>(buf: &mut impl Buf) -> Result<T, Error> {
    let mut result = T::from(0);
    let mut shift = 0;
    loop {
        if !buf.has_remaining() {
            return Err(Error::EndOfBuffer);
        }
        let byte = buf.get_u8();

        // The final permitted byte may only carry the bits left in T (and no continuation).
        let remaining = T::BITS.checked_sub(shift).ok_or(Error::InvalidVarint)?;
        if remaining <= DATA_BITS {
            let used = 8 - byte.leading_zeros() as usize;
            if used > remaining {
                return Err(Error::InvalidVarint);
            }
        }

        result |= T::from(byte & DATA_MASK) << shift;
        if byte & CONTINUATION == 0 {
            return Ok(result);
        }
        shift += DATA_BITS;
    }
}

/// Number of bytes [write] produces for `value`.
pub fn size<T: UInt>(value: T) -> usize {
    let bits = T::BITS - value.leading_zeros() as usize;
    bits.div_ceil(DATA_BITS).max(1)
}

/// Writes a signed `value` as a ZigZag varint.
pub fn write_signed<U: UInt, S: SInt<U>>(value: S, buf: &mut impl BufMut) {
    write(value.zigzag(), buf);
}

/// Reads a ZigZag varint.
pub fn read_signed<U: UInt, S: SInt<U>>(buf: &mut impl Buf) -> Result<S, Error> {
    read(buf).map(S::unzigzag)
}
