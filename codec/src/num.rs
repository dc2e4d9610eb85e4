//! Bounds-checked conversion between wire integers and in-memory numeric widths.
//!
//! Backends exchange integers as `i64` ([crate::Kind::Int]) or `u64` ([crate::Kind::Uint]).
//! Destinations may be any narrower (or, for `i128`/`u128`, wider) width, so every conversion
//! is checked and fails with [Error::OutOfBounds] when the value does not fit.
//!
//! # Floats
//!
//! Integers decoded into a float destination must be exactly representable, which is
//! guaranteed only up to [MAX_EXACT_F32_INT] and [MAX_EXACT_F64_INT] in magnitude. Wire floats
//! decoded into an `f32` destination are a plain width cast with no range enforcement: values
//! beyond `f32::MAX` become infinite and precision is silently lost.

use crate::Error;
use std::any::type_name;

/// Largest magnitude up to which every integer is exactly representable as an `f32` (2^24).
pub const MAX_EXACT_F32_INT: u64 = 1 << 24;

/// Largest magnitude up to which every integer is exactly representable as an `f64` (2^53).
pub const MAX_EXACT_F64_INT: u64 = 1 << 53;

/// Wire representation of an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wide {
    Int(i64),
    Uint(u64),
}

impl Wide {
    /// The value widened to `i128`, used when reporting bounds failures.
    pub fn as_i128(self) -> i128 {
        match self {
            Wide::Int(v) => v.into(),
            Wide::Uint(v) => v.into(),
        }
    }

    fn magnitude(self) -> u64 {
        match self {
            Wide::Int(v) => v.unsigned_abs(),
            Wide::Uint(v) => v,
        }
    }
}

/// Converts a wire `i64` into the destination integer width.
pub fn narrow_signed<T: TryFrom<i64>>(value: i64) -> Result<T, Error> {
    T::try_from(value).map_err(|_| Error::OutOfBounds {
        value: value.into(),
        ty: type_name::<T>(),
    })
}

/// Converts a wire `u64` into the destination integer width.
pub fn narrow_unsigned<T: TryFrom<u64>>(value: u64) -> Result<T, Error> {
    T::try_from(value).map_err(|_| Error::OutOfBounds {
        value: value.into(),
        ty: type_name::<T>(),
    })
}

/// Converts a wire integer of either signedness into the destination width.
pub fn narrow<T: TryFrom<i64> + TryFrom<u64>>(value: Wide) -> Result<T, Error> {
    match value {
        Wide::Int(v) => narrow_signed(v),
        Wide::Uint(v) => narrow_unsigned(v),
    }
}

/// Converts a wire integer into an `f64`, failing if it is not exactly representable.
pub fn exact_f64(value: Wide) -> Result<f64, Error> {
    if value.magnitude() > MAX_EXACT_F64_INT {
        return Err(Error::OutOfBounds {
            value: value.as_i128(),
            ty: "f64",
        });
    }
    Ok(match value {
        Wide::Int(v) => v as f64,
        Wide::Uint(v) => v as f64,
    })
}

/// Converts a wire integer into an `f32`, failing if it is not exactly representable.
pub fn exact_f32(value: Wide) -> Result<f32, Error> {
    if value.magnitude() > MAX_EXACT_F32_INT {
        return Err(Error::OutOfBounds {
            value: value.as_i128(),
            ty: "f32",
        });
    }
    Ok(match value {
        Wide::Int(v) => v as f32,
        Wide::Uint(v) => v as f32,
    })
}

/// An in-memory integer type the engines can narrow into and widen from.
pub trait Integer: Copy + Default + PartialEq + TryFrom<i64> + TryFrom<u64> {
    /// Whether the type is signed, selecting between [crate::Kind::Int] and
    /// [crate::Kind::Uint] on the wire.
    const SIGNED: bool;

    /// Splits the value into its wire representation.
    ///
    /// Fails for `i128`/`u128` values outside the 64-bit wire range.
    fn widen(self) -> Result<Wide, Error>;
}

macro_rules! impl_integer {
    ($($type:ty => $signed:expr),* $(,)?) => {
        $(
            impl Integer for $type {
                const SIGNED: bool = $signed;

                #[inline]
                fn widen(self) -> Result<Wide, Error> {
                    // Only u128 can exceed i128.
                    let value = i128::try_from(self).unwrap_or(i128::MAX);
                    let out_of_bounds = |_| Error::OutOfBounds {
                        value,
                        ty: type_name::<$type>(),
                    };
                    match i64::try_from(value) {
                        Ok(v) if $signed || v < 0 => Ok(Wide::Int(v)),
                        _ => u64::try_from(value).map(Wide::Uint).map_err(out_of_bounds),
                    }
                }
            }
        )*
    };
}

impl_integer!(
    i8 => true,
    i16 => true,
    i32 => true,
    i64 => true,
    i128 => true,
    isize => true,
    u8 => false,
    u16 => false,
    u32 => false,
    u64 => false,
    u128 => false,
    usize => false,
);

/// An in-memory float type.
pub trait Float: Copy + Default + PartialEq {
    /// Direct width cast from the wire `f64` (no range enforcement).
    fn from_wire(value: f64) -> Self;

    /// Exact conversion from a wire integer.
    fn from_integer(value: Wide) -> Result<Self, Error>;

    /// Widens the value to the wire `f64`.
    fn to_wire(self) -> f64;
}

impl Float for f32 {
    #[inline]
    fn from_wire(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn from_integer(value: Wide) -> Result<Self, Error> {
        exact_f32(value)
    }

    #[inline]
    fn to_wire(self) -> f64 {
        self.into()
    }
}

impl Float for f64 {
    #[inline]
    fn from_wire(value: f64) -> Self {
        value
    }

    #[inline]
    fn from_integer(value: Wide) -> Result<Self, Error> {
        exact_f64(value)
    }

    #[inline]
    fn to_wire(self) -> f64 {
        self
    }
}
