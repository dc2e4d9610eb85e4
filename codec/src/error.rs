//! Error types for codec operations

use crate::Kind;
use thiserror::Error;

/// Error type for codec operations.
///
/// Every engine operation returns the first error it encounters. Nothing is recovered
/// locally, and a destination touched by a failed decode is left in an unspecified state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("cannot convert {from} to {to}")]
    TypeConversion { from: Kind, to: Kind },
    #[error("value {value} out of bounds for {ty}")]
    OutOfBounds { value: i128, ty: &'static str },
    #[error("unsupported type: {0}")]
    Unsupported(&'static str),
    #[error("array length mismatch: expected {expected}, found {found}")]
    ArrayLength { expected: usize, found: usize },
    #[error("stream already closed")]
    StreamClosed,
    #[error("nesting depth exceeds {0}")]
    DepthExceeded(usize),

    // Backend errors
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("invalid data in {0}: {1}")]
    InvalidData(&'static str, String), // context, message
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid tag: {0:#04x}")]
    InvalidTag(u8),
    #[error("protocol violation: {0}")]
    Protocol(&'static str),
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates an [Error::TypeConversion] from the wire kind to the destination kind.
    pub fn conversion(from: Kind, to: Kind) -> Self {
        Self::TypeConversion { from, to }
    }

    /// Creates an [Error::Custom] from any displayable message.
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        Self::Custom(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::conversion(Kind::String, Kind::Int).to_string(),
            "cannot convert string to int"
        );
        assert_eq!(
            Error::OutOfBounds {
                value: 1000,
                ty: "i8"
            }
            .to_string(),
            "value 1000 out of bounds for i8"
        );
        assert_eq!(Error::InvalidTag(0x1f).to_string(), "invalid tag: 0x1f");
    }
}
