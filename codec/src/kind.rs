//! The closed set of semantic categories every wire value reduces to.

use std::fmt;

/// Primitive category of a value exchanged across the [crate::Reader] / [crate::Writer]
/// boundary.
///
/// A backend reports the kind of the next value (via [crate::Reader::kind]) before it is asked
/// to produce it, because several formats cannot determine both atomically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Time,
    Duration,
    Error,
    Array,
    Map,
}

impl Kind {
    /// All kinds, in declaration order.
    pub const ALL: [Kind; 12] = [
        Kind::Nil,
        Kind::Bool,
        Kind::Int,
        Kind::Uint,
        Kind::Float,
        Kind::String,
        Kind::Bytes,
        Kind::Time,
        Kind::Duration,
        Kind::Error,
        Kind::Array,
        Kind::Map,
    ];

    /// Lowercase name of the kind.
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Time => "time",
            Kind::Duration => "duration",
            Kind::Error => "error",
            Kind::Array => "array",
            Kind::Map => "map",
        }
    }

    /// Returns true for the two aggregate kinds.
    pub const fn is_aggregate(self) -> bool {
        matches!(self, Kind::Array | Kind::Map)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
