//! [crate::Encode] and [crate::Decode] implementations for std and ecosystem types.

pub mod bytes;
pub mod collections;
pub mod indirect;
pub mod primitives;
pub mod time;
pub mod tuple;
