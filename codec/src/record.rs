//! Records: fixed-shape aggregates with named fields.
//!
//! A record declares its fields through [Record::FIELDS] (usually via `#[derive(Record)]`)
//! and exposes each encodable field by position. The first time a record type is used, the
//! [FieldCache] turns those declarations into a [RecordDescriptor]: the ordered list of fields
//! the engines actually traverse, with wire names and omission rules resolved from tags.
//!
//! # Tags
//!
//! A field tag is a comma-separated directive string:
//!
//! - the first token overrides the wire name (empty keeps the declared name, `-` alone skips
//!   the field);
//! - `omitempty` omits the field when it holds the empty value for its kind;
//! - `omitzero` omits the field when it holds the zero value for its type.
//!
//! Unknown flags are ignored.
//!
//! # Visibility
//!
//! Fields that are not `pub` are never encoded or decoded, and neither are anonymous
//! (positional) fields of tuple structs. Anonymous fields are not flattened into the parent:
//! their members are invisible to the engines.

use crate::{Decode, Encode};
use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};
use tracing::{debug, warn};

/// Wire name that excludes a field.
pub const SKIP: &str = "-";

/// A field as declared in the source of a record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDecl {
    /// Declared field name (the position, as a string, for anonymous fields).
    pub name: &'static str,
    /// Raw tag string, if any.
    pub tag: Option<&'static str>,
    /// Whether the field is `pub`.
    pub exported: bool,
    /// Whether the field is positional (tuple struct).
    pub anonymous: bool,
}

/// A record type the engines can traverse field by field.
///
/// `field` and `field_mut` must return `Some` for every exported, named field index in
/// [Self::FIELDS].
pub trait Record: 'static {
    /// Field declarations, in declaration order.
    const FIELDS: &'static [FieldDecl];

    /// The field at `index` in [Self::FIELDS], for encoding.
    fn field(&self, index: usize) -> Option<&dyn Encode>;

    /// The field at `index` in [Self::FIELDS], for decoding.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Decode>;
}

/// When a field is left out of an encoded record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Omit {
    /// Always emitted.
    Never,
    /// Omitted when [Encode::is_empty_value] holds.
    IfEmpty,
    /// Omitted when [Encode::is_zero_value] holds.
    IfZero,
    /// Never emitted.
    Always,
}

impl Omit {
    /// Whether a field holding `value` is left out.
    pub fn omits(self, value: &dyn Encode) -> bool {
        match self {
            Omit::Never => false,
            Omit::IfEmpty => value.is_empty_value(),
            Omit::IfZero => value.is_zero_value(),
            Omit::Always => true,
        }
    }
}

/// A parsed field tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Wire name override.
    pub name: Option<&'a str>,
    pub skip: bool,
    pub omit_empty: bool,
    pub omit_zero: bool,
}

impl<'a> Tag<'a> {
    /// Parses a tag directive string.
    pub fn parse(tag: &'a str) -> Self {
        if tag == SKIP {
            return Self {
                skip: true,
                ..Self::default()
            };
        }

        let mut tokens = tag.split(',');
        let name = tokens.next().filter(|name| !name.is_empty());
        let mut parsed = Self {
            name,
            ..Self::default()
        };
        for flag in tokens {
            match flag {
                "omitempty" => parsed.omit_empty = true,
                "omitzero" => parsed.omit_zero = true,
                _ => {}
            }
        }
        parsed
    }

    /// The omission policy the tag selects.
    pub fn omit(&self) -> Omit {
        if self.skip {
            Omit::Always
        } else if self.omit_empty {
            Omit::IfEmpty
        } else if self.omit_zero {
            Omit::IfZero
        } else {
            Omit::Never
        }
    }
}

/// A field the engines traverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Position in [Record::FIELDS].
    pub index: usize,
    /// Name on the wire.
    pub name: &'static str,
    pub omit: Omit,
}

/// Cached metadata for one record type.
#[derive(Debug)]
pub struct RecordDescriptor {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<&'static str, usize>,
}

impl RecordDescriptor {
    /// Builds the descriptor of `T` from its declarations.
    ///
    /// Construction is pure: building twice yields equal descriptors.
    pub fn build<T: Record>() -> Self {
        let type_name = type_name::<T>();
        let mut fields = Vec::with_capacity(T::FIELDS.len());
        let mut by_name = HashMap::with_capacity(T::FIELDS.len());
        for (index, decl) in T::FIELDS.iter().enumerate() {
            if !decl.exported || decl.anonymous {
                continue;
            }
            let tag = decl.tag.map(Tag::parse).unwrap_or_default();
            let omit = tag.omit();
            let name = tag.name.unwrap_or(decl.name);
            if omit == Omit::Always || name == SKIP {
                continue;
            }
            if by_name.contains_key(name) {
                warn!(record = type_name, field = decl.name, name, "duplicate wire name");
                continue;
            }
            by_name.insert(name, fields.len());
            fields.push(FieldDescriptor { index, name, omit });
        }
        Self {
            type_name,
            fields,
            by_name,
        }
    }

    /// Name of the record type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Traversed fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Resolves a wire name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&pos| &self.fields[pos])
    }
}

/// Process-wide cache of [RecordDescriptor]s, keyed by type.
///
/// Lookups take a read lock. On a miss the descriptor is built outside any lock and then
/// inserted; when two threads race on the same type both build, and the first insertion wins.
#[derive(Debug, Default)]
pub struct FieldCache {
    entries: RwLock<HashMap<TypeId, Arc<RecordDescriptor>>>,
}

impl FieldCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache used by the engines.
    pub fn global() -> &'static FieldCache {
        static GLOBAL: OnceLock<FieldCache> = OnceLock::new();
        GLOBAL.get_or_init(FieldCache::new)
    }

    /// Returns the descriptor of `T`, building it on first use.
    pub fn lookup<T: Record>(&self) -> Arc<RecordDescriptor> {
        let id = TypeId::of::<T>();
        if let Some(descriptor) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return descriptor.clone();
        }

        let built = Arc::new(RecordDescriptor::build::<T>());
        debug!(
            record = built.type_name(),
            fields = built.fields().len(),
            "built record descriptor"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(built)
            .clone()
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no descriptor is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached descriptor. Subsequent lookups rebuild them.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
