//! Uniform views over in-memory sequences and associative collections.
//!
//! The encode engine walks any sequence through [Sequence] and any mapping through [Mapping],
//! independent of how the values are stored. A handle borrows its source for the duration of
//! one traversal and is consumed by it.
//!
//! Three realizations are provided for each:
//!
//! - [Indexed] / [IndexedPairs]: a random-access backing store with a known length.
//! - [Single] / [SinglePair]: exactly one element.
//! - [Lazy] / [LazyPairs]: a generator that is pulled until exhausted, with an unknown length
//!   unless one is supplied.

use crate::Encode;

/// Length hint reported by handles that cannot know their length in advance.
pub const UNKNOWN_LEN: isize = -1;

fn hint(len: usize) -> isize {
    isize::try_from(len).unwrap_or(isize::MAX)
}

/// Cursor over the elements of a sequence.
pub trait Sequence<'a> {
    /// Number of elements, or a negative value if unknown.
    fn len_hint(&self) -> isize;

    /// Yields the next element, or `None` once exhausted.
    fn next(&mut self) -> Option<&'a dyn Encode>;
}

/// Cursor over the key/value pairs of a mapping.
pub trait Mapping<'a> {
    /// Number of pairs, or a negative value if unknown.
    fn len_hint(&self) -> isize;

    /// Yields the next pair, or `None` once exhausted.
    fn next(&mut self) -> Option<(&'a dyn Encode, &'a dyn Encode)>;
}

/// A sequence backed by a slice.
#[derive(Debug)]
pub struct Indexed<'a, T> {
    items: &'a [T],
    pos: usize,
}

impl<'a, T: Encode> Indexed<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items, pos: 0 }
    }

    /// Random access to the backing store, independent of the cursor position.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.items.get(index)
    }
}

impl<'a, T: Encode> Sequence<'a> for Indexed<'a, T> {
    fn len_hint(&self) -> isize {
        hint(self.items.len())
    }

    fn next(&mut self) -> Option<&'a dyn Encode> {
        let item = self.items.get(self.pos)?;
        self.pos += 1;
        Some(item as &dyn Encode)
    }
}

/// A sequence of exactly one element.
pub struct Single<'a> {
    item: Option<&'a dyn Encode>,
}

impl<'a> Single<'a> {
    pub fn new(item: &'a dyn Encode) -> Self {
        Self { item: Some(item) }
    }
}

impl<'a> Sequence<'a> for Single<'a> {
    fn len_hint(&self) -> isize {
        1
    }

    fn next(&mut self) -> Option<&'a dyn Encode> {
        self.item.take()
    }
}

/// A sequence pulled from an iterator.
#[derive(Debug)]
pub struct Lazy<I> {
    iter: I,
    len: isize,
}

impl<I> Lazy<I> {
    /// Wraps an iterator whose length is not known in advance.
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            len: UNKNOWN_LEN,
        }
    }

    /// Wraps an iterator that yields exactly `len` elements.
    pub fn with_len(iter: I, len: usize) -> Self {
        Self {
            iter,
            len: hint(len),
        }
    }
}

impl<'a, T, I> Sequence<'a> for Lazy<I>
where
    T: Encode + 'a,
    I: Iterator<Item = &'a T>,
{
    fn len_hint(&self) -> isize {
        self.len
    }

    fn next(&mut self) -> Option<&'a dyn Encode> {
        self.iter.next().map(|item| item as &dyn Encode)
    }
}

/// A mapping backed by a slice of pairs.
#[derive(Debug)]
pub struct IndexedPairs<'a, K, V> {
    pairs: &'a [(K, V)],
    pos: usize,
}

impl<'a, K: Encode, V: Encode> IndexedPairs<'a, K, V> {
    pub fn new(pairs: &'a [(K, V)]) -> Self {
        Self { pairs, pos: 0 }
    }

    /// Random access to the backing store, independent of the cursor position.
    pub fn get(&self, index: usize) -> Option<&'a (K, V)> {
        self.pairs.get(index)
    }
}

impl<'a, K: Encode, V: Encode> Mapping<'a> for IndexedPairs<'a, K, V> {
    fn len_hint(&self) -> isize {
        hint(self.pairs.len())
    }

    fn next(&mut self) -> Option<(&'a dyn Encode, &'a dyn Encode)> {
        let (key, value) = self.pairs.get(self.pos)?;
        self.pos += 1;
        Some((key as &dyn Encode, value as &dyn Encode))
    }
}

/// A mapping of exactly one pair.
pub struct SinglePair<'a> {
    pair: Option<(&'a dyn Encode, &'a dyn Encode)>,
}

impl<'a> SinglePair<'a> {
    pub fn new(key: &'a dyn Encode, value: &'a dyn Encode) -> Self {
        Self {
            pair: Some((key, value)),
        }
    }
}

impl<'a> Mapping<'a> for SinglePair<'a> {
    fn len_hint(&self) -> isize {
        1
    }

    fn next(&mut self) -> Option<(&'a dyn Encode, &'a dyn Encode)> {
        self.pair.take()
    }
}

/// A mapping pulled from an iterator of borrowed pairs (e.g. `HashMap::iter`).
#[derive(Debug)]
pub struct LazyPairs<I> {
    iter: I,
    len: isize,
}

impl<I> LazyPairs<I> {
    /// Wraps an iterator whose length is not known in advance.
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            len: UNKNOWN_LEN,
        }
    }

    /// Wraps an iterator that yields exactly `len` pairs.
    pub fn with_len(iter: I, len: usize) -> Self {
        Self {
            iter,
            len: hint(len),
        }
    }
}

impl<'a, K, V, I> Mapping<'a> for LazyPairs<I>
where
    K: Encode + 'a,
    V: Encode + 'a,
    I: Iterator<Item = (&'a K, &'a V)>,
{
    fn len_hint(&self) -> isize {
        self.len
    }

    fn next(&mut self) -> Option<(&'a dyn Encode, &'a dyn Encode)> {
        self.iter
            .next()
            .map(|(key, value)| (key as &dyn Encode, value as &dyn Encode))
    }
}
