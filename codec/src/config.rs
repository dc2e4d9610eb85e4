//! Configuration for the encode and decode engines.
//!
//! [RangeCfg] bounds lengths read from untrusted input; [EncodeConfig] and [DecodeConfig]
//! carry the per-call options of [crate::Encoder] and [crate::Decoder].

use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the range of a value.
///
/// Used for length limits on strings, byte payloads and aggregates announced by a backend.
///
/// # Examples
///
/// ```
/// use objwire_codec::RangeCfg;
///
/// // Limit lengths to 0..=1024 (type inferred as usize)
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(&500));
/// assert!(!cfg.contains(&2000));
///
/// // Allow any length >= 1
/// let cfg_min = RangeCfg::from(1..);
/// assert!(!cfg_min.contains(&0));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg<T: Copy + PartialOrd> {
    start: Bound<T>,
    end: Bound<T>,
}

macro_rules! impl_range_from {
    ($($range:ty),*) => {
        $(
            impl<T: Copy + PartialOrd> From<$range> for RangeCfg<T> {
                fn from(r: $range) -> Self {
                    Self::new(r)
                }
            }
        )*
    };
}

impl_range_from!(
    core::ops::Range<T>,
    core::ops::RangeInclusive<T>,
    core::ops::RangeFrom<T>,
    core::ops::RangeTo<T>,
    core::ops::RangeToInclusive<T>
);

impl<T: Copy + PartialOrd> From<core::ops::RangeFull> for RangeCfg<T> {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::new(..)
    }
}

impl<T: Copy + PartialOrd> RangeCfg<T> {
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<T>`.
    pub fn new(r: impl RangeBounds<T>) -> Self {
        RangeCfg {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Creates a `RangeCfg` that only accepts exactly `value`.
    pub fn exact(value: T) -> Self {
        Self {
            start: Bound::Included(value),
            end: Bound::Included(value),
        }
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &T) -> bool {
        match &self.start {
            Bound::Included(s) if value < s => return false,
            Bound::Excluded(s) if value <= s => return false,
            _ => {}
        }
        match &self.end {
            Bound::Included(e) if value > e => return false,
            Bound::Excluded(e) if value >= e => return false,
            _ => {}
        }
        true
    }
}

impl<T: Copy + PartialOrd> RangeBounds<T> for RangeCfg<T> {
    fn start_bound(&self) -> Bound<&T> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&T> {
        self.end.as_ref()
    }
}

/// Options for the encode engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Emit mapping entries in ascending key order instead of iteration order.
    ///
    /// Applies only when every key is an integer, every key is a float or every key is a
    /// string. Any other key mix is emitted unsorted.
    pub sort_keys: bool,
}

impl EncodeConfig {
    /// Returns the configuration with key sorting set to `sort_keys`.
    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }
}

/// Options for the decode engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Allowed range of known aggregate length hints.
    ///
    /// A backend announcing an array or map length outside this range fails the decode with
    /// [crate::Error::InvalidLength] before any element is read.
    pub max_len: RangeCfg<usize>,

    /// Maximum number of arrays and maps open at once.
    ///
    /// Opening one more fails the decode with [crate::Error::DepthExceeded].
    pub max_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_len: RangeCfg::from(..),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeConfig {
    /// Upper bound on the capacity reserved up front for a known-length aggregate.
    pub(crate) const MAX_PREALLOC: usize = 1024;

    /// Default for [Self::max_depth].
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    /// Returns the configuration with length hints limited to `range`.
    pub fn with_max_len(mut self, range: impl Into<RangeCfg<usize>>) -> Self {
        self.max_len = range.into();
        self
    }

    /// Returns the configuration with nesting limited to `depth` aggregates.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ops::Bound::{Excluded, Included, Unbounded};

    #[test]
    fn test_range_cfg_from() {
        let full: RangeCfg<usize> = (..).into();
        assert_eq!(full.start_bound(), Unbounded);
        assert_eq!(full.end_bound(), Unbounded);

        let half_open: RangeCfg<usize> = (5..10).into();
        assert_eq!(half_open.start_bound(), Included(&5));
        assert_eq!(half_open.end_bound(), Excluded(&10));

        let upto: RangeCfg<usize> = (..=10).into();
        assert_eq!(upto.end_bound(), Included(&10));
    }

    #[test]
    fn test_range_cfg_contains() {
        let cfg: RangeCfg<usize> = (5..10).into();
        assert!(!cfg.contains(&4));
        assert!(cfg.contains(&5));
        assert!(cfg.contains(&9));
        assert!(!cfg.contains(&10));

        let exact = RangeCfg::exact(3u32);
        assert!(exact.contains(&3));
        assert!(!exact.contains(&2));
        assert!(!exact.contains(&4));

        #[allow(clippy::reversed_empty_ranges)]
        let empty: RangeCfg<usize> = (6..=5).into();
        assert!(!empty.contains(&5));
        assert!(!empty.contains(&6));
    }

    #[test]
    fn test_engine_configs() {
        assert!(!EncodeConfig::default().sort_keys);
        assert!(EncodeConfig::default().with_sort_keys(true).sort_keys);

        let cfg = DecodeConfig::default();
        assert!(cfg.max_len.contains(&usize::MAX));
        let cfg = cfg.with_max_len(..=16);
        assert!(cfg.max_len.contains(&16));
        assert!(!cfg.max_len.contains(&17));
        assert_eq!(cfg.max_depth, DecodeConfig::DEFAULT_MAX_DEPTH);
        assert_eq!(cfg.with_max_depth(4).max_depth, 4);
    }
}
