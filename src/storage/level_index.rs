//! `LevelIndex`: one dimension of a grid point packed into a `u64`
//!
//! A sparse-grid basis function is identified per dimension by a level `l`
//! and an index `i`. For `l > 0` the index is odd and lies in `[1, 2^l - 1]`;
//! level 0 carries the two boundary anchors with index 0 (left) and 1 (right).
//!
//! This module provides:
//! - A transparent `LevelIndex` newtype around `u64` (level in the high word,
//!   index in the low word) so a whole grid point hashes as a flat `[u64]`.
//! - Arithmetic navigation (children, parent, ancestor test) without touching
//!   any storage.
//! - Implementations of common traits (`Debug`, `Display`, ordering,
//!   hashing, serde) so `LevelIndex` can be used in maps, sets, and printed.

use crate::grid_error::GridError;
use std::fmt;

/// Level of a one-dimensional basis function.
pub type Level = u32;
/// Index of a one-dimensional basis function within its level.
pub type Index = u32;

/// Highest level a grid point may carry; `2^MAX_LEVEL - 1` still fits an [`Index`].
pub const MAX_LEVEL: Level = 31;

/// One dimension of a grid point.
///
/// # Memory layout
/// This type is `repr(transparent)` over `u64`. Ordering of the packed value
/// is ordering by level first, then by index.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct LevelIndex(u64);

impl LevelIndex {
    /// Left boundary anchor `(0, 0)`.
    pub const LEFT_ZERO: LevelIndex = LevelIndex::new_unchecked(0, 0);
    /// Right boundary anchor `(0, 1)`.
    pub const RIGHT_ZERO: LevelIndex = LevelIndex::new_unchecked(0, 1);
    /// Coarsest interior basis function `(1, 1)`.
    pub const LEVEL_ONE: LevelIndex = LevelIndex::new_unchecked(1, 1);

    /// Packs a pair without validation.
    ///
    /// Only use this for pairs that are known to be valid, e.g. those produced
    /// by the navigation helpers below.
    #[inline]
    pub const fn new_unchecked(level: Level, index: Index) -> Self {
        LevelIndex(((level as u64) << 32) | index as u64)
    }

    /// Packs a pair after checking the level/index rule.
    ///
    /// `dim` is only used to make the error message point at the offending
    /// dimension.
    ///
    /// # Example
    /// ```rust
    /// # use sparse_grid_hash::storage::level_index::LevelIndex;
    /// let li = LevelIndex::try_new(0, 3, 5).unwrap();
    /// assert_eq!((li.level(), li.index()), (3, 5));
    /// assert!(LevelIndex::try_new(0, 3, 4).is_err());
    /// ```
    pub fn try_new(dim: usize, level: Level, index: Index) -> Result<Self, GridError> {
        if Self::is_valid_pair(level, index) {
            Ok(Self::new_unchecked(level, index))
        } else {
            Err(GridError::InvalidLevelIndex { dim, level, index })
        }
    }

    /// Returns true iff `(level, index)` is a valid basis function.
    #[inline]
    pub const fn is_valid_pair(level: Level, index: Index) -> bool {
        if level == 0 {
            index <= 1
        } else if level > MAX_LEVEL {
            false
        } else {
            index % 2 == 1 && (index as u64) < (1u64 << level)
        }
    }

    /// Rebuilds a value from its packed representation.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        LevelIndex(raw)
    }

    /// The packed representation.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn level(self) -> Level {
        (self.0 >> 32) as Level
    }

    #[inline]
    pub const fn index(self) -> Index {
        self.0 as Index
    }

    #[inline]
    pub const fn is_boundary(self) -> bool {
        self.level() == 0
    }

    /// Left child `(l+1, 2i-1)`; `None` on level 0 (use [`Self::LEVEL_ONE`])
    /// and on [`MAX_LEVEL`].
    #[inline]
    pub fn left_child(self) -> Option<Self> {
        let (l, i) = (self.level(), self.index());
        (l > 0 && l < MAX_LEVEL).then(|| Self::new_unchecked(l + 1, 2 * i - 1))
    }

    /// Right child `(l+1, 2i+1)`; `None` on level 0 and on [`MAX_LEVEL`].
    #[inline]
    pub fn right_child(self) -> Option<Self> {
        let (l, i) = (self.level(), self.index());
        (l > 0 && l < MAX_LEVEL).then(|| Self::new_unchecked(l + 1, 2 * i + 1))
    }

    /// All children in this dimension: one for the boundary anchors, two for
    /// interior functions, none on [`MAX_LEVEL`].
    pub fn children(self) -> impl Iterator<Item = LevelIndex> {
        let (first, second) = if self.is_boundary() {
            (Some(Self::LEVEL_ONE), None)
        } else {
            (self.left_child(), self.right_child())
        };
        first.into_iter().chain(second)
    }

    /// Hierarchical parent; `None` for levels 0 and 1.
    #[inline]
    pub fn parent(self) -> Option<Self> {
        let (l, i) = (self.level(), self.index());
        if l < 2 {
            return None;
        }
        let up = (i + 1) / 2;
        let parent_index = if up % 2 == 1 { up } else { (i - 1) / 2 };
        Some(Self::new_unchecked(l - 1, parent_index))
    }

    /// Index of the unique ancestor of `self` on `level` (`level <= self.level()`).
    #[inline]
    pub fn ancestor_index(self, level: Level) -> Index {
        debug_assert!(level >= 1 && level <= self.level());
        (self.index() >> (self.level() - level)) | 1
    }

    /// True iff `self` lies on the path from the root to `other` in this
    /// dimension (including `self == other`). Boundary anchors are ancestors
    /// of every function.
    pub fn is_ancestor_of(self, other: LevelIndex) -> bool {
        match (self.level(), other.level()) {
            (0, _) => true,
            (_, 0) => false,
            (l, m) if l > m => false,
            (l, _) => other.ancestor_index(l) == self.index(),
        }
    }

    /// Standard coordinate `i / 2^l` in `[0, 1]`.
    #[inline]
    pub fn coordinate(self) -> f64 {
        if self.is_boundary() {
            f64::from(self.index())
        } else {
            f64::from(self.index()) / (1u64 << self.level()) as f64
        }
    }
}

impl fmt::Debug for LevelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LevelIndex")
            .field(&self.level())
            .field(&self.index())
            .finish()
    }
}

impl fmt::Display for LevelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.level(), self.index())
    }
}

#[cfg(test)]
mod layout_tests {
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size};

    assert_eq_size!(LevelIndex, u64);
    assert_eq_align!(LevelIndex, u64);
}
