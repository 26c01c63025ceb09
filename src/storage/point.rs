//! `GridPoint`: a `d`-dimensional sparse-grid point plus its leaf flag.

use super::level_index::{Index, Level, LevelIndex};
use crate::grid_error::GridError;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One grid point: `d` level/index pairs and a leaf flag.
///
/// The leaf flag records that no child of the point is stored. It is owned by
/// [`GridStorage`](super::GridStorage) and is *not* part of the point's
/// identity: equality and hashing look at the coordinates only.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct GridPoint {
    coords: Box<[LevelIndex]>,
    leaf: bool,
}

impl GridPoint {
    /// A point at `(1, 1)` in every dimension.
    pub fn new(dimension: usize) -> Self {
        Self::from_coords(vec![LevelIndex::LEVEL_ONE; dimension])
    }

    /// Wraps already packed coordinates; the leaf flag starts out `false`.
    pub fn from_coords(coords: impl Into<Box<[LevelIndex]>>) -> Self {
        GridPoint {
            coords: coords.into(),
            leaf: false,
        }
    }

    /// Builds a point from `(level, index)` pairs, validating each one.
    ///
    /// # Errors
    /// `InvalidLevelIndex` for the first pair that is not a valid basis function.
    pub fn try_from_pairs(pairs: &[(Level, Index)]) -> Result<Self, GridError> {
        let coords = pairs
            .iter()
            .enumerate()
            .map(|(d, &(l, i))| LevelIndex::try_new(d, l, i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_coords(coords))
    }

    /// Builds a point from parallel level and index slices.
    pub fn try_from_parts(levels: &[Level], indices: &[Index]) -> Result<Self, GridError> {
        if levels.len() != indices.len() {
            return Err(GridError::DimensionMismatch {
                expected: levels.len(),
                found: indices.len(),
            });
        }
        let pairs: Vec<_> = levels.iter().copied().zip(indices.iter().copied()).collect();
        Self::try_from_pairs(&pairs)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    /// The coordinate key used by the storage map.
    #[inline]
    pub fn coords(&self) -> &[LevelIndex] {
        &self.coords
    }

    /// Level/index pair in dimension `d`.
    ///
    /// # Panics
    /// If `d >= self.dimension()`.
    #[inline]
    pub fn get(&self, d: usize) -> LevelIndex {
        self.coords[d]
    }

    #[inline]
    pub fn level(&self, d: usize) -> Level {
        self.coords[d].level()
    }

    #[inline]
    pub fn index(&self, d: usize) -> Index {
        self.coords[d].index()
    }

    /// Overwrites dimension `d`. Does not touch the leaf flag.
    #[inline]
    pub fn set(&mut self, d: usize, li: LevelIndex) {
        self.coords[d] = li;
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[inline]
    pub(crate) fn set_leaf(&mut self, leaf: bool) {
        self.leaf = leaf;
    }

    /// Copy of this point with dimension `d` replaced.
    pub fn with(&self, d: usize, li: LevelIndex) -> GridPoint {
        let mut p = GridPoint::from_coords(self.coords.clone());
        p.coords[d] = li;
        p
    }

    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.coords.iter().map(|li| li.level())
    }

    pub fn indices(&self) -> impl Iterator<Item = Index> + '_ {
        self.coords.iter().map(|li| li.index())
    }

    pub fn level_sum(&self) -> u64 {
        self.levels().map(u64::from).sum()
    }

    /// Largest level over all dimensions; 0 for a zero-dimensional point.
    pub fn level_max(&self) -> Level {
        self.levels().max().unwrap_or(0)
    }

    /// Smallest level over all dimensions; 0 for a zero-dimensional point.
    pub fn level_min(&self) -> Level {
        self.levels().min().unwrap_or(0)
    }

    /// True iff no component sits on level 0.
    pub fn is_inner_point(&self) -> bool {
        self.coords.iter().all(|li| !li.is_boundary())
    }

    /// Dimensions whose level is above 1.
    pub fn active_dims(&self) -> impl Iterator<Item = usize> + '_ {
        self.coords
            .iter()
            .enumerate()
            .filter(|(_, li)| li.level() > 1)
            .map(|(d, _)| d)
    }

    /// `active_pattern()[d]` iff dimension `d` is active.
    pub fn active_pattern(&self) -> Vec<bool> {
        self.coords.iter().map(|li| li.level() > 1).collect()
    }

    /// True iff `self` is a (non-strict) hierarchical ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &GridPoint) -> bool {
        self.dimension() == other.dimension()
            && self
                .coords
                .iter()
                .zip(other.coords.iter())
                .all(|(a, b)| a.is_ancestor_of(*b))
    }

    /// Standard coordinate in dimension `d`.
    #[inline]
    pub fn coordinate(&self, d: usize) -> f64 {
        self.coords[d].coordinate()
    }

    pub fn coordinates(&self) -> Vec<f64> {
        self.coords.iter().map(|li| li.coordinate()).collect()
    }

    /// Checks every pair against the level/index rule.
    pub fn validate(&self) -> Result<(), GridError> {
        for (d, li) in self.coords.iter().enumerate() {
            LevelIndex::try_new(d, li.level(), li.index())?;
        }
        Ok(())
    }
}

impl PartialEq for GridPoint {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}

impl Eq for GridPoint {}

impl Hash for GridPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.coords.hash(state);
    }
}

impl fmt::Debug for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridPoint")
            .field("coords", &self.coords)
            .field("leaf", &self.leaf)
            .finish()
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (d, li) in self.coords.iter().enumerate() {
            if d > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{li}")?;
        }
        write!(f, "]")
    }
}
