//! GridStorage: hash-indexed sparse-grid points with dense sequence numbers.
//!
//! Points live in a `Vec` (the arena); a `hashbrown::HashMap` maps each
//! coordinate key to its position. Sequence numbers are always exactly
//! `0..len()`, so callers can keep coefficient vectors parallel to the
//! storage. Removal compacts the arena and hands back a [`Renumbering`].

use super::level_index::{Level, LevelIndex};
use super::point::GridPoint;
use super::renumber::Renumbering;
use crate::debug_invariants::{DebugInvariants, checks_enabled};
use crate::grid_error::GridError;
use hashbrown::HashMap;
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};

/// Current version of the serialized storage layout.
pub const STORAGE_FORMAT_VERSION: u32 = 1;

/// Source of storage versions, shared by every storage in the process.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// `GridStorage` maintains:
/// - `points`, the arena indexed by sequence number,
/// - `map`, from coordinate key to sequence number,
/// - the algorithmic dimensions used by operators that skip dimensions,
/// - and a `version` stamp renewed on every structural change.
///
/// # Invariants
///
/// - `map.len() == points.len()` and every point's key maps to its own
///   sequence number.
/// - Every point has `dimension()` components, each a valid level/index pair.
/// - For every point and every dimension with level `>= 2`, the parent in
///   that dimension is stored.
/// - Stored leaf flags agree with the presence of children.
///
/// These are checked after bulk mutations in debug builds and when the
/// `check-invariants` feature is enabled. They can also be verified manually
/// via [`validate_invariants`](DebugInvariants::validate_invariants).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "StorageRepr", into = "StorageRepr")]
pub struct GridStorage {
    dimension: usize,
    points: Vec<GridPoint>,
    map: HashMap<Box<[LevelIndex]>, usize>,
    algorithmic_dims: Vec<usize>,
    version: u64,
}

impl GridStorage {
    /// Empty storage for `dimension`-dimensional points.
    pub fn new(dimension: usize) -> Self {
        GridStorage {
            dimension,
            points: Vec::new(),
            map: HashMap::new(),
            algorithmic_dims: (0..dimension).collect(),
            version: next_version(),
        }
    }

    /// Insert `point` and return its sequence number.
    ///
    /// Re-inserting a stored point is a no-op that returns the existing
    /// sequence number. A new point is appended with sequence number
    /// `len()`; the leaf flags of stored points it is a child of are cleared
    /// and its own leaf flag is computed.
    ///
    /// # Errors
    /// `DimensionMismatch` or `InvalidLevelIndex`; nothing is inserted.
    ///
    /// # Example
    /// ```rust
    /// # fn try_main() -> Result<(), sparse_grid_hash::grid_error::GridError> {
    /// use sparse_grid_hash::storage::{GridPoint, GridStorage};
    /// let mut s = GridStorage::new(2);
    /// let p = GridPoint::try_from_pairs(&[(1, 1), (2, 3)])?;
    /// assert_eq!(s.insert(p.clone())?, 0);
    /// assert_eq!(s.insert(p.clone())?, 0);
    /// assert_eq!(s.find(&p), Some(0));
    /// # Ok(())
    /// # }
    /// # try_main().unwrap();
    /// ```
    ///
    /// # Complexity
    /// Amortized **O(d)** hash lookups.
    pub fn insert(&mut self, mut point: GridPoint) -> Result<usize, GridError> {
        self.check_dimension(point.dimension())?;
        point.validate()?;
        if let Some(&seq) = self.map.get(point.coords()) {
            return Ok(seq);
        }
        for seq in self.parent_seqs(&point) {
            self.points[seq].set_leaf(false);
        }
        point.set_leaf(self.compute_leaf(&point));
        let seq = self.points.len();
        self.map.insert(point.coords().into(), seq);
        self.points.push(point);
        self.bump();
        Ok(seq)
    }

    /// Replace the point stored at `seq`.
    ///
    /// # Errors
    /// `SequenceOutOfRange`, `DimensionMismatch`, `InvalidLevelIndex`, or
    /// `DuplicatePoint` if the new key is already stored elsewhere.
    pub fn update(&mut self, point: GridPoint, seq: usize) -> Result<(), GridError> {
        self.check_seq(seq)?;
        self.check_dimension(point.dimension())?;
        point.validate()?;
        match self.map.get(point.coords()) {
            Some(&other) if other == seq => return Ok(()),
            Some(&other) => {
                return Err(GridError::DuplicatePoint {
                    point: point.to_string(),
                    seq: other,
                });
            }
            None => {}
        }
        let old = std::mem::replace(&mut self.points[seq], point);
        self.map.remove(old.coords());
        self.map.insert(self.points[seq].coords().into(), seq);
        let mut touched = self.parent_seqs(&old);
        touched.extend(self.parent_seqs(&self.points[seq]));
        touched.push(seq);
        self.refresh_leaves(&touched);
        self.bump();
        Ok(())
    }

    /// Sequence number of `point`, if stored.
    #[inline]
    pub fn find(&self, point: &GridPoint) -> Option<usize> {
        self.find_key(point.coords())
    }

    /// Sequence number of the point with coordinate key `key`, if stored.
    #[inline]
    pub fn find_key(&self, key: &[LevelIndex]) -> Option<usize> {
        self.map.get(key).copied()
    }

    #[inline]
    pub fn contains(&self, point: &GridPoint) -> bool {
        self.map.contains_key(point.coords())
    }

    #[inline]
    pub fn get(&self, seq: usize) -> Option<&GridPoint> {
        self.points.get(seq)
    }

    /// Point at `seq`.
    ///
    /// # Errors
    /// `SequenceOutOfRange` if `seq >= len()`.
    pub fn point(&self, seq: usize) -> Result<&GridPoint, GridError> {
        self.points.get(seq).ok_or(GridError::SequenceOutOfRange {
            seq,
            size: self.points.len(),
        })
    }

    /// Remove the given points and compact the sequence numbers.
    ///
    /// Duplicates in `seqs` are ignored. Surviving points keep their relative
    /// order. Leaf flags of points that lost a child are recomputed.
    ///
    /// When invariant checking is enabled (debug builds, `check-invariants`,
    /// `strict-invariants`) a removal that would leave a surviving point
    /// without its parent, or a level-1 component without a stored level-0
    /// anchor, is refused; see [`remove_checked`](Self::remove_checked).
    ///
    /// # Errors
    /// `SequenceOutOfRange` or `StrandedPoint`; nothing is removed.
    ///
    /// # Complexity
    /// **O(n + k·d)** for `n` points and `k` removed points.
    pub fn remove(&mut self, seqs: &[usize]) -> Result<Renumbering, GridError> {
        let mask = self.removal_mask(seqs)?;
        if checks_enabled() {
            self.check_stranding(&mask)?;
        }
        Ok(self.remove_masked(&mask))
    }

    /// Like [`remove`](Self::remove), but always refuses to strand points.
    pub fn remove_checked(&mut self, seqs: &[usize]) -> Result<Renumbering, GridError> {
        let mask = self.removal_mask(seqs)?;
        self.check_stranding(&mask)?;
        Ok(self.remove_masked(&mask))
    }

    /// Remove the point with the highest sequence number.
    pub fn delete_last(&mut self) -> Option<GridPoint> {
        let point = self.points.pop()?;
        self.map.remove(point.coords());
        let parents = self.parent_seqs(&point);
        self.refresh_leaves(&parents);
        self.bump();
        Some(point)
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.points.clear();
        self.map.clear();
        self.bump();
    }

    /// Number of stored points.
    #[inline]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.points.len(), self.map.len());
        self.points.len()
    }

    /// Alias of [`len`](Self::len).
    #[inline]
    pub fn size(&self) -> usize {
        self.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Version stamp that changes whenever the stored point set changes.
    ///
    /// Stamps are drawn from a process-wide counter, so two storages report
    /// the same version only if one is an unmodified clone of the other.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// `(seq, point)` in sequence order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &GridPoint)> + '_ {
        self.points.iter().enumerate()
    }

    /// All points, indexed by sequence number.
    #[inline]
    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    /// Coordinate keys in sequence order.
    pub fn keys(&self) -> impl Iterator<Item = &[LevelIndex]> + '_ {
        self.points.iter().map(GridPoint::coords)
    }

    /// Largest level of any component of any point; 0 when empty.
    pub fn max_level(&self) -> Level {
        self.points.iter().map(GridPoint::level_max).max().unwrap_or(0)
    }

    /// Number of points without level-0 components.
    pub fn num_inner_points(&self) -> usize {
        self.points.iter().filter(|p| p.is_inner_point()).count()
    }

    pub fn has_boundary_points(&self) -> bool {
        self.points.iter().any(|p| !p.is_inner_point())
    }

    /// Whether the point at `seq` has no stored child, computed from the map
    /// rather than from the cached flag.
    pub fn is_leaf(&self, seq: usize) -> Result<bool, GridError> {
        Ok(self.compute_leaf(self.point(seq)?))
    }

    /// Whether the child of `point` obtained by replacing dimension `d` with
    /// `child` is stored.
    pub fn has_child(&self, point: &GridPoint, d: usize, child: LevelIndex) -> bool {
        self.find_with(point.coords(), d, child).is_some()
    }

    /// Recompute every cached leaf flag from the map.
    pub fn recalc_leaf_property(&mut self) {
        let flags: Vec<bool> = self.points.iter().map(|p| self.compute_leaf(p)).collect();
        for (p, leaf) in self.points.iter_mut().zip(flags) {
            p.set_leaf(leaf);
        }
    }

    /// Dimensions operators should treat as algorithmic (default: all).
    pub fn algorithmic_dimensions(&self) -> &[usize] {
        &self.algorithmic_dims
    }

    /// Set the algorithmic dimensions; duplicates are dropped and the list is
    /// sorted.
    ///
    /// # Errors
    /// `TooManyAlgorithmicDimensions` if more dimensions than `dimension()`
    /// are given or one is out of range.
    pub fn set_algorithmic_dimensions(&mut self, dims: Vec<usize>) -> Result<(), GridError> {
        if dims.len() > self.dimension || dims.iter().any(|&d| d >= self.dimension) {
            return Err(GridError::TooManyAlgorithmicDimensions {
                dims,
                dimension: self.dimension,
            });
        }
        let mut dims = dims;
        dims.sort_unstable();
        dims.dedup();
        self.algorithmic_dims = dims;
        Ok(())
    }

    /// Flattened `2^level` and index arrays, row-major `len() × dimension()`,
    /// as consumed by evaluation kernels.
    pub fn level_index_arrays(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.points.len() * self.dimension;
        let mut levels = Vec::with_capacity(n);
        let mut indices = Vec::with_capacity(n);
        for li in self.points.iter().flat_map(|p| p.coords().iter()) {
            levels.push((1u64 << li.level()) as f64);
            indices.push(f64::from(li.index()));
        }
        (levels, indices)
    }

    /// Sequence numbers of stored points that have `point` as a child.
    ///
    /// Level `>= 2` components contribute their parent; level-1 components
    /// contribute the two level-0 anchors.
    pub fn parent_seqs(&self, point: &GridPoint) -> Vec<usize> {
        let key = point.coords();
        let mut out = Vec::new();
        for (d, li) in key.iter().enumerate() {
            match li.level() {
                0 => {}
                1 => {
                    for anchor in [LevelIndex::LEFT_ZERO, LevelIndex::RIGHT_ZERO] {
                        out.extend(self.find_with(key, d, anchor));
                    }
                }
                _ => {
                    if let Some(parent) = li.parent() {
                        out.extend(self.find_with(key, d, parent));
                    }
                }
            }
        }
        out
    }

    /// Look up `key` with dimension `d` replaced by `li`.
    pub(crate) fn find_with(&self, key: &[LevelIndex], d: usize, li: LevelIndex) -> Option<usize> {
        let mut lookup: Vec<LevelIndex> = key.to_vec();
        lookup[d] = li;
        self.map.get(lookup.as_slice()).copied()
    }

    fn compute_leaf(&self, point: &GridPoint) -> bool {
        let key = point.coords();
        let mut lookup: Vec<LevelIndex> = key.to_vec();
        for (d, &li) in key.iter().enumerate() {
            for child in li.children() {
                lookup[d] = child;
                if self.map.contains_key(lookup.as_slice()) {
                    return false;
                }
            }
            lookup[d] = li;
        }
        true
    }

    fn refresh_leaves(&mut self, seqs: &[usize]) {
        for &seq in seqs {
            let leaf = self.compute_leaf(&self.points[seq]);
            self.points[seq].set_leaf(leaf);
        }
    }

    fn removal_mask(&self, seqs: &[usize]) -> Result<Vec<bool>, GridError> {
        let mut mask = vec![false; self.points.len()];
        for &seq in seqs {
            self.check_seq(seq)?;
            mask[seq] = true;
        }
        Ok(mask)
    }

    /// Fails if a surviving point has a removed parent. A level-0 anchor
    /// counts as parent of the level-1 point beside it.
    fn check_stranding(&self, mask: &[bool]) -> Result<(), GridError> {
        let mut lookup = Vec::with_capacity(self.dimension);
        for (seq, _) in mask.iter().enumerate().filter(|(_, gone)| **gone) {
            let key = self.points[seq].coords();
            for (d, &li) in key.iter().enumerate() {
                for child in li.children() {
                    lookup.clear();
                    lookup.extend_from_slice(key);
                    lookup[d] = child;
                    if let Some(&c) = self.map.get(lookup.as_slice()) {
                        if !mask[c] {
                            return Err(GridError::StrandedPoint {
                                point: self.points[c].to_string(),
                                seq: c,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_masked(&mut self, mask: &[bool]) -> Renumbering {
        let renumbering = Renumbering::from_removal_mask(mask);
        if renumbering.is_identity() {
            return renumbering;
        }
        let old_points = std::mem::take(&mut self.points);
        let mut removed = Vec::new();
        for (old, point) in old_points.into_iter().enumerate() {
            match renumbering.new_seq(old) {
                Some(new) => {
                    self.map.insert(point.coords().into(), new);
                    self.points.push(point);
                }
                None => {
                    self.map.remove(point.coords());
                    removed.push(point);
                }
            }
        }
        let parents: Vec<usize> = removed.iter().flat_map(|p| self.parent_seqs(p)).collect();
        self.refresh_leaves(&parents);
        self.bump();
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        self.debug_assert_invariants();
        renumbering
    }

    fn check_seq(&self, seq: usize) -> Result<(), GridError> {
        if seq < self.points.len() {
            Ok(())
        } else {
            Err(GridError::SequenceOutOfRange {
                seq,
                size: self.points.len(),
            })
        }
    }

    fn check_dimension(&self, found: usize) -> Result<(), GridError> {
        if found == self.dimension {
            Ok(())
        } else {
            Err(GridError::DimensionMismatch {
                expected: self.dimension,
                found,
            })
        }
    }

    #[inline]
    fn bump(&mut self) {
        self.version = next_version();
    }
}

impl Index<usize> for GridStorage {
    type Output = GridPoint;

    fn index(&self, seq: usize) -> &GridPoint {
        &self.points[seq]
    }
}

impl<'a> IntoIterator for &'a GridStorage {
    type Item = &'a GridPoint;
    type IntoIter = std::slice::Iter<'a, GridPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl DebugInvariants for GridStorage {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "GridStorage invalid");
    }

    fn validate_invariants(&self) -> Result<(), GridError> {
        // 1) density: map and arena agree
        if self.map.len() != self.points.len() {
            return Err(GridError::InvariantViolation(format!(
                "map holds {} keys but arena holds {} points",
                self.map.len(),
                self.points.len()
            )));
        }
        for (seq, p) in self.points.iter().enumerate() {
            match self.map.get(p.coords()) {
                Some(&s) if s == seq => {}
                Some(&s) => {
                    return Err(GridError::InvariantViolation(format!(
                        "point {p} at seq {seq} is indexed as seq {s}"
                    )));
                }
                None => {
                    return Err(GridError::InvariantViolation(format!(
                        "point {p} at seq {seq} missing from the map"
                    )));
                }
            }
        }

        // 2) shape and valid pairs
        for p in &self.points {
            self.check_dimension(p.dimension())?;
            p.validate()?;
        }

        // 3) ancestor completeness
        for (seq, p) in self.points.iter().enumerate() {
            for (d, li) in p.coords().iter().enumerate() {
                if let Some(parent) = li.parent() {
                    if self.find_with(p.coords(), d, parent).is_none() {
                        return Err(GridError::InvariantViolation(format!(
                            "point {p} at seq {seq} misses its parent in dimension {d}"
                        )));
                    }
                }
            }
        }

        // 4) leaf flags
        for (seq, p) in self.points.iter().enumerate() {
            if p.is_leaf() != self.compute_leaf(p) {
                return Err(GridError::InvariantViolation(format!(
                    "stale leaf flag on point {p} at seq {seq}"
                )));
            }
        }
        Ok(())
    }
}

/// Serialized form of a [`GridStorage`]. Leaf flags are recomputed on load.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StorageRepr {
    pub format_version: u32,
    pub dimension: usize,
    pub algorithmic_dimensions: Vec<usize>,
    pub points: Vec<GridPoint>,
}

impl From<GridStorage> for StorageRepr {
    fn from(s: GridStorage) -> Self {
        StorageRepr {
            format_version: STORAGE_FORMAT_VERSION,
            dimension: s.dimension,
            algorithmic_dimensions: s.algorithmic_dims,
            points: s.points,
        }
    }
}

impl TryFrom<StorageRepr> for GridStorage {
    type Error = GridError;

    fn try_from(repr: StorageRepr) -> Result<Self, GridError> {
        if repr.format_version > STORAGE_FORMAT_VERSION {
            return Err(GridError::UnsupportedFormatVersion {
                found: repr.format_version,
                supported: STORAGE_FORMAT_VERSION,
            });
        }
        let mut storage = GridStorage::new(repr.dimension);
        storage.set_algorithmic_dimensions(repr.algorithmic_dimensions)?;
        storage.points.reserve(repr.points.len());
        for point in repr.points {
            storage.check_dimension(point.dimension())?;
            point.validate()?;
            let seq = storage.points.len();
            if let Some(&prev) = storage.map.get(point.coords()) {
                return Err(GridError::DuplicatePoint {
                    point: point.to_string(),
                    seq: prev,
                });
            }
            storage.map.insert(point.coords().into(), seq);
            storage.points.push(point);
        }
        storage.recalc_leaf_property();
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::level_index::Index as Idx;

    fn pt(pairs: &[(Level, Idx)]) -> GridPoint {
        GridPoint::try_from_pairs(pairs).unwrap()
    }

    /// 1-d storage holding (1,1), (2,1), (2,3).
    fn small_1d() -> GridStorage {
        let mut s = GridStorage::new(1);
        s.insert(pt(&[(1, 1)])).unwrap();
        s.insert(pt(&[(2, 1)])).unwrap();
        s.insert(pt(&[(2, 3)])).unwrap();
        s
    }

    #[test]
    fn insert_and_lookup() {
        let s = small_1d();
        assert_eq!(s.len(), 3);
        assert_eq!(s.find(&pt(&[(2, 3)])), Some(2));
        assert_eq!(s[1], pt(&[(2, 1)]));
        assert!(s.contains(&pt(&[(1, 1)])));
        assert!(s.find(&pt(&[(3, 1)])).is_none());
        assert!(s.get(3).is_none());
        assert!(matches!(
            s.point(3),
            Err(GridError::SequenceOutOfRange { seq: 3, size: 3 })
        ));
    }

    #[test]
    fn reinsert_is_idempotent() {
        let mut s = small_1d();
        let v = s.version();
        assert_eq!(s.insert(pt(&[(2, 1)])).unwrap(), 1);
        assert_eq!(s.len(), 3);
        assert_eq!(s.version(), v);
    }

    #[test]
    fn insert_rejects_bad_points() {
        let mut s = GridStorage::new(2);
        assert_eq!(
            s.insert(pt(&[(1, 1)])),
            Err(GridError::DimensionMismatch { expected: 2, found: 1 })
        );
        let bad = GridPoint::from_coords(vec![
            LevelIndex::LEVEL_ONE,
            LevelIndex::new_unchecked(2, 2),
        ]);
        assert!(matches!(
            s.insert(bad),
            Err(GridError::InvalidLevelIndex { dim: 1, .. })
        ));
        assert!(s.is_empty());
    }

    #[test]
    fn leaf_flags_follow_insertion() {
        let mut s = GridStorage::new(1);
        s.insert(pt(&[(1, 1)])).unwrap();
        assert!(s[0].is_leaf());
        s.insert(pt(&[(2, 1)])).unwrap();
        assert!(!s[0].is_leaf());
        assert!(s[1].is_leaf());
        s.validate_invariants().unwrap();
    }

    #[test]
    fn remove_compacts_and_recomputes_leaves() {
        let mut s = small_1d();
        let r = s.remove(&[1, 2, 2]).unwrap();
        assert_eq!(r.removed(), vec![1, 2]);
        assert_eq!(s.len(), 1);
        assert!(s[0].is_leaf());
        s.validate_invariants().unwrap();
    }

    #[test]
    fn remove_middle_renumbers() {
        let mut s = small_1d();
        let r = s.remove(&[1]).unwrap();
        assert_eq!(r.new_seq(2), Some(1));
        assert_eq!(s.find(&pt(&[(2, 3)])), Some(1));
        assert!(!s[0].is_leaf());
    }

    #[test]
    fn remove_out_of_range_removes_nothing() {
        let mut s = small_1d();
        assert!(matches!(
            s.remove(&[0, 7]),
            Err(GridError::SequenceOutOfRange { seq: 7, .. })
        ));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn remove_checked_refuses_to_strand() {
        let mut s = small_1d();
        let err = s.remove_checked(&[0]).unwrap_err();
        assert!(matches!(err, GridError::StrandedPoint { seq: 1, .. }));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn remove_checked_keeps_anchors_of_surviving_points() {
        let mut s = GridStorage::new(1);
        for pairs in [[(0, 0)], [(0, 1)], [(1, 1)]] {
            s.insert(pt(&pairs)).unwrap();
        }
        assert!(matches!(
            s.remove_checked(&[1]),
            Err(GridError::StrandedPoint { seq: 2, .. })
        ));
        assert_eq!(s.len(), 3);
        let r = s.remove_checked(&[2]).unwrap();
        assert_eq!(r.new_len(), 2);
        assert!(s[0].is_leaf() && s[1].is_leaf());
    }

    #[test]
    fn delete_last_and_clear() {
        let mut s = small_1d();
        assert_eq!(s.delete_last(), Some(pt(&[(2, 3)])));
        assert!(!s[0].is_leaf());
        s.delete_last();
        assert!(s[0].is_leaf());
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.delete_last(), None);
    }

    #[test]
    fn update_replaces_point() {
        let mut s = small_1d();
        assert!(matches!(
            s.update(pt(&[(2, 1)]), 2),
            Err(GridError::DuplicatePoint { seq: 1, .. })
        ));
        s.update(pt(&[(3, 1)]), 2).unwrap();
        assert_eq!(s.find(&pt(&[(3, 1)])), Some(2));
        assert!(s.find(&pt(&[(2, 3)])).is_none());
        assert!(!s[1].is_leaf());
        assert!(s[2].is_leaf());
    }

    #[test]
    fn boundary_anchors_lose_leaf_flag() {
        let mut s = GridStorage::new(1);
        s.insert(pt(&[(0, 0)])).unwrap();
        s.insert(pt(&[(0, 1)])).unwrap();
        assert!(s[0].is_leaf() && s[1].is_leaf());
        s.insert(pt(&[(1, 1)])).unwrap();
        assert!(!s[0].is_leaf() && !s[1].is_leaf());
        assert!(s.has_boundary_points());
        assert_eq!(s.num_inner_points(), 1);
        assert_eq!(s.parent_seqs(&pt(&[(1, 1)])), vec![0, 1]);
    }

    #[test]
    fn algorithmic_dimensions() {
        let mut s = GridStorage::new(3);
        assert_eq!(s.algorithmic_dimensions(), &[0, 1, 2]);
        s.set_algorithmic_dimensions(vec![2, 0, 2]).unwrap();
        assert_eq!(s.algorithmic_dimensions(), &[0, 2]);
        assert!(matches!(
            s.set_algorithmic_dimensions(vec![3]),
            Err(GridError::TooManyAlgorithmicDimensions { dimension: 3, .. })
        ));
        assert!(s.set_algorithmic_dimensions(vec![0, 1, 2, 0]).is_err());
    }

    #[test]
    fn level_index_arrays_are_row_major() {
        let mut s = GridStorage::new(2);
        s.insert(pt(&[(1, 1), (2, 3)])).unwrap();
        let (levels, indices) = s.level_index_arrays();
        assert_eq!(levels, vec![2.0, 4.0]);
        assert_eq!(indices, vec![1.0, 3.0]);
        assert_eq!(s.max_level(), 2);
    }

    #[test]
    fn validate_detects_missing_parent() {
        let mut s = GridStorage::new(1);
        s.insert(pt(&[(3, 5)])).unwrap();
        assert!(matches!(
            s.validate_invariants(),
            Err(GridError::InvariantViolation(_))
        ));
    }

    #[test]
    fn validate_detects_stale_leaf_flag() {
        let mut s = small_1d();
        s.points[0].set_leaf(true);
        assert!(s.validate_invariants().is_err());
        s.recalc_leaf_property();
        s.validate_invariants().unwrap();
    }

    #[test]
    fn serde_roundtrip() {
        let s = small_1d();
        let json = serde_json::to_string(&s).unwrap();
        let back: GridStorage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.points(), s.points());
        assert_eq!(back.find(&pt(&[(2, 3)])), Some(2));
        back.validate_invariants().unwrap();
    }

    #[test]
    fn deserialize_rejects_duplicates_and_newer_versions() {
        let repr = StorageRepr {
            format_version: STORAGE_FORMAT_VERSION,
            dimension: 1,
            algorithmic_dimensions: vec![0],
            points: vec![pt(&[(1, 1)]), pt(&[(1, 1)])],
        };
        assert!(matches!(
            GridStorage::try_from(repr.clone()),
            Err(GridError::DuplicatePoint { seq: 0, .. })
        ));
        let newer = StorageRepr {
            format_version: STORAGE_FORMAT_VERSION + 1,
            points: vec![],
            ..repr
        };
        assert!(matches!(
            GridStorage::try_from(newer),
            Err(GridError::UnsupportedFormatVersion { .. })
        ));
    }
}
