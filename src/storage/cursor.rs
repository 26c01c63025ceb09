//! GridCursor: hierarchical navigation over grid coordinates.
//!
//! A cursor is a plain value: moving it is pure arithmetic on the current
//! coordinates, and only [`GridCursor::seq`] consults a storage. The lookup
//! result is cached until the cursor moves or the storage version changes;
//! versions are unique across storages, so one cursor may serve several.

use super::hash_storage::GridStorage;
use super::level_index::{Index, Level, LevelIndex};
use super::point::GridPoint;
use crate::grid_error::GridError;

#[derive(Clone, Debug)]
pub struct GridCursor {
    point: GridPoint,
    /// `(storage version, lookup result)` of the last `seq()` call.
    cached: Option<(u64, Option<usize>)>,
}

impl GridCursor {
    /// Cursor at `(1, 1)` in every dimension.
    pub fn new(dimension: usize) -> Self {
        Self::at(GridPoint::new(dimension))
    }

    /// Cursor positioned on `point`.
    pub fn at(point: GridPoint) -> Self {
        GridCursor {
            point,
            cached: None,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.point.dimension()
    }

    /// Current coordinates.
    #[inline]
    pub fn point(&self) -> &GridPoint {
        &self.point
    }

    #[inline]
    pub fn get(&self, d: usize) -> LevelIndex {
        self.point.get(d)
    }

    /// Moves dimension `d` to `(level, index)`.
    ///
    /// # Errors
    /// `InvalidLevelIndex` if the pair is not a valid basis function; the
    /// cursor does not move.
    pub fn set(&mut self, d: usize, level: Level, index: Index) -> Result<(), GridError> {
        let li = LevelIndex::try_new(d, level, index)?;
        self.move_to(d, li);
        Ok(())
    }

    /// Moves to the left child in dimension `d`. Level-0 anchors move to
    /// `(1, 1)`. Returns `false` (and stays put) on [`MAX_LEVEL`](super::MAX_LEVEL).
    pub fn left_child(&mut self, d: usize) -> bool {
        let li = self.point.get(d);
        let next = if li.is_boundary() {
            Some(LevelIndex::LEVEL_ONE)
        } else {
            li.left_child()
        };
        self.try_move(d, next)
    }

    /// Moves to the right child in dimension `d`; see [`left_child`](Self::left_child).
    pub fn right_child(&mut self, d: usize) -> bool {
        let li = self.point.get(d);
        let next = if li.is_boundary() {
            Some(LevelIndex::LEVEL_ONE)
        } else {
            li.right_child()
        };
        self.try_move(d, next)
    }

    /// Moves to the next basis function on the same level in dimension `d`
    /// (index + 2, or + 1 on level 0). Returns `false` past the last one.
    pub fn step_right(&mut self, d: usize) -> bool {
        let li = self.point.get(d);
        let step = if li.is_boundary() { 1 } else { 2 };
        let next = li
            .index()
            .checked_add(step)
            .filter(|&i| LevelIndex::is_valid_pair(li.level(), i))
            .map(|i| LevelIndex::new_unchecked(li.level(), i));
        self.try_move(d, next)
    }

    /// Moves to the parent in dimension `d`; no-op on levels 0 and 1.
    pub fn up(&mut self, d: usize) -> bool {
        let parent = self.point.get(d).parent();
        self.try_move(d, parent)
    }

    pub fn reset_to_left_level_zero(&mut self, d: usize) {
        self.move_to(d, LevelIndex::LEFT_ZERO);
    }

    pub fn reset_to_right_level_zero(&mut self, d: usize) {
        self.move_to(d, LevelIndex::RIGHT_ZERO);
    }

    pub fn reset_to_level_one(&mut self, d: usize) {
        self.move_to(d, LevelIndex::LEVEL_ONE);
    }

    /// Moves every dimension to the left anchor `(0, 0)`.
    pub fn reset_to_level_zero(&mut self) {
        for d in 0..self.dimension() {
            self.point.set(d, LevelIndex::LEFT_ZERO);
        }
        self.cached = None;
    }

    /// Sequence number of the current position in `storage`, if stored.
    ///
    /// Performs at most one hash lookup per position.
    pub fn seq(&mut self, storage: &GridStorage) -> Option<usize> {
        match self.cached {
            Some((version, seq)) if version == storage.version() => seq,
            _ => {
                let seq = storage.find(&self.point);
                self.cached = Some((storage.version(), seq));
                seq
            }
        }
    }

    /// Leaf flag of the stored point at the current position; `true` if the
    /// position is not stored.
    pub fn hint(&mut self, storage: &GridStorage) -> bool {
        match self.seq(storage) {
            Some(seq) => storage[seq].is_leaf(),
            None => true,
        }
    }

    pub fn is_valid(&mut self, storage: &GridStorage) -> bool {
        self.seq(storage).is_some()
    }

    fn try_move(&mut self, d: usize, next: Option<LevelIndex>) -> bool {
        match next {
            Some(li) => {
                self.move_to(d, li);
                true
            }
            None => false,
        }
    }

    #[inline]
    fn move_to(&mut self, d: usize, li: LevelIndex) {
        self.point.set(d, li);
        self.cached = None;
    }
}
