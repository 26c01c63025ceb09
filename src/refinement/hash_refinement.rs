//! Functor-driven adaptive refinement.
//!
//! # Expected invariants
//! - The storage is ancestor-complete on entry (every level `>= 2`
//!   component has its parent stored). Every point created here is preceded
//!   by its missing ancestors, so the invariant still holds on return.
//! - In boundary mode every level-1 component additionally gets both level-0
//!   anchors of its dimension, and a new point on anchor `(0,0)` or `(0,1)`
//!   is always accompanied by its mirror on the other anchor.
//!
//! Candidates are ranked by the magnitude of the functor value, so signed
//! error indicators work as they are.
//!
//! New points are appended, so they receive sequence numbers
//! `old_len..new_len`; callers extend parallel coefficient vectors by
//! [`RefinementSummary::inserted`].

use super::functor::RefinementFunctor;
use super::selection::{BestK, Keep};
use crate::debug_invariants::DebugInvariants;
use crate::generation::IndexInSubspaceGenerator;
use crate::grid_error::GridError;
use crate::storage::{GridPoint, GridStorage, Level, LevelIndex, MAX_LEVEL};
use hashbrown::HashMap;

/// Outcome of one refinement call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefinementSummary {
    /// Sequence numbers of the refined points, ascending.
    pub refined_points: Vec<usize>,
    /// Number of points appended to the storage.
    pub inserted: usize,
}

impl RefinementSummary {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }
}

/// Refines the points a [`RefinementFunctor`] ranks highest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HashRefinement {
    boundaries: bool,
}

impl HashRefinement {
    /// Refinement for grids without level-0 points.
    pub fn new() -> Self {
        HashRefinement { boundaries: false }
    }

    /// Refinement that keeps level-0 anchors consistent.
    pub fn with_boundaries() -> Self {
        HashRefinement { boundaries: true }
    }

    pub fn has_boundaries(&self) -> bool {
        self.boundaries
    }

    /// Refine up to `functor.refinements_num()` points.
    ///
    /// Every point with a missing child is scored by `|value|`; the
    /// best-scoring points whose magnitude exceeds `start()` and reaches
    /// `threshold()` get all their missing children, created in dimension
    /// order, left before right.
    ///
    /// An empty storage or a zero budget is a successful no-op.
    ///
    /// # Complexity
    /// **O(n·d + n log k)** for the scan plus the cost of the insertions.
    pub fn free_refine<F>(
        &self,
        storage: &mut GridStorage,
        functor: &F,
    ) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        self.refine_up_to(storage, functor, MAX_LEVEL)
    }

    /// Like [`free_refine`](Self::free_refine), but never creates children
    /// above `max_level`.
    ///
    /// # Errors
    /// `InvalidLevel` if `max_level > MAX_LEVEL`.
    pub fn refine_max_level<F>(
        &self,
        storage: &mut GridStorage,
        functor: &F,
        max_level: Level,
    ) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        check_max_level(max_level)?;
        self.refine_up_to(storage, functor, max_level)
    }

    /// Subspace refinement.
    ///
    /// The indicator magnitude of every refinable point is added to the
    /// subspace of its first missing child; the best `refinements_num()` subspaces whose
    /// accumulated value exceeds `start()` and reaches `threshold()` are
    /// created completely.
    pub fn free_refine_subspace<F>(
        &self,
        storage: &mut GridStorage,
        functor: &F,
    ) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        let budget = functor.refinements_num();
        if storage.is_empty() || budget == 0 {
            return Ok(RefinementSummary::default());
        }
        let mut slots: HashMap<Vec<Level>, usize> = HashMap::new();
        let mut subspaces: Vec<(Vec<Level>, f64, Vec<usize>)> = Vec::new();
        for (seq, point) in storage.iter() {
            let Some((d, child)) = self.first_missing_child(storage, point, MAX_LEVEL) else {
                continue;
            };
            let mut levels: Vec<Level> = point.levels().collect();
            levels[d] = child.level();
            let value = functor.value(storage, seq).abs();
            let slot = *slots.entry(levels.clone()).or_insert_with(|| {
                subspaces.push((levels, 0.0, Vec::new()));
                subspaces.len() - 1
            });
            subspaces[slot].1 += value;
            subspaces[slot].2.push(seq);
        }

        let mut best = BestK::new(budget, Keep::Largest);
        for (slot, (_, acc, _)) in subspaces.iter().enumerate() {
            if *acc > functor.start() && *acc >= functor.threshold() {
                best.push(*acc, slot);
            }
        }

        let before = storage.len();
        let mut refined = Vec::new();
        for (slot, acc) in best.into_sorted() {
            let (levels, _, contributors) = &subspaces[slot];
            log::trace!("refining subspace {levels:?} (accumulated {acc})");
            for point in IndexInSubspaceGenerator::try_new(levels)?.into_points() {
                self.create_with_ancestors(storage, point)?;
            }
            refined.extend_from_slice(contributors);
        }
        refined.sort_unstable();
        let summary = RefinementSummary {
            refined_points: refined,
            inserted: storage.len() - before,
        };
        log::debug!(
            "subspace refinement: {} points inserted, size {} -> {}",
            summary.inserted,
            before,
            storage.len()
        );
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        storage.debug_assert_invariants();
        Ok(summary)
    }

    /// Number of points with at least one missing child.
    pub fn number_of_refinable_points(&self, storage: &GridStorage) -> usize {
        self.count_refinable(storage, MAX_LEVEL)
    }

    /// Number of points with a missing child on a level `<= max_level`.
    ///
    /// # Errors
    /// `InvalidLevel` if `max_level > MAX_LEVEL`.
    pub fn number_of_refinable_points_to_max_level(
        &self,
        storage: &GridStorage,
        max_level: Level,
    ) -> Result<usize, GridError> {
        check_max_level(max_level)?;
        Ok(self.count_refinable(storage, max_level))
    }

    /// Create every missing child of the point at `seq`, regardless of any
    /// indicator. Returns the number of inserted points.
    ///
    /// # Errors
    /// `SequenceOutOfRange` if `seq >= storage.len()`.
    pub fn refine_point(&self, storage: &mut GridStorage, seq: usize) -> Result<usize, GridError> {
        let before = storage.len();
        self.refine_point_up_to(storage, seq, MAX_LEVEL)?;
        Ok(storage.len() - before)
    }

    fn refine_up_to<F>(
        &self,
        storage: &mut GridStorage,
        functor: &F,
        limit: Level,
    ) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        let budget = functor.refinements_num();
        if storage.is_empty() || budget == 0 {
            return Ok(RefinementSummary::default());
        }
        let (start, threshold) = (functor.start(), functor.threshold());
        let mut best = BestK::new(budget, Keep::Largest);
        for (seq, point) in storage.iter() {
            if !self.is_refinable(storage, point, limit) {
                continue;
            }
            let value = functor.value(storage, seq).abs();
            if value > start && value >= threshold {
                best.push(value, seq);
            }
        }

        let mut refined: Vec<usize> = best.into_sorted().into_iter().map(|(seq, _)| seq).collect();
        refined.sort_unstable();
        let before = storage.len();
        for &seq in &refined {
            log::trace!("refining point {} (seq {seq})", storage[seq]);
            self.refine_point_up_to(storage, seq, limit)?;
        }
        let summary = RefinementSummary {
            refined_points: refined,
            inserted: storage.len() - before,
        };
        log::debug!(
            "refinement: {} points refined, {} inserted, size {} -> {}",
            summary.refined_points.len(),
            summary.inserted,
            before,
            storage.len()
        );
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        storage.debug_assert_invariants();
        Ok(summary)
    }

    fn refine_point_up_to(
        &self,
        storage: &mut GridStorage,
        seq: usize,
        limit: Level,
    ) -> Result<(), GridError> {
        let point = storage.point(seq)?.clone();
        for d in 0..point.dimension() {
            for child in point.get(d).children().filter(|c| c.level() <= limit) {
                if !storage.has_child(&point, d, child) {
                    self.create_with_ancestors(storage, point.with(d, child))?;
                }
            }
        }
        Ok(())
    }

    /// Insert `point` after all of its missing ancestors; in boundary mode
    /// also insert its mirror on the opposite anchor of every level-0
    /// component.
    fn create_with_ancestors(
        &self,
        storage: &mut GridStorage,
        point: GridPoint,
    ) -> Result<usize, GridError> {
        if let Some(seq) = storage.find(&point) {
            return Ok(seq);
        }
        for d in 0..point.dimension() {
            let li = point.get(d);
            if let Some(parent) = li.parent() {
                self.create_with_ancestors(storage, point.with(d, parent))?;
            } else if self.boundaries && li.level() == 1 {
                for anchor in [LevelIndex::LEFT_ZERO, LevelIndex::RIGHT_ZERO] {
                    self.create_with_ancestors(storage, point.with(d, anchor))?;
                }
            }
        }
        let mirrors: Vec<GridPoint> = if self.boundaries {
            (0..point.dimension())
                .filter_map(|d| opposite_anchor(point.get(d)).map(|a| point.with(d, a)))
                .collect()
        } else {
            Vec::new()
        };
        let seq = storage.insert(point)?;
        log::trace!("inserted point {} (seq {seq})", storage[seq]);
        for mirror in mirrors {
            self.create_with_ancestors(storage, mirror)?;
        }
        Ok(seq)
    }

    fn is_refinable(&self, storage: &GridStorage, point: &GridPoint, limit: Level) -> bool {
        self.first_missing_child(storage, point, limit).is_some()
    }

    /// First `(dimension, child)` in dimension order, left before right, that
    /// is not stored and does not exceed `limit`.
    fn first_missing_child(
        &self,
        storage: &GridStorage,
        point: &GridPoint,
        limit: Level,
    ) -> Option<(usize, LevelIndex)> {
        (0..point.dimension()).find_map(|d| {
            point
                .get(d)
                .children()
                .filter(|c| c.level() <= limit)
                .find(|&c| !storage.has_child(point, d, c))
                .map(|c| (d, c))
        })
    }

    fn count_refinable(&self, storage: &GridStorage, limit: Level) -> usize {
        storage
            .points()
            .iter()
            .filter(|p| self.is_refinable(storage, p, limit))
            .count()
    }
}

fn opposite_anchor(li: LevelIndex) -> Option<LevelIndex> {
    match li {
        LevelIndex::LEFT_ZERO => Some(LevelIndex::RIGHT_ZERO),
        LevelIndex::RIGHT_ZERO => Some(LevelIndex::LEFT_ZERO),
        _ => None,
    }
}

fn check_max_level(max_level: Level) -> Result<(), GridError> {
    if max_level > MAX_LEVEL {
        Err(GridError::InvalidLevel {
            level: max_level,
            reason: "refinement cap exceeds MAX_LEVEL",
        })
    } else {
        Ok(())
    }
}
