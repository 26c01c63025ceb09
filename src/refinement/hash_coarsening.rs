//! Functor-driven coarsening: removal of low-value leaf points.
//!
//! Only leaves are candidates, so a removal can never leave a point without
//! its parent. The coefficient vector handed in is compacted with the
//! returned [`Renumbering`] so it stays index-consistent with the storage.

use super::functor::CoarseningFunctor;
use super::selection::{BestK, Keep};
use crate::grid_error::GridError;
use crate::storage::{GridStorage, Renumbering};

/// Outcome of one coarsening call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoarseningSummary {
    /// Pre-removal sequence numbers of the removed points, ascending.
    pub removed: Vec<usize>,
    /// Old→new mapping of the surviving points.
    pub renumbering: Renumbering,
}

impl CoarseningSummary {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// Removes the leaves a [`CoarseningFunctor`] ranks lowest and remembers
/// which sequence numbers the last call deleted.
#[derive(Clone, Debug, Default)]
pub struct HashCoarsening {
    deleted: Vec<usize>,
}

impl HashCoarsening {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarsen over the whole storage.
    pub fn free_coarsen<F, T>(
        &mut self,
        storage: &mut GridStorage,
        functor: &F,
        coefficients: &mut Vec<T>,
    ) -> Result<CoarseningSummary, GridError>
    where
        F: CoarseningFunctor + ?Sized,
    {
        let n = storage.len();
        self.free_coarsen_n_first_only(storage, functor, coefficients, n, 0)
    }

    /// Coarsen over the whole storage and append the removed (pre-removal)
    /// sequence numbers to `removed`.
    pub fn free_coarsen_with_removed<F, T>(
        &mut self,
        storage: &mut GridStorage,
        functor: &F,
        coefficients: &mut Vec<T>,
        removed: &mut Vec<usize>,
    ) -> Result<CoarseningSummary, GridError>
    where
        F: CoarseningFunctor + ?Sized,
    {
        let summary = self.free_coarsen(storage, functor, coefficients)?;
        removed.extend_from_slice(&summary.removed);
        Ok(summary)
    }

    /// Coarsen, considering only leaves with sequence numbers in
    /// `[min_index_considered, min(num_first_points, len))`.
    ///
    /// A candidate qualifies if its value lies strictly below both `start()`
    /// and `threshold()`; the `removements_num()` lowest are removed, ties
    /// going to the lower sequence number.
    ///
    /// # Errors
    /// `CoefficientLengthMismatch` if `coefficients.len() != storage.len()`;
    /// nothing is touched in that case.
    pub fn free_coarsen_n_first_only<F, T>(
        &mut self,
        storage: &mut GridStorage,
        functor: &F,
        coefficients: &mut Vec<T>,
        num_first_points: usize,
        min_index_considered: usize,
    ) -> Result<CoarseningSummary, GridError>
    where
        F: CoarseningFunctor + ?Sized,
    {
        if coefficients.len() != storage.len() {
            return Err(GridError::CoefficientLengthMismatch {
                expected: storage.len(),
                found: coefficients.len(),
            });
        }
        self.deleted.clear();
        let end = num_first_points.min(storage.len());
        let budget = functor.removements_num();
        if min_index_considered >= end || budget == 0 {
            return Ok(CoarseningSummary {
                removed: Vec::new(),
                renumbering: Renumbering::identity(storage.len()),
            });
        }

        let (start, threshold) = (functor.start(), functor.threshold());
        let mut best = BestK::new(budget, Keep::Smallest);
        for seq in min_index_considered..end {
            if !storage[seq].is_leaf() {
                continue;
            }
            let value = functor.value(storage, seq);
            if value < start && value < threshold {
                best.push(value, seq);
            }
        }
        let mut removed: Vec<usize> = best.into_sorted().into_iter().map(|(seq, _)| seq).collect();
        removed.sort_unstable();
        for &seq in &removed {
            log::trace!("removing leaf {} (seq {seq})", storage[seq]);
        }

        let before = storage.len();
        let renumbering = storage.remove(&removed)?;
        renumbering.apply(coefficients)?;
        log::debug!(
            "coarsening: {} points removed, size {} -> {}",
            removed.len(),
            before,
            storage.len()
        );
        self.deleted = removed.clone();
        Ok(CoarseningSummary {
            removed,
            renumbering,
        })
    }

    /// Pre-removal sequence numbers deleted by the last call, ascending.
    pub fn deleted_points(&self) -> &[usize] {
        &self.deleted
    }

    /// Number of leaf points, i.e. points that may be removed.
    pub fn number_of_removable_points(&self, storage: &GridStorage) -> usize {
        storage.points().iter().filter(|p| p.is_leaf()).count()
    }
}
