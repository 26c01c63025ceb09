//! Indicator traits driving adaptive refinement and coarsening, plus the
//! surplus-based indicators.

use crate::storage::GridStorage;
use num_traits::ToPrimitive;

/// Scores grid points for refinement; higher is more urgent.
pub trait RefinementFunctor {
    /// Indicator value of the point stored at `seq`.
    fn value(&self, storage: &GridStorage, seq: usize) -> f64;
    /// Upper bound on the number of points refined per call.
    fn refinements_num(&self) -> usize;
    /// Points below this value are never refined.
    fn threshold(&self) -> f64;
    /// Values must exceed this to qualify at all.
    fn start(&self) -> f64 {
        0.0
    }
}

/// Scores leaf points for removal; lower is more removable.
pub trait CoarseningFunctor {
    fn value(&self, storage: &GridStorage, seq: usize) -> f64;
    /// Upper bound on the number of points removed per call.
    fn removements_num(&self) -> usize;
    /// Only points strictly below this value are removed.
    fn threshold(&self) -> f64;
    /// Values must lie strictly below this to qualify at all.
    fn start(&self) -> f64 {
        f64::INFINITY
    }
}

impl<F: RefinementFunctor + ?Sized> RefinementFunctor for &F {
    fn value(&self, storage: &GridStorage, seq: usize) -> f64 {
        (**self).value(storage, seq)
    }
    fn refinements_num(&self) -> usize {
        (**self).refinements_num()
    }
    fn threshold(&self) -> f64 {
        (**self).threshold()
    }
    fn start(&self) -> f64 {
        (**self).start()
    }
}

impl<F: CoarseningFunctor + ?Sized> CoarseningFunctor for &F {
    fn value(&self, storage: &GridStorage, seq: usize) -> f64 {
        (**self).value(storage, seq)
    }
    fn removements_num(&self) -> usize {
        (**self).removements_num()
    }
    fn threshold(&self) -> f64 {
        (**self).threshold()
    }
    fn start(&self) -> f64 {
        (**self).start()
    }
}

/// `|alpha[seq]|`, or 0 when `seq` has no coefficient or it is not representable as `f64`.
fn abs_surplus<T: ToPrimitive>(alpha: &[T], seq: usize) -> f64 {
    alpha
        .get(seq)
        .and_then(ToPrimitive::to_f64)
        .map_or(0.0, f64::abs)
}

/// Refines the points with the largest absolute hierarchical surplus.
#[derive(Clone, Copy, Debug)]
pub struct SurplusRefinementFunctor<'a, T> {
    alpha: &'a [T],
    refinements_num: usize,
    threshold: f64,
}

impl<'a, T: ToPrimitive> SurplusRefinementFunctor<'a, T> {
    pub fn new(alpha: &'a [T], refinements_num: usize, threshold: f64) -> Self {
        SurplusRefinementFunctor {
            alpha,
            refinements_num,
            threshold,
        }
    }
}

impl<T: ToPrimitive> RefinementFunctor for SurplusRefinementFunctor<'_, T> {
    fn value(&self, _storage: &GridStorage, seq: usize) -> f64 {
        abs_surplus(self.alpha, seq)
    }

    fn refinements_num(&self) -> usize {
        self.refinements_num
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Removes the leaves with the smallest absolute hierarchical surplus.
#[derive(Clone, Copy, Debug)]
pub struct SurplusCoarseningFunctor<'a, T> {
    alpha: &'a [T],
    removements_num: usize,
    threshold: f64,
}

impl<'a, T: ToPrimitive> SurplusCoarseningFunctor<'a, T> {
    pub fn new(alpha: &'a [T], removements_num: usize, threshold: f64) -> Self {
        SurplusCoarseningFunctor {
            alpha,
            removements_num,
            threshold,
        }
    }
}

impl<T: ToPrimitive> CoarseningFunctor for SurplusCoarseningFunctor<'_, T> {
    fn value(&self, _storage: &GridStorage, seq: usize) -> f64 {
        abs_surplus(self.alpha, seq)
    }

    fn removements_num(&self) -> usize {
        self.removements_num
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}
