//! Surplus-driven adaptivity: one refine-or-coarsen pass with coefficient
//! bookkeeping.

use crate::grid::Grid;
use crate::grid_error::GridError;
use crate::refinement::{
    CoarseningSummary, RefinementSummary, SurplusCoarseningFunctor, SurplusRefinementFunctor,
};
use crate::storage::Level;
use num_traits::{ToPrimitive, Zero};

/// Budgets and thresholds for one adaptivity pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptivityOptions {
    /// Maximum number of points refined.
    pub refinements_num: usize,
    /// Refine only points whose |surplus| is at least this value.
    pub refine_threshold: f64,
    /// Maximum number of leaves removed; `0` disables coarsening.
    pub removements_num: usize,
    /// Remove only leaves whose |surplus| is below this value.
    pub coarsen_threshold: f64,
    /// Cap on the level of points created by refinement.
    pub max_level: Option<Level>,
    /// Sequence numbers below this are never removed.
    pub protected_prefix: usize,
}

impl Default for AdaptivityOptions {
    fn default() -> Self {
        Self {
            refinements_num: 1,
            refine_threshold: 0.0,
            removements_num: 0,
            coarsen_threshold: 0.0,
            max_level: None,
            protected_prefix: 0,
        }
    }
}

/// What the driver did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdaptivityAction {
    /// Points were refined; the coefficients were extended with zeros.
    Refined(RefinementSummary),
    /// Leaves were removed; the coefficients were compacted.
    Coarsened(CoarseningSummary),
    /// Nothing qualified.
    NoChange,
}

/// Summary of one adaptivity pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdaptivityResult {
    /// Grid size before the pass.
    pub size_before: usize,
    /// Grid size after the pass.
    pub size_after: usize,
    pub action: AdaptivityAction,
}

/// Run one adaptivity pass driven by the absolute values of `coefficients`.
///
/// Refinement is preferred: if any point qualifies it is applied and
/// coarsening is not attempted in the same pass. New points receive a zero
/// coefficient; removed points drop theirs.
///
/// # Errors
/// `CoefficientLengthMismatch` if `coefficients.len() != grid.size()`, plus
/// whatever the refinement or coarsening call reports.
pub fn adapt_with_surpluses<T>(
    grid: &mut Grid,
    coefficients: &mut Vec<T>,
    options: AdaptivityOptions,
) -> Result<AdaptivityResult, GridError>
where
    T: ToPrimitive + Zero + Clone,
{
    let size_before = grid.size();
    if coefficients.len() != size_before {
        return Err(GridError::CoefficientLengthMismatch {
            expected: size_before,
            found: coefficients.len(),
        });
    }

    let refined = {
        let functor = SurplusRefinementFunctor::new(
            coefficients.as_slice(),
            options.refinements_num,
            options.refine_threshold,
        );
        match options.max_level {
            Some(max) => grid.refine_max_level(&functor, max)?,
            None => grid.refine(&functor)?,
        }
    };
    if !refined.refined_points.is_empty() {
        coefficients.resize(grid.size(), T::zero());
        log::debug!(
            "adapt: refined {} points, size {} -> {}",
            refined.refined_points.len(),
            size_before,
            grid.size()
        );
        return Ok(AdaptivityResult {
            size_before,
            size_after: grid.size(),
            action: AdaptivityAction::Refined(refined),
        });
    }

    if options.removements_num == 0 {
        return Ok(no_change(size_before));
    }
    let snapshot = coefficients.clone();
    let functor = SurplusCoarseningFunctor::new(
        &snapshot,
        options.removements_num,
        options.coarsen_threshold,
    );
    let coarsened = grid.coarsen_protecting(&functor, coefficients, options.protected_prefix)?;
    if coarsened.is_empty() {
        return Ok(no_change(size_before));
    }
    log::debug!(
        "adapt: coarsened {} points, size {} -> {}",
        coarsened.removed.len(),
        size_before,
        grid.size()
    );
    Ok(AdaptivityResult {
        size_before,
        size_after: grid.size(),
        action: AdaptivityAction::Coarsened(coarsened),
    })
}

fn no_change(size: usize) -> AdaptivityResult {
    AdaptivityResult {
        size_before: size,
        size_after: size,
        action: AdaptivityAction::NoChange,
    }
}
