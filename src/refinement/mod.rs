//! Adaptive refinement and coarsening driven by caller-supplied indicators.

pub mod functor;
pub mod hash_coarsening;
pub mod hash_refinement;
mod selection;

pub use functor::{
    CoarseningFunctor, RefinementFunctor, SurplusCoarseningFunctor, SurplusRefinementFunctor,
};
pub use hash_coarsening::{CoarseningSummary, HashCoarsening};
pub use hash_refinement::{HashRefinement, RefinementSummary};
