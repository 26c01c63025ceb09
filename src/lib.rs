#![cfg_attr(docsrs, feature(doc_cfg))]
//! # sparse-grid-hash
//!
//! sparse-grid-hash is a hash-based storage for adaptive sparse grids. Grid points are
//! stored densely by sequence number and looked up by their level/index coordinates, so
//! coefficient vectors can live alongside the storage as plain `Vec`s.
//!
//! ## Features
//! - [`GridStorage`](storage::GridStorage): dense sequence numbers, O(1) lookup, leaf
//!   flags, index compaction with an explicit [`Renumbering`](storage::Renumbering)
//! - [`GridCursor`](storage::GridCursor) for hierarchical navigation (children, parent,
//!   level-0 anchors)
//! - [`HashGenerator`](generation::HashGenerator): regular, granular, boundary, full,
//!   anisotropic, interaction-restricted and clique grids
//! - Functor-driven refinement and coarsening in [`refinement`]
//! - A [`Grid`](grid::Grid) facade per grid type and a one-pass
//!   [`adapt_with_surpluses`](adapt::adapt_with_surpluses) driver
//! - serde support for storages with a format version tag
//!
//! ## Determinism
//!
//! Generation order, refinement selection and coarsening selection are fully
//! deterministic: equal indicator values are resolved in favour of the lower sequence
//! number, and points are appended in a fixed order.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! sparse-grid-hash = "0.1"
//! # Optional features:
//! # features = ["check-invariants", "strict-invariants"]
//! ```
//!
//! `check-invariants` validates the storage after every bulk mutation in release builds
//! too; `strict-invariants` makes removal refuse to strand points in all builds.
//!
//! ```rust
//! # fn try_main() -> Result<(), sparse_grid_hash::grid_error::GridError> {
//! use sparse_grid_hash::prelude::*;
//!
//! let mut storage = GridStorage::new(3);
//! HashGenerator.regular(&mut storage, 3)?;
//! assert_eq!(storage.len(), 31);
//!
//! let mut alpha = vec![0.0; storage.len()];
//! alpha[30] = 1.0;
//! let summary = HashRefinement::new()
//!     .free_refine(&mut storage, &SurplusRefinementFunctor::new(&alpha, 1, 0.0))?;
//! alpha.resize(storage.len(), 0.0);
//! assert_eq!(summary.refined_points, vec![30]);
//! # Ok(())
//! # }
//! # try_main().unwrap();
//! ```

pub mod adapt;
pub mod debug_invariants;
pub mod generation;
pub mod grid;
pub mod grid_error;
pub mod refinement;
pub mod storage;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::adapt::{
        AdaptivityAction, AdaptivityOptions, AdaptivityResult, adapt_with_surpluses,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::generation::{HashGenerator, IndexInSubspaceGenerator, LevelVectors};
    pub use crate::grid::{Grid, GridType};
    pub use crate::grid_error::GridError;
    pub use crate::refinement::{
        CoarseningFunctor, CoarseningSummary, HashCoarsening, HashRefinement, RefinementFunctor,
        RefinementSummary, SurplusCoarseningFunctor, SurplusRefinementFunctor,
    };
    pub use crate::storage::{
        GridCursor, GridPoint, GridStorage, Index, Level, LevelIndex, MAX_LEVEL, Renumbering,
    };
}
