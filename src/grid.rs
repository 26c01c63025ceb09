//! `Grid`: a storage bound to a grid type, dispatching generation,
//! refinement and coarsening to the flavor that type needs.

use crate::generation::HashGenerator;
use crate::grid_error::GridError;
use crate::refinement::{
    CoarseningFunctor, CoarseningSummary, HashCoarsening, HashRefinement, RefinementFunctor,
    RefinementSummary,
};
use crate::storage::{GridStorage, Level};

/// Supported grid families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GridType {
    /// Piecewise linear, no boundary points.
    Linear,
    /// Linear with modified (extrapolating) boundary-adjacent basis; no
    /// boundary points.
    ModLinear,
    /// Linear with boundary points, generated with boundary level 0.
    LinearBoundary,
    /// Linear with boundary points truncated by `boundary_level`.
    LinearTruncatedBoundary { boundary_level: Level },
}

impl GridType {
    pub fn has_boundary(&self) -> bool {
        self.boundary_level().is_some()
    }

    /// Truncation level handed to the boundary generator; `None` for grids
    /// without boundary points.
    pub fn boundary_level(&self) -> Option<Level> {
        match *self {
            GridType::Linear | GridType::ModLinear => None,
            GridType::LinearBoundary => Some(0),
            GridType::LinearTruncatedBoundary { boundary_level } => Some(boundary_level),
        }
    }
}

/// A grid storage plus the generator, refinement and coarsening matching its
/// [`GridType`].
///
/// # Example
/// ```rust
/// # fn try_main() -> Result<(), sparse_grid_hash::grid_error::GridError> {
/// use sparse_grid_hash::grid::{Grid, GridType};
/// use sparse_grid_hash::refinement::SurplusRefinementFunctor;
/// let mut grid = Grid::new(GridType::Linear, 2);
/// grid.regular(2)?;
/// assert_eq!(grid.size(), 5);
/// let alpha = vec![0.0, 0.0, 0.0, 0.0, 1.0];
/// let summary = grid.refine(&SurplusRefinementFunctor::new(&alpha, 1, 0.0))?;
/// assert_eq!(summary.refined_points, vec![4]);
/// # Ok(())
/// # }
/// # try_main().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Grid {
    grid_type: GridType,
    storage: GridStorage,
    refinement: HashRefinement,
    coarsening: HashCoarsening,
}

impl Grid {
    pub fn new(grid_type: GridType, dimension: usize) -> Self {
        let refinement = if grid_type.has_boundary() {
            HashRefinement::with_boundaries()
        } else {
            HashRefinement::new()
        };
        Grid {
            grid_type,
            storage: GridStorage::new(dimension),
            refinement,
            coarsening: HashCoarsening::new(),
        }
    }

    #[inline]
    pub fn grid_type(&self) -> GridType {
        self.grid_type
    }

    #[inline]
    pub fn storage(&self) -> &GridStorage {
        &self.storage
    }

    #[inline]
    pub fn storage_mut(&mut self) -> &mut GridStorage {
        &mut self.storage
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.storage.dimension()
    }

    /// Regular grid of `level`; boundary types use their boundary level.
    pub fn regular(&mut self, level: Level) -> Result<usize, GridError> {
        match self.grid_type.boundary_level() {
            None => HashGenerator.regular(&mut self.storage, level),
            Some(b) => HashGenerator.regular_with_boundaries(&mut self.storage, level, b),
        }
    }

    /// Regular grid restricted to interaction terms.
    ///
    /// # Errors
    /// `NotImplemented` for grid types with boundary points.
    pub fn regular_inter(&mut self, level: Level, terms: &[Vec<bool>]) -> Result<usize, GridError> {
        if self.grid_type.has_boundary() {
            return Err(GridError::NotImplemented(
                "interaction-restricted generation on boundary grids",
            ));
        }
        HashGenerator.regular_inter(&mut self.storage, level, terms)
    }

    /// Regular grid restricted to cliques of `clique_size` dimensions.
    ///
    /// # Errors
    /// `NotImplemented` for grid types with boundary points.
    pub fn cliques(&mut self, level: Level, clique_size: usize) -> Result<usize, GridError> {
        if self.grid_type.has_boundary() {
            return Err(GridError::NotImplemented("clique generation on boundary grids"));
        }
        HashGenerator.cliques(&mut self.storage, level, clique_size)
    }

    /// Full grid; boundary types include level 0.
    pub fn full(&mut self, level: Level) -> Result<usize, GridError> {
        if self.grid_type.has_boundary() {
            HashGenerator.full_with_boundary(&mut self.storage, level)
        } else {
            HashGenerator.full(&mut self.storage, level)
        }
    }

    pub fn refine<F>(&mut self, functor: &F) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        self.refinement.free_refine(&mut self.storage, functor)
    }

    pub fn refine_max_level<F>(
        &mut self,
        functor: &F,
        max_level: Level,
    ) -> Result<RefinementSummary, GridError>
    where
        F: RefinementFunctor + ?Sized,
    {
        self.refinement
            .refine_max_level(&mut self.storage, functor, max_level)
    }

    pub fn coarsen<F, T>(
        &mut self,
        functor: &F,
        coefficients: &mut Vec<T>,
    ) -> Result<CoarseningSummary, GridError>
    where
        F: CoarseningFunctor + ?Sized,
    {
        self.coarsening
            .free_coarsen(&mut self.storage, functor, coefficients)
    }

    /// Coarsen, leaving the first `protected` sequence numbers untouched.
    pub fn coarsen_protecting<F, T>(
        &mut self,
        functor: &F,
        coefficients: &mut Vec<T>,
        protected: usize,
    ) -> Result<CoarseningSummary, GridError>
    where
        F: CoarseningFunctor + ?Sized,
    {
        let n = self.storage.len();
        self.coarsening
            .free_coarsen_n_first_only(&mut self.storage, functor, coefficients, n, protected)
    }

    pub fn refinable_points(&self) -> usize {
        self.refinement.number_of_refinable_points(&self.storage)
    }

    pub fn removable_points(&self) -> usize {
        self.coarsening.number_of_removable_points(&self.storage)
    }

    /// Sequence numbers removed by the last coarsening.
    pub fn deleted_points(&self) -> &[usize] {
        self.coarsening.deleted_points()
    }
}
