//! Regular, full, boundary, periodic, square-root, truncated,
//! interaction-restricted and clique grid generators.
//!
//! Every generator enumerates level vectors with [`LevelVectors`], keeps the
//! ones its rule accepts, and expands each accepted vector with
//! [`IndexInSubspaceGenerator`]. Insertion order is lexicographic in the
//! level vectors, then subspace order, so generation is deterministic.

use super::levels::LevelVectors;
use super::subspace::IndexInSubspaceGenerator;
use crate::debug_invariants::DebugInvariants;
use crate::grid_error::GridError;
use crate::storage::{GridPoint, GridStorage, Level, LevelIndex, MAX_LEVEL};
use hashbrown::HashSet;
use itertools::Itertools;

/// Slack for comparing the granularity inequality in floating point.
const GRANULARITY_EPS: f64 = 1e-9;

/// Fills empty storages with non-adaptive grids.
///
/// All operations return the number of inserted points.
///
/// # Errors
/// Every operation fails with `StorageNotEmpty` on a non-empty storage and
/// with `InvalidLevel` for a level outside `1..=MAX_LEVEL`. On error the
/// storage is left untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashGenerator;

impl HashGenerator {
    pub fn new() -> Self {
        HashGenerator
    }

    /// Regular sparse grid without boundary: all levels `>= 1`,
    /// `Σ l <= n + d - 1`.
    ///
    /// # Example
    /// ```rust
    /// use sparse_grid_hash::generation::HashGenerator;
    /// use sparse_grid_hash::storage::GridStorage;
    /// let mut s = GridStorage::new(1);
    /// HashGenerator::new().regular(&mut s, 3).unwrap();
    /// assert_eq!(s.len(), 7);
    /// ```
    pub fn regular(&self, storage: &mut GridStorage, level: Level) -> Result<usize, GridError> {
        check_target(storage, level)?;
        let d = storage.dimension();
        let vectors = granular_vectors(d, 1, level, 0.0);
        let n = fill(storage, vectors, |_| true)?;
        log::debug!("regular grid: dimension {d}, level {level}, {n} points");
        Ok(n)
    }

    /// Regular grid with granularity `t`:
    /// `Σ l - t·max l <= n + d - 1 - t·n` and `max l <= n`.
    ///
    /// `t = 0` is [`regular`](Self::regular); negative values admit more
    /// mixed subspaces below the top level, positive values up to 1 thin
    /// them out.
    ///
    /// # Errors
    /// `InvalidGranularity` if `t` is not finite or above 1.
    pub fn regular_with_granularity(
        &self,
        storage: &mut GridStorage,
        level: Level,
        t: f64,
    ) -> Result<usize, GridError> {
        check_granularity(t)?;
        check_target(storage, level)?;
        let d = storage.dimension();
        let vectors = granular_vectors(d, 1, level, t);
        let budget = sparse_budget(d, level);
        let n = fill(storage, vectors, |l| within_budget(l, t, level, budget))?;
        log::debug!("regular grid: dimension {d}, level {level}, granularity {t}, {n} points");
        Ok(n)
    }

    /// Regular grid with boundary points.
    ///
    /// A level vector with `z` zero components and non-zero level sum `S` is
    /// kept iff `max l <= n` and either `z = 0` and `S <= n + d - 1`, or
    /// `z = d`, or `S + z + boundary_level <= n + d`. Each level-0 component
    /// costs 1 in that sum, and `boundary_level` is charged once on top, so
    /// `boundary_level = 0` admits boundary faces one level finer than
    /// `boundary_level = 1`, and larger values coarsen them further.
    pub fn regular_with_boundaries(
        &self,
        storage: &mut GridStorage,
        level: Level,
        boundary_level: Level,
    ) -> Result<usize, GridError> {
        self.regular_with_boundaries_and_granularity(storage, level, boundary_level, 0.0)
    }

    /// [`regular_with_boundaries`](Self::regular_with_boundaries) with
    /// granularity `t`: the level-sum tests become `S - t·max l <= B - t·n`
    /// for the respective budget `B`, with `max l` over the non-zero levels.
    ///
    /// # Errors
    /// `InvalidGranularity` if `t` is not finite or above 1.
    pub fn regular_with_boundaries_and_granularity(
        &self,
        storage: &mut GridStorage,
        level: Level,
        boundary_level: Level,
        t: f64,
    ) -> Result<usize, GridError> {
        check_granularity(t)?;
        check_target(storage, level)?;
        let d = storage.dimension();
        let interior = sparse_budget(d, level);
        let vectors = granular_vectors(d, 0, level, t);
        let n = fill(storage, vectors, |l| {
            let zeros = l.iter().filter(|&&x| x == 0).count() as u64;
            if zeros == 0 {
                return within_budget(l, t, level, interior);
            }
            if zeros == d as u64 {
                return true;
            }
            (u64::from(level) + d as u64)
                .checked_sub(zeros + u64::from(boundary_level))
                .is_some_and(|budget| within_budget(l, t, level, budget))
        })?;
        log::debug!(
            "regular grid with boundary: dimension {d}, level {level}, boundary level {boundary_level}, granularity {t}, {n} points"
        );
        Ok(n)
    }

    /// Regular grid with periodic boundary: level 0 holds only the anchor
    /// `(0, 0)`, which is budgeted like a level-1 function. With
    /// `e = max(l, 1)` componentwise, a level vector is kept iff
    /// `Σ e - t·max e <= n + d - 1 - t·n` and `max e <= n`.
    ///
    /// # Errors
    /// `InvalidGranularity` if `t` is not finite or above 1.
    pub fn regular_with_periodic_boundaries(
        &self,
        storage: &mut GridStorage,
        level: Level,
        t: f64,
    ) -> Result<usize, GridError> {
        check_granularity(t)?;
        check_target(storage, level)?;
        let d = storage.dimension();
        let vectors = granular_vectors(d, 0, level, t);
        let budget = sparse_budget(d, level);
        let n = fill_points(
            storage,
            vectors,
            |l| {
                let effective: Vec<Level> = l.iter().map(|&x| x.max(1)).collect();
                within_budget(&effective, t, level, budget)
            },
            |p| !p.coords().contains(&LevelIndex::RIGHT_ZERO),
        )?;
        log::debug!("periodic grid: dimension {d}, level {level}, granularity {t}, {n} points");
        Ok(n)
    }

    /// Square-root grid with boundary: levels `0..=n` in every dimension,
    /// and at most one component above `n / 2` (rounded down).
    pub fn square_root(&self, storage: &mut GridStorage, level: Level) -> Result<usize, GridError> {
        check_target(storage, level)?;
        let d = storage.dimension();
        let small = level / 2;
        let n = fill(storage, LevelVectors::full(d, 0, level), |l| {
            l.iter().filter(|&&x| x > small).count() <= 1
        })?;
        log::debug!("square-root grid: dimension {d}, level {level}, {n} points");
        Ok(n)
    }

    /// Truncated grid with boundary: levels below `k` are free, and the
    /// excess over `k` is budgeted, `Σ max(l - k, 0) <= n - k`. Every full
    /// grid of level `k` is contained.
    ///
    /// # Errors
    /// `InvalidLevel` if `k > n`.
    pub fn truncated(
        &self,
        storage: &mut GridStorage,
        level: Level,
        k: Level,
    ) -> Result<usize, GridError> {
        check_target(storage, level)?;
        if k > level {
            return Err(GridError::InvalidLevel {
                level: k,
                reason: "truncation level exceeds the grid level",
            });
        }
        let d = storage.dimension();
        let budget = u64::from(level - k);
        let n = fill(storage, LevelVectors::full(d, 0, level), |l| {
            l.iter().map(|&x| u64::from(x.saturating_sub(k))).sum::<u64>() <= budget
        })?;
        log::debug!("truncated grid: dimension {d}, level {level}, k {k}, {n} points");
        Ok(n)
    }

    /// Full tensor grid with levels `1..=n` in every dimension.
    pub fn full(&self, storage: &mut GridStorage, level: Level) -> Result<usize, GridError> {
        check_target(storage, level)?;
        let d = storage.dimension();
        let n = fill(storage, LevelVectors::full(d, 1, level), |_| true)?;
        log::debug!("full grid: dimension {d}, level {level}, {n} points");
        Ok(n)
    }

    /// Full tensor grid with levels `0..=n` in every dimension.
    pub fn full_with_boundary(
        &self,
        storage: &mut GridStorage,
        level: Level,
    ) -> Result<usize, GridError> {
        check_target(storage, level)?;
        let d = storage.dimension();
        let n = fill(storage, LevelVectors::full(d, 0, level), |_| true)?;
        log::debug!("full grid with boundary: dimension {d}, level {level}, {n} points");
        Ok(n)
    }

    /// Full tensor grid with levels `1..=levels[t]` in dimension `t`.
    ///
    /// # Errors
    /// `DimensionMismatch` if `levels.len() != dimension()`.
    pub fn anisotropic_full(
        &self,
        storage: &mut GridStorage,
        levels: &[Level],
    ) -> Result<usize, GridError> {
        if levels.len() != storage.dimension() {
            return Err(GridError::DimensionMismatch {
                expected: storage.dimension(),
                found: levels.len(),
            });
        }
        check_empty(storage)?;
        for &level in levels {
            check_level(level)?;
        }
        let d = levels.len();
        let vectors = LevelVectors::new(vec![1; d], levels.to_vec(), u64::MAX);
        let n = fill(storage, vectors, |_| true)?;
        log::debug!("anisotropic full grid: levels {levels:?}, {n} points");
        Ok(n)
    }

    /// Regular grid restricted to interaction terms.
    ///
    /// Each term is a boolean vector of length `d` marking the dimensions
    /// allowed to be active (level above 1). A point is kept iff its active
    /// dimensions are a subset of some term, i.e. the terms are closed
    /// downward.
    ///
    /// # Errors
    /// `InvalidInteractionTerm` for a term of the wrong length.
    pub fn regular_inter(
        &self,
        storage: &mut GridStorage,
        level: Level,
        terms: &[Vec<bool>],
    ) -> Result<usize, GridError> {
        self.regular_inter_with_granularity(storage, level, terms, 0.0)
    }

    /// [`regular_inter`](Self::regular_inter) on the level vectors of
    /// [`regular_with_granularity`](Self::regular_with_granularity).
    ///
    /// # Errors
    /// `InvalidInteractionTerm` for a term of the wrong length,
    /// `InvalidGranularity` if `t` is not finite or above 1.
    pub fn regular_inter_with_granularity(
        &self,
        storage: &mut GridStorage,
        level: Level,
        terms: &[Vec<bool>],
        t: f64,
    ) -> Result<usize, GridError> {
        check_granularity(t)?;
        let d = storage.dimension();
        if let Some((k, term)) = terms.iter().find_position(|t| t.len() != d) {
            return Err(GridError::InvalidInteractionTerm(format!(
                "term {k} has length {}, grid has dimension {d}",
                term.len()
            )));
        }
        check_target(storage, level)?;
        warn_if_not_closed(terms);
        let vectors = granular_vectors(d, 1, level, t);
        let budget = sparse_budget(d, level);
        let n = fill(storage, vectors, |l| {
            within_budget(l, t, level, budget)
                && terms
                    .iter()
                    .any(|term| l.iter().zip(term).all(|(&lt, &allowed)| lt <= 1 || allowed))
        })?;
        log::debug!(
            "regular grid with {} interaction terms: dimension {d}, level {level}, {n} points",
            terms.len()
        );
        Ok(n)
    }

    /// [`regular_inter`](Self::regular_inter) with terms given as sets of
    /// dimension numbers.
    ///
    /// # Errors
    /// `InvalidInteractionTerm` for a dimension `>= d`.
    pub fn regular_inter_sets(
        &self,
        storage: &mut GridStorage,
        level: Level,
        terms: &[Vec<usize>],
    ) -> Result<usize, GridError> {
        let d = storage.dimension();
        let mut masks = Vec::with_capacity(terms.len());
        for term in terms {
            let mut mask = vec![false; d];
            for &dim in term {
                if dim >= d {
                    return Err(GridError::InvalidInteractionTerm(format!(
                        "dimension {dim} out of range for a {d}-dimensional grid"
                    )));
                }
                mask[dim] = true;
            }
            masks.push(mask);
        }
        self.regular_inter(storage, level, &masks)
    }

    /// Regular grid restricted to points whose active dimensions lie in one
    /// block `[k·clique_size, (k+1)·clique_size)`.
    ///
    /// # Errors
    /// `InvalidCliqueSize` if `clique_size` is 0 or exceeds the dimension.
    pub fn cliques(
        &self,
        storage: &mut GridStorage,
        level: Level,
        clique_size: usize,
    ) -> Result<usize, GridError> {
        self.cliques_with_granularity(storage, level, clique_size, 0.0)
    }

    /// [`cliques`](Self::cliques) on the level vectors of
    /// [`regular_with_granularity`](Self::regular_with_granularity).
    ///
    /// # Errors
    /// `InvalidCliqueSize` as for [`cliques`](Self::cliques),
    /// `InvalidGranularity` if `t` is not finite or above 1.
    pub fn cliques_with_granularity(
        &self,
        storage: &mut GridStorage,
        level: Level,
        clique_size: usize,
        t: f64,
    ) -> Result<usize, GridError> {
        check_granularity(t)?;
        let d = storage.dimension();
        if clique_size == 0 || clique_size > d {
            return Err(GridError::InvalidCliqueSize {
                clique_size,
                dimension: d,
            });
        }
        check_target(storage, level)?;
        let vectors = granular_vectors(d, 1, level, t);
        let budget = sparse_budget(d, level);
        let n = fill(storage, vectors, |l| {
            within_budget(l, t, level, budget)
                && l.iter()
                    .positions(|&lt| lt > 1)
                    .map(|dim| dim / clique_size)
                    .all_equal()
        })?;
        log::debug!("clique grid: dimension {d}, level {level}, clique size {clique_size}, {n} points");
        Ok(n)
    }
}

/// `n + d - 1`: the level-sum budget of a regular grid.
fn sparse_budget(d: usize, level: Level) -> u64 {
    (u64::from(level) + d as u64).saturating_sub(1)
}

/// Level vectors in `[lo, n]^d` that can pass [`within_budget`] for `t`.
/// Negative `t` lifts the level-sum cap, the box bounds `max l <= n`.
fn granular_vectors(d: usize, lo: Level, level: Level, t: f64) -> LevelVectors {
    let max_sum = if t < 0.0 {
        u64::from(level) * d as u64
    } else {
        sparse_budget(d, level)
    };
    LevelVectors::new(vec![lo; d], vec![level; d], max_sum)
}

/// `Σ l - t·max l <= budget - t·n`; zero components add nothing.
fn within_budget(levels: &[Level], t: f64, level: Level, budget: u64) -> bool {
    let sum: u64 = levels.iter().map(|&x| u64::from(x)).sum();
    let max = levels.iter().copied().max().unwrap_or(0);
    sum as f64 - t * f64::from(max) <= budget as f64 - t * f64::from(level) + GRANULARITY_EPS
}

fn check_granularity(t: f64) -> Result<(), GridError> {
    if t.is_finite() && t <= 1.0 {
        Ok(())
    } else {
        Err(GridError::InvalidGranularity(format!(
            "granularity must be finite and at most 1, got {t}"
        )))
    }
}

fn check_empty(storage: &GridStorage) -> Result<(), GridError> {
    if storage.is_empty() {
        Ok(())
    } else {
        Err(GridError::StorageNotEmpty {
            size: storage.len(),
        })
    }
}

fn check_level(level: Level) -> Result<(), GridError> {
    if level == 0 {
        Err(GridError::InvalidLevel {
            level,
            reason: "grid level must be at least 1",
        })
    } else if level > MAX_LEVEL {
        Err(GridError::InvalidLevel {
            level,
            reason: "grid level exceeds MAX_LEVEL",
        })
    } else {
        Ok(())
    }
}

fn check_target(storage: &GridStorage, level: Level) -> Result<(), GridError> {
    check_empty(storage)?;
    check_level(level)
}

/// Inserts every subspace whose level vector passes `accept`.
fn fill<F>(storage: &mut GridStorage, vectors: LevelVectors, accept: F) -> Result<usize, GridError>
where
    F: FnMut(&[Level]) -> bool,
{
    fill_points(storage, vectors, accept, |_| true)
}

/// Like [`fill`], inserting only the points of accepted subspaces that pass
/// `keep`.
fn fill_points<F, K>(
    storage: &mut GridStorage,
    vectors: LevelVectors,
    mut accept: F,
    mut keep: K,
) -> Result<usize, GridError>
where
    F: FnMut(&[Level]) -> bool,
    K: FnMut(&GridPoint) -> bool,
{
    if storage.dimension() == 0 {
        return Ok(0);
    }
    let before = storage.len();
    for levels in vectors.filter(|l| accept(l)) {
        for point in IndexInSubspaceGenerator::try_new(&levels)?.into_points() {
            if keep(&point) {
                storage.insert(point)?;
            }
        }
    }
    #[cfg(any(debug_assertions, feature = "check-invariants"))]
    storage.debug_assert_invariants();
    Ok(storage.len() - before)
}

fn warn_if_not_closed(terms: &[Vec<bool>]) {
    let set: HashSet<&[bool]> = terms.iter().map(Vec::as_slice).collect();
    let mut subset = Vec::new();
    for term in terms {
        for (dim, _) in term.iter().enumerate().filter(|(_, on)| **on) {
            subset.clear();
            subset.extend_from_slice(term);
            subset[dim] = false;
            if !set.contains(subset.as_slice()) {
                log::warn!(
                    "interaction terms are not closed under subsets (term {term:?} lacks {subset:?}); generating their downward closure"
                );
                return;
            }
        }
    }
}
