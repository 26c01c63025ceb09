//! Lazy enumeration of the index vectors of one hierarchical subspace.

use crate::grid_error::GridError;
use crate::storage::{GridPoint, Index, Level, LevelIndex, MAX_LEVEL};
use std::collections::VecDeque;

/// Yields every index vector of the subspace `W_l` of a level vector `l`
/// exactly once.
///
/// The queue is seeded with the first combination (index 1 on levels `>= 1`,
/// index 0 on level 0). Each popped vector is expanded by stepping one
/// dimension at or after the dimension that produced it, so every vector has
/// a single producer.
///
/// The generator is consumed by iteration; enumerate a subspace again by
/// building a new one.
///
/// # Example
/// ```rust
/// use sparse_grid_hash::generation::IndexInSubspaceGenerator;
/// let generator = IndexInSubspaceGenerator::try_new(&[2, 1]).unwrap();
/// assert_eq!(generator.len_hint(), Some(2));
/// let all: Vec<_> = generator.collect();
/// assert_eq!(all, vec![vec![1, 1], vec![3, 1]]);
/// ```
#[derive(Clone, Debug)]
pub struct IndexInSubspaceGenerator {
    levels: Vec<Level>,
    bounds: Vec<Index>,
    queue: VecDeque<(Vec<Index>, usize)>,
    remaining: Option<usize>,
}

impl IndexInSubspaceGenerator {
    /// # Errors
    /// `InvalidLevel` if any level exceeds [`MAX_LEVEL`].
    pub fn try_new(levels: &[Level]) -> Result<Self, GridError> {
        if let Some(&level) = levels.iter().find(|&&l| l > MAX_LEVEL) {
            return Err(GridError::InvalidLevel {
                level,
                reason: "subspace level exceeds MAX_LEVEL",
            });
        }
        let bounds = levels
            .iter()
            .map(|&l| if l == 0 { 1 } else { ((1u64 << l) - 1) as Index })
            .collect();
        let first = levels.iter().map(|&l| if l == 0 { 0 } else { 1 }).collect();
        let remaining = subspace_size(levels);
        Ok(IndexInSubspaceGenerator {
            levels: levels.to_vec(),
            bounds,
            queue: VecDeque::from([(first, 0)]),
            remaining,
        })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Number of index vectors in the subspace, `None` if it overflows `usize`.
    pub fn len_hint(&self) -> Option<usize> {
        subspace_size(&self.levels)
    }

    /// Adapts the generator to yield grid points instead of index vectors.
    pub fn into_points(self) -> impl Iterator<Item = GridPoint> {
        let levels = self.levels.clone();
        self.map(move |indices| {
            let coords: Vec<LevelIndex> = levels
                .iter()
                .zip(indices)
                .map(|(&l, i)| LevelIndex::new_unchecked(l, i))
                .collect();
            GridPoint::from_coords(coords)
        })
    }
}

impl Iterator for IndexInSubspaceGenerator {
    type Item = Vec<Index>;

    fn next(&mut self) -> Option<Vec<Index>> {
        let (current, producer) = self.queue.pop_front()?;
        for d in producer..self.levels.len() {
            let step = if self.levels[d] == 0 { 1 } else { 2 };
            if current[d] + step <= self.bounds[d] {
                let mut next = current.clone();
                next[d] += step;
                self.queue.push_back((next, d));
            }
        }
        if let Some(r) = self.remaining.as_mut() {
            *r = r.saturating_sub(1);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(r) => (r, Some(r)),
            None => (usize::MAX, None),
        }
    }
}

/// `Π 2^(l-1)` over levels `>= 1` times `2` per level-0 component.
pub fn subspace_size(levels: &[Level]) -> Option<usize> {
    levels.iter().try_fold(1usize, |acc, &l| {
        let factor = if l == 0 { 2 } else { 1usize.checked_shl(l - 1)? };
        acc.checked_mul(factor)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enumerates_each_vector_once() {
        let levels = [3, 2, 1];
        let all: Vec<_> = IndexInSubspaceGenerator::try_new(&levels).unwrap().collect();
        assert_eq!(all.len(), 4 * 2);
        let set: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(set.len(), all.len());
        for v in &all {
            assert!(v[0] % 2 == 1 && v[0] <= 7);
            assert!(v[1] == 1 || v[1] == 3);
            assert_eq!(v[2], 1);
        }
        assert_eq!(all[0], vec![1, 1, 1]);
    }

    #[test]
    fn level_zero_has_both_anchors() {
        let all: Vec<_> = IndexInSubspaceGenerator::try_new(&[0, 1]).unwrap().collect();
        assert_eq!(all, vec![vec![0, 1], vec![1, 1]]);
        let all: Vec<_> = IndexInSubspaceGenerator::try_new(&[0, 0]).unwrap().collect();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn size_hint_tracks_progress() {
        let mut g = IndexInSubspaceGenerator::try_new(&[2, 2]).unwrap();
        assert_eq!(g.size_hint(), (4, Some(4)));
        g.next();
        assert_eq!(g.size_hint(), (3, Some(3)));
        assert_eq!(g.count(), 3);
    }

    #[test]
    fn rejects_levels_above_max() {
        assert!(matches!(
            IndexInSubspaceGenerator::try_new(&[MAX_LEVEL + 1]),
            Err(GridError::InvalidLevel { .. })
        ));
        assert_eq!(subspace_size(&[MAX_LEVEL, MAX_LEVEL, MAX_LEVEL]), None);
    }

    #[test]
    fn points_carry_the_levels() {
        let pts: Vec<_> = IndexInSubspaceGenerator::try_new(&[2])
            .unwrap()
            .into_points()
            .collect();
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[1].get(0), LevelIndex::new_unchecked(2, 3));
    }
}
