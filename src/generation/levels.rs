//! Enumeration of level vectors inside a box under a level-sum cap.

use crate::storage::Level;

/// Level vectors `l` with `lower[t] <= l[t] <= upper[t]` and
/// `Σ l[t] <= max_sum`, in lexicographic order.
///
/// Vectors are built by composition: the last dimension that can still grow
/// without breaking the sum cap is incremented and the tail is reset to its
/// lower bounds. Prefixes that cannot be completed are never visited.
#[derive(Clone, Debug)]
pub struct LevelVectors {
    lower: Vec<Level>,
    upper: Vec<Level>,
    max_sum: u64,
    current: Option<Vec<Level>>,
}

impl LevelVectors {
    pub fn new(lower: Vec<Level>, upper: Vec<Level>, max_sum: u64) -> Self {
        debug_assert_eq!(lower.len(), upper.len());
        let feasible = lower.iter().zip(&upper).all(|(lo, hi)| lo <= hi)
            && lower.iter().map(|&l| u64::from(l)).sum::<u64>() <= max_sum;
        let current = feasible.then(|| lower.clone());
        LevelVectors {
            lower,
            upper,
            max_sum,
            current,
        }
    }

    /// Every level in `lo..=hi` in each of `dimension` dimensions.
    pub fn full(dimension: usize, lo: Level, hi: Level) -> Self {
        Self::new(vec![lo; dimension], vec![hi; dimension], u64::MAX)
    }

    fn advance(&self, current: &[Level]) -> Option<Vec<Level>> {
        let tail_min: Vec<u64> = {
            let mut acc = 0u64;
            let mut out = vec![0u64; self.lower.len() + 1];
            for t in (0..self.lower.len()).rev() {
                acc += u64::from(self.lower[t]);
                out[t] = acc;
            }
            out
        };
        let mut prefix = 0u64;
        let prefixes: Vec<u64> = current
            .iter()
            .map(|&l| {
                let before = prefix;
                prefix += u64::from(l);
                before
            })
            .collect();
        for t in (0..current.len()).rev() {
            if current[t] >= self.upper[t] {
                continue;
            }
            let sum = prefixes[t] + u64::from(current[t]) + 1 + tail_min[t + 1];
            if sum <= self.max_sum {
                let mut next = current[..=t].to_vec();
                next[t] += 1;
                next.extend_from_slice(&self.lower[t + 1..]);
                return Some(next);
            }
        }
        None
    }
}

impl Iterator for LevelVectors {
    type Item = Vec<Level>;

    fn next(&mut self) -> Option<Vec<Level>> {
        let current = self.current.take()?;
        self.current = self.advance(&current);
        Some(current)
    }
}
