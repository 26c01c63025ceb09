//! Bounded best-`k` selection over scored sequence numbers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Which end of the value range is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Keep {
    Largest,
    Smallest,
}

/// Heap entry ordered so that the *worst* kept candidate is the maximum.
#[derive(Clone, Copy, Debug)]
struct Ranked {
    /// `value` for `Keep::Largest`, `-value` for `Keep::Smallest`.
    key: f64,
    value: f64,
    seq: usize,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        // smaller key is worse; on ties the larger seq is worse
        other
            .key
            .total_cmp(&self.key)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Keeps the `k` best `(value, seq)` pairs in `O(n log k)`.
///
/// Equal values are broken in favour of the lower sequence number.
#[derive(Clone, Debug)]
pub(crate) struct BestK {
    k: usize,
    keep: Keep,
    heap: BinaryHeap<Ranked>,
}

impl BestK {
    pub(crate) fn new(k: usize, keep: Keep) -> Self {
        BestK {
            k,
            keep,
            heap: BinaryHeap::with_capacity(k.min(1024)),
        }
    }

    pub(crate) fn push(&mut self, value: f64, seq: usize) {
        if self.k == 0 {
            return;
        }
        let key = match self.keep {
            Keep::Largest => value,
            Keep::Smallest => -value,
        };
        let cand = Ranked { key, value, seq };
        if self.heap.len() < self.k {
            self.heap.push(cand);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if cand < *worst {
                *worst = cand;
            }
        }
    }

    /// Kept `(seq, value)` pairs, best first.
    pub(crate) fn into_sorted(self) -> Vec<(usize, f64)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|r| (r.seq, r.value))
            .collect()
    }
}
