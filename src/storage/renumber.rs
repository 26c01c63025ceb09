//! Sequence-number remapping produced by point removal.

use crate::grid_error::GridError;

/// Old→new and new→old sequence numbers after a removal.
///
/// Surviving points keep their relative order, so applying the mapping to a
/// parallel vector is a stable compaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Renumbering {
    old_to_new: Vec<Option<usize>>,
    new_to_old: Vec<usize>,
}

impl Renumbering {
    /// Mapping of a storage with `len` points where nothing was removed.
    pub fn identity(len: usize) -> Self {
        Renumbering {
            old_to_new: (0..len).map(Some).collect(),
            new_to_old: (0..len).collect(),
        }
    }

    /// Builds the mapping from a removal mask over the old sequence numbers.
    pub(crate) fn from_removal_mask(removed: &[bool]) -> Self {
        let mut old_to_new = Vec::with_capacity(removed.len());
        let mut new_to_old = Vec::with_capacity(removed.len());
        for (old, &gone) in removed.iter().enumerate() {
            if gone {
                old_to_new.push(None);
            } else {
                old_to_new.push(Some(new_to_old.len()));
                new_to_old.push(old);
            }
        }
        Renumbering {
            old_to_new,
            new_to_old,
        }
    }

    /// New sequence number of `old`, `None` if it was removed or out of range.
    #[inline]
    pub fn new_seq(&self, old: usize) -> Option<usize> {
        self.old_to_new.get(old).copied().flatten()
    }

    /// Old sequence number of the point now stored at `new`.
    #[inline]
    pub fn old_seq(&self, new: usize) -> Option<usize> {
        self.new_to_old.get(new).copied()
    }

    pub fn old_to_new(&self) -> &[Option<usize>] {
        &self.old_to_new
    }

    pub fn new_to_old(&self) -> &[usize] {
        &self.new_to_old
    }

    /// Storage size before the removal.
    pub fn old_len(&self) -> usize {
        self.old_to_new.len()
    }

    /// Storage size after the removal.
    pub fn new_len(&self) -> usize {
        self.new_to_old.len()
    }

    /// Removed sequence numbers in ascending order.
    pub fn removed(&self) -> Vec<usize> {
        self.old_to_new
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.is_none().then_some(old))
            .collect()
    }

    pub fn is_identity(&self) -> bool {
        self.old_len() == self.new_len()
    }

    /// Compacts a vector indexed by the old sequence numbers in place.
    ///
    /// # Errors
    /// `CoefficientLengthMismatch` if `values.len() != self.old_len()`; the
    /// vector is left untouched in that case.
    pub fn apply<T>(&self, values: &mut Vec<T>) -> Result<(), GridError> {
        if values.len() != self.old_len() {
            return Err(GridError::CoefficientLengthMismatch {
                expected: self.old_len(),
                found: values.len(),
            });
        }
        let mut old = 0;
        values.retain(|_| {
            let keep = self.old_to_new[old].is_some();
            old += 1;
            keep
        });
        Ok(())
    }

    /// Like [`apply`](Self::apply) but returns a new vector.
    pub fn applied<T: Clone>(&self, values: &[T]) -> Result<Vec<T>, GridError> {
        if values.len() != self.old_len() {
            return Err(GridError::CoefficientLengthMismatch {
                expected: self.old_len(),
                found: values.len(),
            });
        }
        Ok(self.new_to_old.iter().map(|&old| values[old].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_preserves_relative_order() {
        let r = Renumbering::from_removal_mask(&[false, true, false, true, false]);
        assert_eq!(r.new_to_old(), &[0, 2, 4]);
        assert_eq!(r.old_to_new(), &[Some(0), None, Some(1), None, Some(2)]);
        assert_eq!(r.removed(), vec![1, 3]);
        assert_eq!(r.new_seq(4), Some(2));
        assert_eq!(r.new_seq(9), None);
        assert_eq!(r.old_seq(1), Some(2));
        assert!(!r.is_identity());
    }

    #[test]
    fn apply_compacts_values() {
        let r = Renumbering::from_removal_mask(&[true, false, false, true]);
        let mut v = vec![10.0, 11.0, 12.0, 13.0];
        assert_eq!(r.applied(&v).unwrap(), vec![11.0, 12.0]);
        r.apply(&mut v).unwrap();
        assert_eq!(v, vec![11.0, 12.0]);
    }

    #[test]
    fn apply_rejects_wrong_length() {
        let r = Renumbering::identity(3);
        let mut v = vec![1, 2];
        assert_eq!(
            r.apply(&mut v),
            Err(GridError::CoefficientLengthMismatch { expected: 3, found: 2 })
        );
        assert_eq!(v, vec![1, 2]);
    }
}
