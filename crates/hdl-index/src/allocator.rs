//! First-fit index allocation within a bounded range.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Index of the administrative `HS_ADMIN` entry. It sits at the exclusive
/// upper bound of the default range and is therefore never allocated.
pub const ADMIN_INDEX: i64 = 100;

/// Half-open allocation range `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexRange {
    pub min: i64,
    pub max: i64,
}

impl Default for IndexRange {
    fn default() -> Self {
        Self {
            min: 2,
            max: ADMIN_INDEX,
        }
    }
}

impl IndexRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Range used by records written before profiles existed. Those never
    /// handed out index 0.
    pub fn legacy(max: i64) -> Self {
        Self { min: 1, max }
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= self.min && index < self.max
    }

    /// Number of indices in the range.
    pub fn capacity(&self) -> usize {
        usize::try_from(self.max - self.min).unwrap_or(0)
    }
}

/// Hands out the smallest unused index of a range, in ascending order.
///
/// Seeded with the indices already present in a document. Every returned
/// index is marked used, so an allocator must not outlive the document
/// mutation it was built for.
#[derive(Debug)]
pub struct IndexAllocator {
    used: BTreeSet<i64>,
    range: IndexRange,
    next: i64,
}

impl IndexAllocator {
    /// Create an allocator. Used indices outside the range are ignored.
    pub fn new(used: impl IntoIterator<Item = i64>, range: IndexRange) -> Self {
        let used = used.into_iter().filter(|i| range.contains(*i)).collect();
        Self {
            used,
            range,
            next: range.min,
        }
    }

    /// Returns `true` if the index is taken (seeded or allocated).
    pub fn is_used(&self, index: i64) -> bool {
        self.used.contains(&index)
    }

    /// Allocate the smallest free index.
    pub fn allocate(&mut self) -> IndexResult<i64> {
        while self.next < self.range.max {
            let candidate = self.next;
            self.next += 1;
            if self.used.insert(candidate) {
                debug!(index = candidate, "allocated entry index");
                return Ok(candidate);
            }
        }
        Err(IndexError::Exhausted {
            min: self.range.min,
            max: self.range.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn allocates_gaps_in_ascending_order() {
        let mut alloc = IndexAllocator::new([2, 4, 6], IndexRange::new(1, 8));
        assert_eq!(alloc.allocate().unwrap(), 1);
        assert_eq!(alloc.allocate().unwrap(), 3);
        assert_eq!(alloc.allocate().unwrap(), 5);
        assert_eq!(alloc.allocate().unwrap(), 7);
        assert!(matches!(
            alloc.allocate(),
            Err(IndexError::Exhausted { min: 1, max: 8 })
        ));
    }

    #[test]
    fn full_range_is_exhausted_immediately() {
        let mut alloc = IndexAllocator::new([1, 2, 3], IndexRange::new(1, 4));
        assert!(matches!(alloc.allocate(), Err(IndexError::Exhausted { .. })));
    }

    #[test]
    fn out_of_range_seeds_are_ignored() {
        let mut alloc = IndexAllocator::new([1, 100, 250, -3], IndexRange::default());
        assert!(!alloc.is_used(1));
        assert!(!alloc.is_used(100));
        assert_eq!(alloc.allocate().unwrap(), 2);
    }

    #[test]
    fn default_range_never_reaches_admin_index() {
        let mut alloc = IndexAllocator::new([], IndexRange::default());
        let mut last = 0;
        while let Ok(i) = alloc.allocate() {
            last = i;
        }
        assert_eq!(last, ADMIN_INDEX - 1);
    }

    #[test]
    fn legacy_range_starts_at_one() {
        let mut alloc = IndexAllocator::new([2, 4], IndexRange::legacy(100));
        assert_eq!(alloc.allocate().unwrap(), 1);
        assert_eq!(alloc.allocate().unwrap(), 3);
        assert_eq!(alloc.allocate().unwrap(), 5);
    }

    #[test]
    fn empty_range_capacity() {
        assert_eq!(IndexRange::new(5, 5).capacity(), 0);
        assert_eq!(IndexRange::new(7, 5).capacity(), 0);
        assert_eq!(IndexRange::default().capacity(), 98);
    }

    proptest! {
        #[test]
        fn allocation_is_first_fit_and_collision_free(
            used in proptest::collection::btree_set(0i64..40, 0..30),
            min in 0i64..10,
            width in 0i64..30,
        ) {
            let range = IndexRange::new(min, min + width);
            let mut alloc = IndexAllocator::new(used.iter().copied(), range);
            let expected: Vec<i64> = (range.min..range.max).filter(|i| !used.contains(i)).collect();

            let mut got = Vec::new();
            while let Ok(i) = alloc.allocate() {
                got.push(i);
            }
            prop_assert_eq!(got, expected);
        }
    }
}
