//! Descending-order ranked lists.
use std::cmp::Ordering;
use std::iter::FromIterator;

/// Values that can be placed in a [`RankedList`].
pub trait Ranked {
    /// Compare two values by rank: `Ordering::Less` means `self` comes first.
    ///
    /// Implementations should break ties on a unique key so that the
    /// resulting order is total.
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

/// A list kept sorted best-first according to [`Ranked::rank_cmp`].
#[derive(Clone, Debug, PartialEq)]
pub struct RankedList<T> {
    entries: Vec<T>,
}

impl<T: Ranked> RankedList<T> {
    /// Build an empty list.
    pub fn new() -> Self {
        RankedList {
            entries: Vec::new(),
        }
    }

    /// Insert `value` after every entry that ranks at least as high.
    pub fn insert(&mut self, value: T) {
        let idx = self
            .entries
            .partition_point(|entry| entry.rank_cmp(&value) != Ordering::Greater);
        self.entries.insert(idx, value);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unwrap into a vector, best first.
    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

impl<T: Ranked> FromIterator<T> for RankedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = RankedList::new();
        for value in iter {
            list.insert(value);
        }

        list
    }
}
