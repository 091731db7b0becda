//! Set reconciler: minimal add/remove deltas between two attribute sets.
//!
//! Remote multi-valued attributes have no order and set semantics, so both
//! sides are sorted and deduplicated, then walked with two cursors.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Values to add and to remove to turn `actual` into `desired`.
/// Both lists are sorted ascending and disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDelta<T> {
    pub to_add: Vec<T>,
    pub to_remove: Vec<T>,
}

impl<T> SetDelta<T> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

impl<T> Default for SetDelta<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: Vec::new(),
        }
    }
}

/// Compute the delta from `actual` to `desired`.
///
/// O(n log n) for the sorts, one linear merge pass afterwards.
pub fn diff<T: Ord>(mut actual: Vec<T>, mut desired: Vec<T>) -> SetDelta<T> {
    actual.sort_unstable();
    actual.dedup();
    desired.sort_unstable();
    desired.dedup();

    let mut delta = SetDelta::default();
    let mut actual = actual.into_iter().peekable();
    let mut desired = desired.into_iter().peekable();

    loop {
        let order = match (actual.peek(), desired.peek()) {
            (Some(a), Some(d)) => a.cmp(d),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        match order {
            Ordering::Less => delta.to_remove.extend(actual.next()),
            Ordering::Greater => delta.to_add.extend(desired.next()),
            Ordering::Equal => {
                actual.next();
                desired.next();
            }
        }
    }

    delta
}

/// [`diff`] over borrowed string slices, for callers holding remote values.
pub fn diff_strings(actual: &[String], desired: &[String]) -> SetDelta<String> {
    diff(actual.to_vec(), desired.to_vec())
}
