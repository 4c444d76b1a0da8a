//! Bounded, frame-aligned histories.

use std::collections::{vec_deque, VecDeque};

use crate::{detection::BoundingBox, poi::PoiMap};

/// Per-POI history of (possibly missing) boxes. Used for both measurements and predictions.
pub type BoxHistory = PoiMap<History<Option<BoundingBox>>>;

/// A fixed-capacity history that discards its oldest entry when full.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    /// Max. number of entries to keep.
    capacity: usize,
}

impl<T> History<T> {
    /// Creates an empty history that keeps the last `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be at least 1");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, dropping the oldest one if the history is full.
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index)
    }

    pub fn latest(&self) -> Option<&T> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a, T> IntoIterator for &'a History<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Creates an empty [`BoxHistory`] with the given per-POI capacity.
pub fn box_history(capacity: usize) -> BoxHistory {
    PoiMap::from_fn(|_| History::new(capacity))
}

/// Asserts that every history in `a` and `b` has the same length.
///
/// Slot `i` of every history must refer to the same frame, so any mismatch is a bug.
#[track_caller]
pub fn assert_aligned(a: &BoxHistory, b: &BoxHistory) {
    let len = a[crate::Poi::TrackedObject].len();
    for ((poi, x), y) in a.iter().zip(b.values()) {
        assert_eq!(x.len(), len, "history of {poi} is misaligned");
        assert_eq!(
            y.len(),
            len,
            "measurement and prediction history of {poi} differ in length"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest() {
        let mut history = History::new(2);
        history.push(1);
        history.push(2);
        history.push(3);
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), [2, 3]);
        assert_eq!(history.get(0), Some(&2));
        assert_eq!(history.latest(), Some(&3));

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 2);
    }

    #[test]
    fn missing_entries_take_a_slot() {
        let mut history = History::new(100);
        history.push(Some(1.0));
        history.push(None);
        history.push(Some(3.0));
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(1), Some(&None));
    }

    #[test]
    fn bounded_window() {
        let mut histories = box_history(100);
        for frame in 0..250 {
            for (poi, history) in histories.iter_mut() {
                // Leave gaps in some of the histories.
                let present = (frame + poi.index()) % 3 != 0;
                history.push(present.then(|| BoundingBox::point(0.5, 0.5)));
            }
            let expected = (frame + 1).min(100);
            assert!(histories.values().all(|h| h.len() == expected));
        }
    }

    #[test]
    #[should_panic(expected = "misaligned")]
    fn misalignment_is_fatal() {
        let mut a = box_history(10);
        let b = box_history(10);
        a[crate::Poi::Head].push(None);
        assert_aligned(&a, &b);
    }
}
