//! Bounded top-K priority queue
//!
//! Keeps the `bound` best `(element, priority)` pairs offered so far, sorted
//! best first. The min and max flavours share one implementation: entries are
//! stored under a sort key that is the priority for `min` and its negation
//! for `max`, and smaller keys rank higher.
//!
//! # Example
//!
//! ```
//! use trueno_compute::BoundedPriorityQueue;
//!
//! let mut top = BoundedPriorityQueue::max(2).unwrap();
//! top.offer(10, 0.5);
//! top.offer(11, 3.0);
//! top.offer(12, 1.0);
//!
//! assert_eq!(top.elements().collect::<Vec<_>>(), vec![11, 12]);
//! ```

use crate::error::{ComputeError, ComputeResult};

/// Which end of the priority range is retained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain {
    /// Keep the highest priorities
    Max,
    /// Keep the lowest priorities
    Min,
}

impl Retain {
    const fn sign(self) -> f64 {
        match self {
            Self::Max => -1.0,
            Self::Min => 1.0,
        }
    }
}

/// Insertion-sorted queue holding at most `bound` entries
#[derive(Debug, Clone)]
pub struct BoundedPriorityQueue {
    bound: usize,
    retain: Retain,
    elements: Vec<u64>,
    keys: Vec<f64>,
}

impl BoundedPriorityQueue {
    /// Queue retaining the `bound` highest priorities
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bound` is zero
    pub fn max(bound: usize) -> ComputeResult<Self> {
        Self::new(bound, Retain::Max)
    }

    /// Queue retaining the `bound` lowest priorities
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bound` is zero
    pub fn min(bound: usize) -> ComputeResult<Self> {
        Self::new(bound, Retain::Min)
    }

    /// Queue retaining `bound` entries from the given end
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `bound` is zero
    pub fn new(bound: usize, retain: Retain) -> ComputeResult<Self> {
        if bound == 0 {
            return Err(ComputeError::invalid("queue bound must be positive"));
        }
        Ok(Self {
            bound,
            retain,
            elements: Vec::with_capacity(bound),
            keys: Vec::with_capacity(bound),
        })
    }

    /// Offer an entry; returns true if it was retained
    ///
    /// Once full, an offer is accepted only if it is strictly better than the
    /// current worst entry, which is then evicted. Ties keep the incumbent,
    /// and equal priorities stay in offer order. `-0.0` and `0.0` rank as
    /// equal; `NaN` ranks after every number, so it is never retained over one.
    pub fn offer(&mut self, element: u64, priority: f64) -> bool {
        let key = self.key(priority);

        if self.keys.len() == self.bound {
            match self.keys.last() {
                Some(worst) if key.total_cmp(worst).is_lt() => {
                    self.keys.pop();
                    self.elements.pop();
                }
                _ => return false,
            }
        }

        let position = self.keys.partition_point(|k| k.total_cmp(&key).is_le());
        self.keys.insert(position, key);
        self.elements.insert(position, element);
        true
    }

    // Adding 0.0 folds -0.0 into 0.0, so negation never splits a tie
    fn key(&self, priority: f64) -> f64 {
        if priority.is_nan() {
            return f64::NAN;
        }
        self.retain.sign() * priority + 0.0
    }

    /// Number of retained entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// True if nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Maximum number of retained entries
    #[must_use]
    pub const fn bound(&self) -> usize {
        self.bound
    }

    /// True if `element` is currently retained
    #[must_use]
    pub fn contains(&self, element: u64) -> bool {
        self.elements.contains(&element)
    }

    /// Drop all entries, keeping the bound
    pub fn clear(&mut self) {
        self.elements.clear();
        self.keys.clear();
    }

    /// Visit retained entries best first
    pub fn for_each(&self, mut consumer: impl FnMut(u64, f64)) {
        for (element, priority) in self.iter() {
            consumer(element, priority);
        }
    }

    /// Retained `(element, priority)` pairs, best first
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.elements.iter().copied().zip(self.priorities())
    }

    /// Retained elements, best first
    pub fn elements(&self) -> impl Iterator<Item = u64> + '_ {
        self.elements.iter().copied()
    }

    /// Retained priorities, best first
    pub fn priorities(&self) -> impl Iterator<Item = f64> + '_ {
        let sign = self.retain.sign();
        self.keys.iter().map(move |key| key * sign + 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bound_rejected() {
        assert!(matches!(
            BoundedPriorityQueue::max(0),
            Err(ComputeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_max_keeps_highest() {
        let mut queue = BoundedPriorityQueue::max(3).unwrap();
        for (element, priority) in [(0, 1.0), (1, 5.0), (2, 3.0), (3, 4.0), (4, 0.5)] {
            queue.offer(element, priority);
        }
        assert_eq!(queue.count(), 3);
        assert_eq!(queue.elements().collect::<Vec<_>>(), vec![1, 3, 2]);
        assert_eq!(queue.priorities().collect::<Vec<_>>(), vec![5.0, 4.0, 3.0]);
    }

    #[test]
    fn test_min_keeps_lowest() {
        let mut queue = BoundedPriorityQueue::min(2).unwrap();
        for (element, priority) in [(0, 1.0), (1, 5.0), (2, -3.0), (3, 4.0)] {
            queue.offer(element, priority);
        }
        assert_eq!(
            queue.iter().collect::<Vec<_>>(),
            vec![(2, -3.0), (0, 1.0)]
        );
    }

    #[test]
    fn test_tie_keeps_incumbent() {
        let mut queue = BoundedPriorityQueue::max(2).unwrap();
        assert!(queue.offer(0, 2.0));
        assert!(queue.offer(1, 1.0));
        assert!(!queue.offer(2, 1.0));
        assert!(queue.contains(1));
        assert!(!queue.contains(2));
    }

    #[test]
    fn test_signed_zero_tie_keeps_incumbent() {
        let mut top = BoundedPriorityQueue::max(1).unwrap();
        assert!(top.offer(1, -0.0));
        assert!(!top.offer(2, 0.0));
        assert_eq!(top.elements().collect::<Vec<_>>(), vec![1]);

        let mut bottom = BoundedPriorityQueue::min(1).unwrap();
        assert!(bottom.offer(1, 0.0));
        assert!(!bottom.offer(2, -0.0));
        assert_eq!(bottom.elements().collect::<Vec<_>>(), vec![1]);
        assert_eq!(bottom.priorities().collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn test_nan_never_displaces_a_number() {
        let mut top = BoundedPriorityQueue::max(1).unwrap();
        assert!(top.offer(1, -5.0));
        assert!(!top.offer(2, f64::NAN));
        assert!(!top.offer(3, -f64::NAN));
        assert_eq!(top.elements().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_equal_priorities_in_offer_order() {
        let mut queue = BoundedPriorityQueue::max(3).unwrap();
        queue.offer(7, 1.0);
        queue.offer(8, 1.0);
        queue.offer(9, 2.0);
        assert_eq!(queue.elements().collect::<Vec<_>>(), vec![9, 7, 8]);
    }

    #[test]
    fn test_for_each_and_clear() {
        let mut queue = BoundedPriorityQueue::min(4).unwrap();
        queue.offer(1, 0.25);
        queue.offer(2, 0.75);

        let mut seen = Vec::new();
        queue.for_each(|element, priority| seen.push((element, priority)));
        assert_eq!(seen, vec![(1, 0.25), (2, 0.75)]);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.bound(), 4);
    }
}
