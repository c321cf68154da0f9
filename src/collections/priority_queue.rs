//! Binary-heap priority queue over huge-scale element ids
//!
//! Elements are external ids in `[0, capacity)`. The queue keeps three
//! paged structures:
//!
//! ```text
//! heap:  [_, e3, e0, e7, ...]   1-based positions, heap-ordered by cost
//! costs: cost[e] for every present element
//! keys:  bit e set <=> e is present
//! ```
//!
//! `add` and `pop` are O(log n). `set` on a present element finds its heap
//! slot with a linear scan (O(n)) instead of maintaining a reverse position
//! index, then sifts it up or down.

use super::bitset::HugeBitSet;
use super::huge_array::{HugeArray, HugeDoubleArray};
use crate::error::{ComputeError, ComputeResult};
use std::fmt::Debug;
use std::marker::PhantomData;

/// Cost ordering used by [`HugePriorityQueue`]
///
/// The element ranked first by `less_than` sits at the top of the heap.
pub trait CostOrder: Debug + Copy + Default {
    /// True if cost `a` ranks strictly before cost `b`
    fn less_than(a: f64, b: f64) -> bool;
}

/// Lowest cost on top
#[derive(Debug, Clone, Copy, Default)]
pub struct MinOrder;

/// Highest cost on top
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxOrder;

impl CostOrder for MinOrder {
    #[inline]
    fn less_than(a: f64, b: f64) -> bool {
        a < b
    }
}

impl CostOrder for MaxOrder {
    #[inline]
    fn less_than(a: f64, b: f64) -> bool {
        a > b
    }
}

/// Heap-ordered queue of element ids with externally keyed costs
///
/// Not thread-safe; meant for one search loop at a time.
#[derive(Debug, Clone)]
pub struct HugePriorityQueue<O: CostOrder> {
    capacity: u64,
    heap: HugeArray<u64>,
    costs: HugeDoubleArray,
    keys: HugeBitSet,
    size: u64,
    order: PhantomData<O>,
}

/// Queue popping the lowest cost first
pub type HugeMinPriorityQueue = HugePriorityQueue<MinOrder>;

/// Queue popping the highest cost first
pub type HugeMaxPriorityQueue = HugePriorityQueue<MaxOrder>;

impl<O: CostOrder> HugePriorityQueue<O> {
    /// Queue for element ids in `[0, capacity)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `capacity` is zero
    ///
    /// # Example
    ///
    /// ```
    /// use trueno_compute::HugeMinPriorityQueue;
    ///
    /// let mut queue = HugeMinPriorityQueue::new(10).unwrap();
    /// queue.add(4, 2.0).unwrap();
    /// queue.add(7, 0.5).unwrap();
    /// queue.set(4, 0.1).unwrap(); // decrease-key
    ///
    /// assert_eq!(queue.pop(), Some(4));
    /// assert_eq!(queue.pop(), Some(7));
    /// assert_eq!(queue.pop(), None);
    /// ```
    pub fn new(capacity: u64) -> ComputeResult<Self> {
        if capacity == 0 {
            return Err(ComputeError::invalid("queue capacity must be positive"));
        }
        Ok(Self {
            capacity,
            heap: HugeArray::new(capacity + 1),
            costs: HugeDoubleArray::new(capacity),
            keys: HugeBitSet::new(capacity),
            size: 0,
            order: PhantomData,
        })
    }

    /// Heap bytes a queue of `capacity` elements would hold
    #[must_use]
    pub fn memory_estimation(capacity: u64) -> usize {
        HugeArray::<u64>::memory_estimation(capacity + 1)
            + HugeDoubleArray::memory_estimation(capacity)
            + HugeBitSet::memory_estimation(capacity)
    }

    /// Largest element id plus one
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of present elements
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// True if no element is present
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// True if `element` currently has a recorded cost
    #[must_use]
    pub fn contains(&self, element: u64) -> bool {
        element < self.capacity && self.keys.contains(element)
    }

    /// Recorded cost of `element`, if present
    #[must_use]
    pub fn cost(&self, element: u64) -> Option<f64> {
        self.contains(element).then(|| self.costs[element])
    }

    /// Element at the top of the heap
    #[must_use]
    pub fn top(&self) -> Option<u64> {
        (self.size > 0).then(|| self.heap[1])
    }

    /// Cost of the element at the top of the heap
    #[must_use]
    pub fn top_cost(&self) -> Option<f64> {
        self.top().map(|element| self.costs[element])
    }

    fn check_element(&self, element: u64) -> ComputeResult<()> {
        if element >= self.capacity {
            return Err(ComputeError::out_of_bounds(element, self.capacity));
        }
        Ok(())
    }

    /// Insert `element` with `cost`
    ///
    /// An element that is already present is repositioned as by [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `element >= capacity()`
    pub fn add(&mut self, element: u64, cost: f64) -> ComputeResult<()> {
        self.check_element(element)?;
        if self.keys.contains(element) {
            self.reposition(element, cost);
        } else {
            self.insert(element, cost);
        }
        Ok(())
    }

    /// Record `cost` for `element`, inserting it if absent
    ///
    /// Updating a present element scans the heap for its position.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `element >= capacity()`
    pub fn set(&mut self, element: u64, cost: f64) -> ComputeResult<()> {
        self.add(element, cost)
    }

    /// Remove and return the top element; `None` once drained
    pub fn pop(&mut self) -> Option<u64> {
        self.pop_with_cost().map(|(element, _)| element)
    }

    /// Remove and return the top element with its cost
    pub fn pop_with_cost(&mut self) -> Option<(u64, f64)> {
        if self.size == 0 {
            return None;
        }
        let top = self.heap[1];
        let cost = self.costs[top];
        self.heap[1] = self.heap[self.size];
        self.size -= 1;
        if self.size > 0 {
            self.down_heap(1);
        }
        self.keys.remove(top);
        Some((top, cost))
    }

    /// Remove all elements, keeping the allocated storage
    pub fn clear(&mut self) {
        self.size = 0;
        self.keys.clear_all();
    }

    /// Drop all storage, returning the number of bytes freed
    pub fn release(self) -> usize {
        self.heap.release() + self.costs.release() + self.keys.size_of()
    }

    /// True if every child ranks no earlier than its parent
    #[must_use]
    pub fn is_heap_ordered(&self) -> bool {
        (2..=self.size).all(|position| {
            !self.less_than(self.heap[position], self.heap[position >> 1])
        })
    }

    fn insert(&mut self, element: u64, cost: f64) {
        self.costs[element] = cost;
        self.keys.insert(element);
        self.size += 1;
        self.heap[self.size] = element;
        self.up_heap(self.size);
    }

    fn reposition(&mut self, element: u64, cost: f64) {
        self.costs[element] = cost;
        if let Some(position) = self.find_position(element) {
            if !self.up_heap(position) {
                self.down_heap(position);
            }
        }
    }

    fn find_position(&self, element: u64) -> Option<u64> {
        (1..=self.size).find(|&position| self.heap[position] == element)
    }

    #[inline]
    fn less_than(&self, a: u64, b: u64) -> bool {
        O::less_than(self.costs[a], self.costs[b])
    }

    // Returns true if the element moved.
    fn up_heap(&mut self, origin: u64) -> bool {
        let node = self.heap[origin];
        let mut i = origin;
        let mut parent = i >> 1;
        while parent > 0 && self.less_than(node, self.heap[parent]) {
            self.heap[i] = self.heap[parent];
            i = parent;
            parent >>= 1;
        }
        self.heap[i] = node;
        i != origin
    }

    fn down_heap(&mut self, origin: u64) {
        let node = self.heap[origin];
        let mut i = origin;
        let mut child = self.smaller_child(i);
        while child <= self.size && self.less_than(self.heap[child], node) {
            self.heap[i] = self.heap[child];
            i = child;
            child = self.smaller_child(i);
        }
        self.heap[i] = node;
    }

    fn smaller_child(&self, position: u64) -> u64 {
        let left = position << 1;
        let right = left + 1;
        if right <= self.size && self.less_than(self.heap[right], self.heap[left]) {
            right
        } else {
            left
        }
    }
}
