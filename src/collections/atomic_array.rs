//! Paged atomic arrays for many-writer accumulation
//!
//! Every slot is an independent atomic; the only mutation paths are atomic
//! stores, fetch-and-add and compare-and-set. Writers from different
//! partitions may target the same slot, and the final value of a run made of
//! additions does not depend on their interleaving.

use super::page::PageLayout;
use crate::error::ComputeResult;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Page storage shared by the typed atomic arrays
#[derive(Debug)]
struct AtomicPages<A> {
    layout: PageLayout,
    pages: Vec<Box<[A]>>,
}

impl<A> AtomicPages<A> {
    fn new(layout: PageLayout, fill: impl FnMut() -> A) -> Self {
        let pages = layout.allocate(fill);
        Self { layout, pages }
    }

    #[inline]
    fn slot(&self, index: u64) -> ComputeResult<&A> {
        let (page, offset) = self.layout.locate(index)?;
        Ok(&self.pages[page][offset])
    }

    fn slots(&self) -> impl Iterator<Item = &A> + '_ {
        self.pages.iter().flat_map(|page| page.iter())
    }

    const fn len(&self) -> u64 {
        self.layout.length()
    }

    fn size_of(&self) -> usize {
        self.layout.size_of_pages(std::mem::size_of::<A>())
    }
}

/// Paged array of `AtomicI64`
#[derive(Debug)]
pub struct HugeAtomicLongArray {
    storage: AtomicPages<AtomicI64>,
}

impl HugeAtomicLongArray {
    /// Allocate `length` zeroed slots
    #[must_use]
    pub fn new(length: u64) -> Self {
        Self::with_layout(PageLayout::new(length))
    }

    /// Allocate with pages of `2^shift` elements
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a shift outside `1..=30`
    pub fn with_page_shift(length: u64, shift: u32) -> ComputeResult<Self> {
        Ok(Self::with_layout(PageLayout::with_shift(length, shift)?))
    }

    fn with_layout(layout: PageLayout) -> Self {
        Self {
            storage: AtomicPages::new(layout, || AtomicI64::new(0)),
        }
    }

    /// Logical length
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.storage.len()
    }

    /// True if the array holds no slots
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Read slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn get(&self, index: u64) -> ComputeResult<i64> {
        Ok(self.storage.slot(index)?.load(Ordering::Acquire))
    }

    /// Store `value` into slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn set(&self, index: u64, value: i64) -> ComputeResult<()> {
        self.storage.slot(index)?.store(value, Ordering::Release);
        Ok(())
    }

    /// Add `delta` to slot `index`, returning the previous value
    ///
    /// Addition wraps on overflow.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn get_and_add(&self, index: u64, delta: i64) -> ComputeResult<i64> {
        Ok(self.storage.slot(index)?.fetch_add(delta, Ordering::AcqRel))
    }

    /// Replace `expected` with `new`; true if the swap happened
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    pub fn compare_and_set(&self, index: u64, expected: i64, new: i64) -> ComputeResult<bool> {
        Ok(self
            .storage
            .slot(index)?
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok())
    }

    /// Replace `expected` with `new`, returning the witnessed value
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    pub fn compare_and_exchange(&self, index: u64, expected: i64, new: i64) -> ComputeResult<i64> {
        let witness = self.storage.slot(index)?.compare_exchange(
            expected,
            new,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(witness.unwrap_or_else(|current| current))
    }

    /// Apply `f` atomically, retrying on contention; returns the new value
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    pub fn update(&self, index: u64, f: impl Fn(i64) -> i64) -> ComputeResult<i64> {
        let slot = self.storage.slot(index)?;
        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = f(current);
            match slot.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Ok(next),
                Err(witness) => current = witness,
            }
        }
    }

    /// Snapshot in index order
    #[must_use]
    pub fn to_vec(&self) -> Vec<i64> {
        self.storage
            .slots()
            .map(|slot| slot.load(Ordering::Acquire))
            .collect()
    }

    /// Heap bytes held by this array
    #[must_use]
    pub fn size_of(&self) -> usize {
        self.storage.size_of()
    }

    /// Drop all pages, returning the number of bytes freed
    pub fn release(self) -> usize {
        self.storage.size_of()
    }
}

/// Paged array of atomically updated `f64` values
///
/// Values are stored as their IEEE-754 bit patterns in `AtomicU64` slots;
/// additions run as compare-and-set loops.
#[derive(Debug)]
pub struct HugeAtomicDoubleArray {
    storage: AtomicPages<AtomicU64>,
}

impl HugeAtomicDoubleArray {
    /// Allocate `length` slots holding `0.0`
    #[must_use]
    pub fn new(length: u64) -> Self {
        Self::with_layout(PageLayout::new(length))
    }

    /// Allocate with pages of `2^shift` elements
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a shift outside `1..=30`
    pub fn with_page_shift(length: u64, shift: u32) -> ComputeResult<Self> {
        Ok(Self::with_layout(PageLayout::with_shift(length, shift)?))
    }

    fn with_layout(layout: PageLayout) -> Self {
        Self {
            storage: AtomicPages::new(layout, || AtomicU64::new(0.0_f64.to_bits())),
        }
    }

    /// Logical length
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.storage.len()
    }

    /// True if the array holds no slots
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    /// Read slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn get(&self, index: u64) -> ComputeResult<f64> {
        Ok(f64::from_bits(self.storage.slot(index)?.load(Ordering::Acquire)))
    }

    /// Store `value` into slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn set(&self, index: u64, value: f64) -> ComputeResult<()> {
        self.storage
            .slot(index)?
            .store(value.to_bits(), Ordering::Release);
        Ok(())
    }

    /// Add `delta` to slot `index`, returning the previous value
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn get_and_add(&self, index: u64, delta: f64) -> ComputeResult<f64> {
        let slot = self.storage.slot(index)?;
        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match slot.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(previous) => return Ok(f64::from_bits(previous)),
                Err(witness) => current = witness,
            }
        }
    }

    /// Replace `expected` with `new`; true if the swap happened
    ///
    /// Comparison is on bit patterns, so `-0.0` and `0.0` differ and a `NaN`
    /// matches an identical `NaN`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    pub fn compare_and_set(&self, index: u64, expected: f64, new: f64) -> ComputeResult<bool> {
        Ok(self
            .storage
            .slot(index)?
            .compare_exchange(
                expected.to_bits(),
                new.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok())
    }

    /// Snapshot in index order
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.storage
            .slots()
            .map(|slot| f64::from_bits(slot.load(Ordering::Acquire)))
            .collect()
    }

    /// Heap bytes held by this array
    #[must_use]
    pub fn size_of(&self) -> usize {
        self.storage.size_of()
    }

    /// Drop all pages, returning the number of bytes freed
    pub fn release(self) -> usize {
        self.storage.size_of()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComputeError;

    #[test]
    fn test_long_get_and_add_returns_previous() {
        let array = HugeAtomicLongArray::new(4);
        assert_eq!(array.get_and_add(2, 5).unwrap(), 0);
        assert_eq!(array.get_and_add(2, 3).unwrap(), 5);
        assert_eq!(array.get(2).unwrap(), 8);
    }

    #[test]
    fn test_long_compare_and_set() {
        let array = HugeAtomicLongArray::new(2);
        array.set(0, 10).unwrap();
        assert!(!array.compare_and_set(0, 9, 1).unwrap());
        assert!(array.compare_and_set(0, 10, 1).unwrap());
        assert_eq!(array.compare_and_exchange(0, 7, 2).unwrap(), 1);
        assert_eq!(array.update(0, |v| v * 3).unwrap(), 3);
    }

    #[test]
    fn test_long_out_of_bounds() {
        let array = HugeAtomicLongArray::new(2);
        assert_eq!(
            array.get_and_add(2, 1),
            Err(ComputeError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        );
    }

    #[test]
    fn test_long_concurrent_accumulation() {
        let array = HugeAtomicLongArray::with_page_shift(8, 2).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for i in 0..1_000 {
                        array.get_and_add(i % 8, 1).unwrap();
                    }
                });
            }
        });
        assert_eq!(array.to_vec(), vec![1_000; 8]);
    }

    #[test]
    fn test_double_get_and_add() {
        let array = HugeAtomicDoubleArray::new(3);
        assert_eq!(array.get_and_add(1, 1.5).unwrap(), 0.0);
        assert_eq!(array.get_and_add(1, 2.0).unwrap(), 1.5);
        assert_eq!(array.get(1).unwrap(), 3.5);
        assert!(array.get(3).is_err());
    }

    #[test]
    fn test_double_compare_and_set() {
        let array = HugeAtomicDoubleArray::new(1);
        array.set(0, 2.5).unwrap();
        assert!(!array.compare_and_set(0, 1.0, 4.0).unwrap());
        assert!(array.compare_and_set(0, 2.5, 4.0).unwrap());
        assert_eq!(array.to_vec(), vec![4.0]);
    }

    #[test]
    fn test_double_concurrent_accumulation() {
        let array = HugeAtomicDoubleArray::with_page_shift(4, 1).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for i in 0..400 {
                        array.get_and_add(i % 4, 0.5).unwrap();
                    }
                });
            }
        });
        assert_eq!(array.to_vec(), vec![200.0; 4]);
    }

    #[test]
    fn test_shared_page_storage_accounting() {
        let longs = HugeAtomicLongArray::with_page_shift(5, 1).unwrap();
        let doubles = HugeAtomicDoubleArray::with_page_shift(5, 1).unwrap();
        assert_eq!(longs.len(), 5);
        assert_eq!(doubles.len(), 5);
        assert_eq!(longs.size_of(), doubles.size_of());
        assert_eq!(longs.to_vec(), vec![0; 5]);
        assert_eq!(doubles.to_vec(), vec![0.0; 5]);
        assert!(HugeAtomicLongArray::new(0).is_empty());
        assert_eq!(longs.release(), doubles.release());
    }
}
