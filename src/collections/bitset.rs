//! Paged bit set
//!
//! Bits are packed 64 to a word in a [`HugeArray<u64>`](super::HugeArray).

use super::huge_array::HugeArray;
use crate::error::{ComputeError, ComputeResult};

/// Fixed-size set of bits addressed by 64-bit index
#[derive(Debug, Clone)]
pub struct HugeBitSet {
    words: HugeArray<u64>,
    size: u64,
}

impl HugeBitSet {
    /// Bit set with `size` cleared bits
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            words: HugeArray::new(size.div_ceil(64)),
            size,
        }
    }

    /// Number of addressable bits
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    fn locate(&self, index: u64) -> ComputeResult<(u64, u64)> {
        if index >= self.size {
            return Err(ComputeError::out_of_bounds(index, self.size));
        }
        Ok((index >> 6, 1 << (index & 63)))
    }

    /// True if bit `index` is set
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= size()`
    #[inline]
    pub fn get(&self, index: u64) -> ComputeResult<bool> {
        let (word, mask) = self.locate(index)?;
        Ok(self.words.get(word)? & mask != 0)
    }

    /// Set bit `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= size()`
    #[inline]
    pub fn set(&mut self, index: u64) -> ComputeResult<()> {
        let (word, mask) = self.locate(index)?;
        let bits = self.words.get(word)?;
        self.words.set(word, bits | mask)
    }

    /// Clear bit `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= size()`
    #[inline]
    pub fn clear(&mut self, index: u64) -> ComputeResult<()> {
        let (word, mask) = self.locate(index)?;
        let bits = self.words.get(word)?;
        self.words.set(word, bits & !mask)
    }

    // Unchecked variants for callers that validated `index` up front;
    // they panic like slice indexing when it is out of range.
    #[inline]
    pub(crate) fn contains(&self, index: u64) -> bool {
        self.words[index >> 6] & (1 << (index & 63)) != 0
    }

    #[inline]
    pub(crate) fn insert(&mut self, index: u64) {
        self.words[index >> 6] |= 1 << (index & 63);
    }

    #[inline]
    pub(crate) fn remove(&mut self, index: u64) {
        self.words[index >> 6] &= !(1 << (index & 63));
    }

    /// Clear every bit
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Number of set bits
    #[must_use]
    pub fn cardinality(&self) -> u64 {
        self.words.iter().map(|word| u64::from(word.count_ones())).sum()
    }

    /// Heap bytes held by this set
    #[must_use]
    pub fn size_of(&self) -> usize {
        self.words.size_of()
    }

    /// Heap bytes a set of `size` bits would hold
    #[must_use]
    pub fn memory_estimation(size: u64) -> usize {
        HugeArray::<u64>::memory_estimation(size.div_ceil(64))
    }
}
