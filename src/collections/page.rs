//! Page arithmetic shared by the paged collections
//!
//! ```text
//! index = 40_000, shift = 14
//!   page   = 40_000 >> 14        = 2
//!   offset = 40_000 & (2^14 - 1) = 7_232
//! ```

use crate::config::PAGE_SHIFT;
use crate::error::{ComputeError, ComputeResult};

/// Smallest page shift accepted (2 elements per page)
const MIN_PAGE_SHIFT: u32 = 1;

/// Largest page shift accepted (2^30 elements per page)
const MAX_PAGE_SHIFT: u32 = 30;

/// Mapping between logical indices and `(page, offset)` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    length: u64,
    shift: u32,
    mask: u64,
}

impl PageLayout {
    /// Layout with the default page size
    #[must_use]
    pub const fn new(length: u64) -> Self {
        Self {
            length,
            shift: PAGE_SHIFT,
            mask: (1 << PAGE_SHIFT) - 1,
        }
    }

    /// Layout with an explicit page size of `2^shift` elements
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `shift` is outside `1..=30`
    pub fn with_shift(length: u64, shift: u32) -> ComputeResult<Self> {
        if !(MIN_PAGE_SHIFT..=MAX_PAGE_SHIFT).contains(&shift) {
            return Err(ComputeError::invalid(format!(
                "page shift {shift} outside {MIN_PAGE_SHIFT}..={MAX_PAGE_SHIFT}"
            )));
        }
        Ok(Self {
            length,
            shift,
            mask: (1 << shift) - 1,
        })
    }

    /// Logical length
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Page shift
    #[must_use]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Elements per full page
    #[must_use]
    pub const fn page_size(&self) -> usize {
        1 << self.shift
    }

    /// Number of pages needed to hold `length` elements
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.length.div_ceil(1 << self.shift) as usize
    }

    /// Length of page `page`; the last page holds only the remainder
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // bounded by page_size()
    pub fn page_length(&self, page: usize) -> usize {
        let start = (page as u64) << self.shift;
        let remaining = self.length.saturating_sub(start);
        remaining.min(self.page_size() as u64) as usize
    }

    /// Page holding `index`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // page count fits usize for any allocatable array
    pub const fn page_index(&self, index: u64) -> usize {
        (index >> self.shift) as usize
    }

    /// Position of `index` within its page
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // masked to page_size()
    pub const fn offset(&self, index: u64) -> usize {
        (index & self.mask) as usize
    }

    /// Validate `index` and map it to `(page, offset)`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= length`
    #[inline]
    pub fn locate(&self, index: u64) -> ComputeResult<(usize, usize)> {
        if index >= self.length {
            return Err(ComputeError::out_of_bounds(index, self.length));
        }
        Ok((self.page_index(index), self.offset(index)))
    }

    /// Allocate zero-initialized pages for this layout
    pub(crate) fn allocate<T>(&self, mut fill: impl FnMut() -> T) -> Vec<Box<[T]>> {
        (0..self.page_count())
            .map(|page| (0..self.page_length(page)).map(|_| fill()).collect())
            .collect()
    }

    /// Heap bytes used by pages of `element_size`-byte values
    #[must_use]
    pub fn size_of_pages(&self, element_size: usize) -> usize {
        let pointers = self.page_count() * std::mem::size_of::<Box<[u8]>>();
        #[allow(clippy::cast_possible_truncation)]
        let payload = self.length as usize * element_size;
        pointers + payload
    }
}
