//! Paged value arrays with exclusive-writer partition views
//!
//! A [`HugeArray`] is addressed by a 64-bit logical index and stored as a
//! sequence of fixed-size pages, so its capacity is never bounded by a single
//! allocation. Writes need `&mut self`; parallel writers obtain disjoint
//! [`PartitionWriter`]s, one per partition, so every slot has exactly one
//! writer.

use super::page::PageLayout;
use crate::concurrency::Partition;
use crate::error::{ComputeError, ComputeResult};
use std::ops::{AddAssign, Index, IndexMut};

/// Paged array of plain values
#[derive(Debug, Clone)]
pub struct HugeArray<T> {
    layout: PageLayout,
    pages: Vec<Box<[T]>>,
}

/// Paged array of signed 64-bit integers
pub type HugeLongArray = HugeArray<i64>;

/// Paged array of 64-bit floats
pub type HugeDoubleArray = HugeArray<f64>;

impl<T: Copy + Default> HugeArray<T> {
    /// Allocate `length` zeroed slots with the default page size
    ///
    /// # Example
    ///
    /// ```
    /// use trueno_compute::HugeLongArray;
    ///
    /// let mut degrees = HugeLongArray::new(3);
    /// degrees.set(1, 7).unwrap();
    /// assert_eq!(degrees.to_vec(), vec![0, 7, 0]);
    /// ```
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
        let pages = layout.allocate(T::default);
        Self { layout, pages }
    }

    /// Copy `values` into a new paged array
    #[must_use]
    pub fn from_slice(values: &[T]) -> Self {
        let layout = PageLayout::new(values.len() as u64);
        let pages = values.chunks(layout.page_size()).map(Box::from).collect();
        Self { layout, pages }
    }

    /// Logical length
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.layout.length()
    }

    /// True if the array holds no slots
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.layout.length() == 0
    }

    /// Page layout of this array
    #[must_use]
    pub const fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Read slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn get(&self, index: u64) -> ComputeResult<T> {
        let (page, offset) = self.layout.locate(index)?;
        Ok(self.pages[page][offset])
    }

    /// Write slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn set(&mut self, index: u64, value: T) -> ComputeResult<()> {
        let (page, offset) = self.layout.locate(index)?;
        self.pages[page][offset] = value;
        Ok(())
    }

    /// Set every slot to `value`
    pub fn fill(&mut self, value: T) {
        for page in &mut self.pages {
            page.fill(value);
        }
    }

    /// Set every slot to `f(index)`
    pub fn set_all(&mut self, mut f: impl FnMut(u64) -> T) {
        let mut index = 0_u64;
        for page in &mut self.pages {
            for slot in page.iter_mut() {
                *slot = f(index);
                index += 1;
            }
        }
    }

    /// Values in index order
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.pages.iter().flat_map(|page| page.iter().copied())
    }

    /// Copy into a contiguous vector (small arrays and tests)
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Heap bytes held by this array
    #[must_use]
    pub fn size_of(&self) -> usize {
        self.layout.size_of_pages(std::mem::size_of::<T>())
    }

    /// Heap bytes an array of `length` slots would hold
    #[must_use]
    pub fn memory_estimation(length: u64) -> usize {
        PageLayout::new(length).size_of_pages(std::mem::size_of::<T>())
    }

    /// Drop all pages, returning the number of bytes freed
    pub fn release(self) -> usize {
        self.size_of()
    }

    /// Split into one exclusive writer per partition
    ///
    /// Partitions must be sorted by start node and must not overlap; gaps
    /// are allowed and stay unreachable through the returned writers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for overlapping or unsorted partitions and
    /// `IndexOutOfBounds` if a partition reaches past `len()`
    pub fn partition_writers(
        &mut self,
        partitions: &[Partition],
    ) -> ComputeResult<Vec<PartitionWriter<'_, T>>> {
        let length = self.len();
        let layout = self.layout;
        let mut pages = self.pages.iter_mut().map(|page| &mut page[..]);
        let mut current: &mut [T] = Default::default();
        // logical index of current[0]
        let mut position = 0_u64;
        let mut writers = Vec::with_capacity(partitions.len());

        for partition in partitions {
            let start = partition.start_node();
            let end = partition.end_node();
            if start < position {
                return Err(ComputeError::invalid(format!(
                    "partition starting at {start} overlaps a previous partition ending at {position}"
                )));
            }
            if end > length {
                return Err(ComputeError::out_of_bounds(end - 1, length));
            }
            if partition.node_count() == 0 {
                writers.push(PartitionWriter::new(start, 0, &layout, Vec::new()));
                continue;
            }

            while current.len() as u64 <= start - position {
                position += current.len() as u64;
                current = pages
                    .next()
                    .ok_or_else(|| ComputeError::out_of_bounds(start, length))?;
            }
            #[allow(clippy::cast_possible_truncation)] // within current page
            let skip = (start - position) as usize;
            current = std::mem::take(&mut current).split_at_mut(skip).1;
            position = start;

            let mut segments = Vec::new();
            let mut remaining = partition.node_count();
            while remaining > 0 {
                if current.is_empty() {
                    current = pages
                        .next()
                        .ok_or_else(|| ComputeError::out_of_bounds(position, length))?;
                    continue;
                }
                #[allow(clippy::cast_possible_truncation)] // bounded by current.len()
                let take = remaining.min(current.len() as u64) as usize;
                let (head, tail) = std::mem::take(&mut current).split_at_mut(take);
                segments.push(head);
                current = tail;
                position += take as u64;
                remaining -= take as u64;
            }

            writers.push(PartitionWriter::new(
                start,
                partition.node_count(),
                &layout,
                segments,
            ));
        }

        Ok(writers)
    }
}

impl<T: Copy + Default + AddAssign> HugeArray<T> {
    /// Add `delta` to slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index >= len()`
    #[inline]
    pub fn add_to(&mut self, index: u64, delta: T) -> ComputeResult<()> {
        let (page, offset) = self.layout.locate(index)?;
        self.pages[page][offset] += delta;
        Ok(())
    }
}

impl<T: Copy + Default> Index<u64> for HugeArray<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index >= len()`; use [`HugeArray::get`] for a checked read
    #[inline]
    fn index(&self, index: u64) -> &T {
        &self.pages[self.layout.page_index(index)][self.layout.offset(index)]
    }
}

impl<T: Copy + Default> IndexMut<u64> for HugeArray<T> {
    #[inline]
    fn index_mut(&mut self, index: u64) -> &mut T {
        &mut self.pages[self.layout.page_index(index)][self.layout.offset(index)]
    }
}

/// Exclusive mutable view over one partition's slots
///
/// Created by [`HugeArray::partition_writers`]. Indices are the array's
/// global indices and must fall inside the partition.
#[derive(Debug)]
pub struct PartitionWriter<'a, T> {
    start: u64,
    node_count: u64,
    head_len: usize,
    shift: u32,
    mask: u64,
    segments: Vec<&'a mut [T]>,
}

impl<'a, T: Copy> PartitionWriter<'a, T> {
    fn new(start: u64, node_count: u64, layout: &PageLayout, segments: Vec<&'a mut [T]>) -> Self {
        let head_len = segments.first().map_or(0, |segment| segment.len());
        Self {
            start,
            node_count,
            head_len,
            shift: layout.shift(),
            mask: (1 << layout.shift()) - 1,
            segments,
        }
    }

    /// First index covered by this writer
    #[must_use]
    pub const fn start_node(&self) -> u64 {
        self.start
    }

    /// Number of slots covered by this writer
    #[must_use]
    pub const fn node_count(&self) -> u64 {
        self.node_count
    }

    #[inline]
    fn slot(&mut self, index: u64) -> ComputeResult<&mut T> {
        let end = self.start + self.node_count;
        if index < self.start || index >= end {
            return Err(ComputeError::out_of_bounds(index, end));
        }
        let offset = index - self.start;
        #[allow(clippy::cast_possible_truncation)] // offsets stay within one page
        let (segment, position) = if offset < self.head_len as u64 {
            (0, offset as usize)
        } else {
            let rest = offset - self.head_len as u64;
            (1 + (rest >> self.shift) as usize, (rest & self.mask) as usize)
        };
        Ok(&mut self.segments[segment][position])
    }

    /// Write slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index` lies outside the partition
    #[inline]
    pub fn set(&mut self, index: u64, value: T) -> ComputeResult<()> {
        *self.slot(index)? = value;
        Ok(())
    }

    /// Read slot `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `index` lies outside the partition
    #[inline]
    pub fn get(&mut self, index: u64) -> ComputeResult<T> {
        self.slot(index).map(|slot| *slot)
    }
}
