//! Paged collections addressed by 64-bit indices
//!
//! - [`HugeArray`]: plain values, one writer per slot
//! - [`HugeAtomicLongArray`] / [`HugeAtomicDoubleArray`]: many writers per slot
//! - [`HugeBitSet`]: membership over `[0, size)`
//! - [`BoundedPriorityQueue`]: top-K retention
//! - [`HugePriorityQueue`]: indexed binary heap over external element ids
//!
//! None of the queues are thread-safe.

pub mod atomic_array;
pub mod bitset;
pub mod bounded_queue;
pub mod huge_array;
pub mod page;
pub mod priority_queue;

pub use atomic_array::{HugeAtomicDoubleArray, HugeAtomicLongArray};
pub use bitset::HugeBitSet;
pub use bounded_queue::{BoundedPriorityQueue, Retain};
pub use huge_array::{HugeArray, HugeDoubleArray, HugeLongArray, PartitionWriter};
pub use page::PageLayout;
pub use priority_queue::{
    CostOrder, HugeMaxPriorityQueue, HugeMinPriorityQueue, HugePriorityQueue, MaxOrder, MinOrder,
};
