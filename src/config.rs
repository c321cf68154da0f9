//! Tuning constants and validated concurrency
//!
//! Defaults are sized for graphs in the 10^6 to 10^9 node range.

use crate::error::{ComputeError, ComputeResult};
use std::num::NonZeroUsize;

/// Default worker count when none is configured
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default minimum number of nodes per partition
pub const DEFAULT_MIN_BATCH_SIZE: u64 = 10_000;

/// Default page shift for paged collections (16384 elements per page)
pub const PAGE_SHIFT: u32 = 14;

/// Number of worker threads an operation may use (always at least one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Concurrency(NonZeroUsize);

impl Concurrency {
    /// Validate a raw worker count
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `value` is zero
    pub fn new(value: usize) -> ComputeResult<Self> {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| ComputeError::invalid("concurrency must be positive"))
    }

    /// Concurrency matching the host's available parallelism
    #[must_use]
    pub fn available() -> Self {
        Self(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    /// This count, lowered to the host's available parallelism
    #[must_use]
    pub fn capped_to_host(self) -> Self {
        self.min(Self::available())
    }

    /// Raw worker count
    #[must_use]
    pub const fn value(self) -> usize {
        self.0.get()
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = ComputeError;

    fn try_from(value: usize) -> ComputeResult<Self> {
        Self::new(value)
    }
}
