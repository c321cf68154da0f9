//! Error kinds raised by the compute substrate
//!
//! Collections and partitioning return [`ComputeResult`]; orchestration code
//! (executor, aggregator, algorithms) returns `anyhow::Result` and carries a
//! [`ComputeError`] inside when the failure is one of the typed kinds.

use thiserror::Error;

/// Typed failure kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputeError {
    /// Access outside `[0, length)` on a paged collection
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: u64,
        /// Length of the collection
        length: u64,
    },

    /// Rejected input, detected before any work is scheduled
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The termination signal was raised while work was in flight
    #[error("computation was cancelled")]
    Cancelled,
}

impl ComputeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) const fn out_of_bounds(index: u64, length: u64) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// True if `error` wraps [`ComputeError::Cancelled`]
    #[must_use]
    pub fn is_cancellation(error: &anyhow::Error) -> bool {
        matches!(error.downcast_ref::<Self>(), Some(Self::Cancelled))
    }
}

/// Result alias for the typed primitives
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ComputeError::out_of_bounds(10, 4);
        assert_eq!(err.to_string(), "index 10 out of bounds for length 4");

        let err = ComputeError::invalid("concurrency must be positive");
        assert_eq!(
            err.to_string(),
            "invalid argument: concurrency must be positive"
        );
    }

    #[test]
    fn test_cancellation_detection() {
        let cancelled = anyhow::Error::new(ComputeError::Cancelled);
        assert!(ComputeError::is_cancellation(&cancelled));

        let other = anyhow::anyhow!("task exploded");
        assert!(!ComputeError::is_cancellation(&other));
    }
}
