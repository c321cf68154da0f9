//! Cooperative cancellation
//!
//! Tasks poll a [`TerminationSignal`] at well-defined points (once per node)
//! and stop with [`ComputeError::Cancelled`] once it reports not running.
//! Nothing is interrupted forcibly.

use crate::error::{ComputeError, ComputeResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Polled cancellation capability
pub trait TerminationSignal: Send + Sync {
    /// False once the computation should stop
    fn is_running(&self) -> bool;

    /// `Err(Cancelled)` once the computation should stop
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if [`is_running`](Self::is_running) is false
    fn assert_running(&self) -> ComputeResult<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ComputeError::Cancelled)
        }
    }
}

/// Signal that never terminates
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRunning;

impl TerminationSignal for AlwaysRunning {
    #[inline]
    fn is_running(&self) -> bool {
        true
    }
}

/// Shared flag; clones observe the same state
///
/// # Example
///
/// ```
/// use trueno_compute::{TerminationFlag, TerminationSignal};
///
/// let flag = TerminationFlag::new();
/// let handle = flag.clone();
/// assert!(flag.is_running());
///
/// handle.terminate();
/// assert!(!flag.is_running());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TerminationFlag {
    terminated: Arc<AtomicBool>,
}

impl TerminationFlag {
    /// Flag in the running state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination; irreversible
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
    }
}

impl TerminationSignal for TerminationFlag {
    #[inline]
    fn is_running(&self) -> bool {
        !self.terminated.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_running() {
        assert!(AlwaysRunning.is_running());
        assert_eq!(AlwaysRunning.assert_running(), Ok(()));
    }

    #[test]
    fn test_flag_terminates_all_clones() {
        let flag = TerminationFlag::new();
        let other = flag.clone();
        other.terminate();
        assert!(!flag.is_running());
        assert_eq!(flag.assert_running(), Err(ComputeError::Cancelled));
    }
}
