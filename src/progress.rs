//! Progress reporting for long-running computations
//!
//! Observability only: trackers never influence results.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Progress sink consumed by partitioned computations
pub trait ProgressTracker: Send + Sync {
    /// Start a sub task expected to log `volume` units
    fn begin_sub_task(&self, name: &str, volume: u64);

    /// Record `units` of completed work; callable from any worker
    fn log_progress(&self, units: u64);

    /// Finish the current sub task
    fn end_sub_task(&self, name: &str);
}

/// Tracker that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyProgressTracker;

impl ProgressTracker for EmptyProgressTracker {
    fn begin_sub_task(&self, _name: &str, _volume: u64) {}

    fn log_progress(&self, _units: u64) {}

    fn end_sub_task(&self, _name: &str) {}
}

/// Tracker that counts units and logs through `tracing`
///
/// Percentages are logged at `debug` at most once per percent step.
#[derive(Debug, Default)]
pub struct TaskProgressTracker {
    volume: AtomicU64,
    progress: AtomicU64,
    last_percent: AtomicU64,
}

impl TaskProgressTracker {
    /// Tracker with no active sub task
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Units logged since the last `begin_sub_task`
    #[must_use]
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Acquire)
    }

    /// Volume announced by the last `begin_sub_task`
    #[must_use]
    pub fn volume(&self) -> u64 {
        self.volume.load(Ordering::Acquire)
    }
}

impl ProgressTracker for TaskProgressTracker {
    fn begin_sub_task(&self, name: &str, volume: u64) {
        self.volume.store(volume, Ordering::Release);
        self.progress.store(0, Ordering::Release);
        self.last_percent.store(0, Ordering::Release);
        info!(task = name, volume, "sub task started");
    }

    fn log_progress(&self, units: u64) {
        let done = self.progress.fetch_add(units, Ordering::AcqRel) + units;
        let volume = self.volume.load(Ordering::Acquire);
        if volume == 0 {
            return;
        }
        let percent = (done.saturating_mul(100) / volume).min(100);
        let last = self.last_percent.fetch_max(percent, Ordering::AcqRel);
        if percent > last {
            debug!(percent, done, volume, "progress");
        }
    }

    fn end_sub_task(&self, name: &str) {
        info!(task = name, done = self.progress(), "sub task finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_units_across_threads() {
        let tracker = TaskProgressTracker::new();
        tracker.begin_sub_task("count", 400);
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        tracker.log_progress(1);
                    }
                });
            }
        });
        tracker.end_sub_task("count");
        assert_eq!(tracker.progress(), 400);
        assert_eq!(tracker.volume(), 400);
    }

    #[test]
    fn test_begin_resets_progress() {
        let tracker = TaskProgressTracker::new();
        tracker.begin_sub_task("first", 10);
        tracker.log_progress(10);
        tracker.begin_sub_task("second", 0);
        tracker.log_progress(3);
        assert_eq!(tracker.progress(), 3);
    }
}
