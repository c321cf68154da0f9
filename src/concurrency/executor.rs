//! Bounded-concurrency task execution on a rayon pool
//!
//! [`RunWithConcurrency::run`] starts `min(concurrency, tasks)` workers inside
//! a pool scope. Workers claim tasks from a shared cursor, so at most
//! `concurrency` tasks run at once and nothing is claimed after a failure or
//! cancellation is observed:
//!
//! ```text
//! Idle -> Submitting -> Running -> Completed
//!                               -> Failed     (first task error, returned as-is)
//!                               -> Cancelled  (ComputeError::Cancelled)
//! ```
//!
//! In-flight tasks always drain before `run` returns. A panicking task is
//! not caught; the panic resumes on the caller once the scope closes.

use crate::concurrency::termination::{AlwaysRunning, TerminationSignal};
use crate::config::Concurrency;
use crate::error::ComputeError;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Lifecycle of one [`RunWithConcurrency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecutorState {
    /// Nothing submitted yet
    Idle = 0,
    /// Tasks are being prepared
    Submitting = 1,
    /// Workers are claiming tasks
    Running = 2,
    /// Every task finished successfully
    Completed = 3,
    /// A task returned an error
    Failed = 4,
    /// The termination signal stopped the run
    Cancelled = 5,
}

impl ExecutorState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Submitting,
            2 => Self::Running,
            3 => Self::Completed,
            4 => Self::Failed,
            5 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

/// Build a pool of `concurrency` named worker threads
///
/// # Errors
///
/// Returns an error if the operating system refuses to spawn the threads
pub fn build_pool(concurrency: Concurrency) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(concurrency.value())
        .thread_name(|index| format!("trueno-compute-{index}"))
        .build()
        .context("failed to build worker pool")
}

/// Runs partition tasks with a fixed concurrency bound
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use trueno_compute::{build_pool, Concurrency, RunWithConcurrency};
///
/// let concurrency = Concurrency::new(2).unwrap();
/// let pool = build_pool(concurrency).unwrap();
/// let total = AtomicU64::new(0);
///
/// let tasks: Vec<_> = (1..=4_u64)
///     .map(|n| {
///         let total = &total;
///         move || {
///             total.fetch_add(n, Ordering::Relaxed);
///             Ok(())
///         }
///     })
///     .collect();
///
/// RunWithConcurrency::new(concurrency, &pool).run(tasks).unwrap();
/// assert_eq!(total.load(Ordering::Relaxed), 10);
/// ```
pub struct RunWithConcurrency<'a> {
    concurrency: Concurrency,
    pool: &'a ThreadPool,
    termination: &'a dyn TerminationSignal,
    state: AtomicU8,
}

impl std::fmt::Debug for RunWithConcurrency<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunWithConcurrency")
            .field("concurrency", &self.concurrency)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

struct RunState<F> {
    slots: Vec<Mutex<Option<F>>>,
    cursor: AtomicUsize,
    halted: AtomicBool,
    cancelled: AtomicBool,
    first_error: Mutex<Option<anyhow::Error>>,
}

impl<'a> RunWithConcurrency<'a> {
    /// Executor bounded by `concurrency` on `pool`
    #[must_use]
    pub fn new(concurrency: Concurrency, pool: &'a ThreadPool) -> Self {
        Self {
            concurrency,
            pool,
            termination: &AlwaysRunning,
            state: AtomicU8::new(ExecutorState::Idle as u8),
        }
    }

    /// Poll `termination` before claiming each task
    #[must_use]
    pub fn with_termination(mut self, termination: &'a dyn TerminationSignal) -> Self {
        self.termination = termination;
        self
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ExecutorState {
        ExecutorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, state: ExecutorState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Run all tasks and block until they settle
    ///
    /// # Errors
    ///
    /// Returns the first task error unchanged, or `ComputeError::Cancelled`
    /// if the termination signal stopped the run
    pub fn run<F>(&self, tasks: Vec<F>) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send,
    {
        self.transition(ExecutorState::Submitting);
        if !self.termination.is_running() {
            self.transition(ExecutorState::Cancelled);
            return Err(ComputeError::Cancelled.into());
        }
        if tasks.is_empty() {
            self.transition(ExecutorState::Completed);
            return Ok(());
        }

        let workers = self.concurrency.value().min(tasks.len());
        let run = RunState {
            slots: tasks.into_iter().map(|task| Mutex::new(Some(task))).collect(),
            cursor: AtomicUsize::new(0),
            halted: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            first_error: Mutex::new(None),
        };
        debug!(
            tasks = run.slots.len(),
            concurrency = self.concurrency.value(),
            workers,
            "running tasks"
        );

        self.transition(ExecutorState::Running);
        self.pool.scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|_| self.work(&run));
            }
        });

        if let Some(error) = run.first_error.into_inner() {
            if ComputeError::is_cancellation(&error) {
                info!("run cancelled by a task");
                self.transition(ExecutorState::Cancelled);
            } else {
                self.transition(ExecutorState::Failed);
            }
            return Err(error);
        }
        if run.cancelled.load(Ordering::Acquire) {
            info!(
                started = run.cursor.load(Ordering::Acquire).min(run.slots.len()),
                total = run.slots.len(),
                "run cancelled"
            );
            self.transition(ExecutorState::Cancelled);
            return Err(ComputeError::Cancelled.into());
        }

        self.transition(ExecutorState::Completed);
        Ok(())
    }

    fn work<F>(&self, run: &RunState<F>)
    where
        F: FnOnce() -> Result<()> + Send,
    {
        loop {
            if run.halted.load(Ordering::Acquire) {
                return;
            }
            if !self.termination.is_running() {
                run.cancelled.store(true, Ordering::Release);
                run.halted.store(true, Ordering::Release);
                return;
            }

            let index = run.cursor.fetch_add(1, Ordering::AcqRel);
            let Some(slot) = run.slots.get(index) else {
                return;
            };
            let Some(task) = slot.lock().take() else {
                continue;
            };

            if let Err(error) = task() {
                let mut first = run.first_error.lock();
                if first.is_none() {
                    if !ComputeError::is_cancellation(&error) {
                        warn!(task = index, error = %error, "task failed");
                    }
                    *first = Some(error);
                }
                run.halted.store(true, Ordering::Release);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::termination::TerminationFlag;
    use std::sync::atomic::AtomicI64;
    use std::time::Duration;

    fn pool(threads: usize) -> ThreadPool {
        build_pool(Concurrency::new(threads).unwrap()).unwrap()
    }

    #[test]
    fn test_runs_every_task() {
        let pool = pool(4);
        let counter = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let counter = &counter;
                move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
            })
            .collect();

        let runner = RunWithConcurrency::new(Concurrency::new(3).unwrap(), &pool);
        assert_eq!(runner.state(), ExecutorState::Idle);
        runner.run(tasks).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
        assert_eq!(runner.state(), ExecutorState::Completed);
    }

    #[test]
    fn test_never_exceeds_concurrency() {
        let pool = pool(8);
        let active = AtomicI64::new(0);
        let peak = AtomicI64::new(0);
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let (active, peak) = (&active, &peak);
                move || {
                    let now = active.fetch_add(1, Ordering::AcqRel) + 1;
                    peak.fetch_max(now, Ordering::AcqRel);
                    std::thread::sleep(Duration::from_millis(2));
                    active.fetch_sub(1, Ordering::AcqRel);
                    Ok(())
                }
            })
            .collect();

        RunWithConcurrency::new(Concurrency::new(2).unwrap(), &pool)
            .run(tasks)
            .unwrap();
        assert!(peak.load(Ordering::Acquire) <= 2);
    }

    #[test]
    fn test_first_error_returned_unchanged() {
        #[derive(Debug, thiserror::Error)]
        #[error("partition {0} exploded")]
        struct Boom(usize);

        let pool = pool(1);
        let started = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let started = &started;
                move || -> Result<()> {
                    started.fetch_add(1, Ordering::Relaxed);
                    if i == 2 {
                        return Err(Boom(i).into());
                    }
                    Ok(())
                }
            })
            .collect();

        let runner = RunWithConcurrency::new(Concurrency::new(1).unwrap(), &pool);
        let error = runner.run(tasks).unwrap_err();
        assert_eq!(error.downcast_ref::<Boom>().map(|b| b.0), Some(2));
        // single worker: nothing claimed after the failing task
        assert_eq!(started.load(Ordering::Relaxed), 3);
        assert_eq!(runner.state(), ExecutorState::Failed);
    }

    #[test]
    fn test_cancelled_before_start() {
        let pool = pool(2);
        let flag = TerminationFlag::new();
        flag.terminate();
        let ran = AtomicBool::new(false);
        let tasks = vec![|| {
            ran.store(true, Ordering::Relaxed);
            Ok(())
        }];

        let runner =
            RunWithConcurrency::new(Concurrency::new(2).unwrap(), &pool).with_termination(&flag);
        let error = runner.run(tasks).unwrap_err();
        assert!(ComputeError::is_cancellation(&error));
        assert!(!ran.load(Ordering::Relaxed));
        assert_eq!(runner.state(), ExecutorState::Cancelled);
    }

    #[test]
    fn test_no_task_claimed_after_cancellation() {
        let pool = pool(2);
        let flag = TerminationFlag::new();
        let started = AtomicUsize::new(0);
        let started_late = AtomicUsize::new(0);
        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let (flag, started, started_late) = (&flag, &started, &started_late);
                move || {
                    started.fetch_add(1, Ordering::AcqRel);
                    if !flag.is_running() {
                        started_late.fetch_add(1, Ordering::AcqRel);
                    }
                    if i == 5 {
                        flag.terminate();
                    }
                    std::thread::sleep(Duration::from_millis(1));
                    Ok(())
                }
            })
            .collect();

        let runner =
            RunWithConcurrency::new(Concurrency::new(2).unwrap(), &pool).with_termination(&flag);
        let error = runner.run(tasks).unwrap_err();
        assert!(ComputeError::is_cancellation(&error));
        assert!(started.load(Ordering::Acquire) < 50);
        // only a claim racing the flag itself may start late
        assert!(started_late.load(Ordering::Acquire) <= 1);
        assert_eq!(runner.state(), ExecutorState::Cancelled);
    }

    #[test]
    fn test_empty_task_list() {
        let pool = pool(1);
        let runner = RunWithConcurrency::new(Concurrency::default(), &pool);
        runner.run(Vec::<fn() -> Result<()>>::new()).unwrap();
        assert_eq!(runner.state(), ExecutorState::Completed);
    }
}
