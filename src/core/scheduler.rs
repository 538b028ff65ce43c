//! Bounded fixed-delay scheduler.
//!
//! A `Scheduler` owns one FIFO ready-queue holding exactly one entry per
//! registered `Job` and a fixed pool of worker threads. Each worker loops:
//!
//! 1. dequeue a job (blocking while the queue is empty),
//! 2. execute it once: fetch from the source, hand the payload to the sink,
//! 3. sleep for the job's interval, measured from the end of the execution,
//! 4. put the job back at the tail of the queue if the scheduler is still running.
//!
//! Because a job is requeued only after its sleep, a job never runs on two
//! workers at once and at most `min(jobs, workers)` fetches are in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use api_poller::config::SchedulerConfig;
//! use api_poller::core::{Job, Scheduler};
//!
//! let scheduler = Scheduler::new(SchedulerConfig::new().with_worker_count(2))?;
//! scheduler.register(Job::new(source, sink, Duration::from_secs(10))?)?;
//! scheduler.start()?;
//! // ...
//! scheduler.shutdown(Duration::from_secs(5));
//! ```

mod native;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

pub use native::Scheduler;

/// Lifecycle of a scheduler. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Accepting registrations; no workers yet.
    Idle,
    /// Workers running and requeueing jobs.
    Running,
    /// Shutdown requested; completed jobs are dropped instead of requeued.
    Draining,
    /// All workers joined or abandoned; queue empty.
    Stopped,
}

/// Outcome of one execution of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Payload fetched and written.
    Written,
    /// Nothing to write: the source answered empty, or no rows could be inferred.
    Empty,
    /// Source, render, or sink failed; the cycle's data is lost.
    Failed,
}

/// Point-in-time statistics about the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Number of worker threads still owned by the scheduler.
    pub worker_count: usize,
    /// Jobs registered before start.
    pub registered: usize,
    /// Jobs queued, executing, or sleeping before requeue.
    pub in_rotation: usize,
    /// Jobs waiting in the ready-queue.
    pub queued: usize,
    /// Jobs currently executing.
    pub executing: usize,
    /// Jobs sleeping out their interval.
    pub waiting: usize,
    /// Cycles that wrote output.
    pub written_cycles: u64,
    /// Cycles with nothing to write.
    pub empty_cycles: u64,
    /// Cycles that failed.
    pub failed_cycles: u64,
    /// Workers still busy when the grace period ran out.
    pub abandoned_workers: usize,
}

/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub registered: AtomicUsize,
    pub in_rotation: AtomicUsize,
    pub queued: AtomicUsize,
    pub executing: AtomicUsize,
    pub waiting: AtomicUsize,
    pub written_cycles: AtomicU64,
    pub empty_cycles: AtomicU64,
    pub failed_cycles: AtomicU64,
    pub abandoned_workers: AtomicUsize,
}

impl SchedulerCounters {
    /// Record the outcome of one execution.
    pub fn record(&self, outcome: CycleOutcome) {
        let counter = match outcome {
            CycleOutcome::Written => &self.written_cycles,
            CycleOutcome::Empty => &self.empty_cycles,
            CycleOutcome::Failed => &self.failed_cycles,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> SchedulerStats {
        SchedulerStats {
            worker_count,
            registered: self.registered.load(Ordering::Acquire),
            in_rotation: self.in_rotation.load(Ordering::Acquire),
            queued: self.queued.load(Ordering::Relaxed),
            executing: self.executing.load(Ordering::Relaxed),
            waiting: self.waiting.load(Ordering::Relaxed),
            written_cycles: self.written_cycles.load(Ordering::Relaxed),
            empty_cycles: self.empty_cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            abandoned_workers: self.abandoned_workers.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order_is_monotonic() {
        assert!(SchedulerState::Idle < SchedulerState::Running);
        assert!(SchedulerState::Running < SchedulerState::Draining);
        assert!(SchedulerState::Draining < SchedulerState::Stopped);
    }

    #[test]
    fn test_stats_default() {
        let stats = SchedulerStats::default();
        assert_eq!(stats.worker_count, 0);
        assert_eq!(stats.in_rotation, 0);
        assert_eq!(stats.written_cycles, 0);
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = SchedulerCounters::default();
        counters.registered.fetch_add(3, Ordering::Relaxed);
        counters.in_rotation.fetch_add(3, Ordering::Relaxed);
        counters.record(CycleOutcome::Written);
        counters.record(CycleOutcome::Written);
        counters.record(CycleOutcome::Empty);
        counters.record(CycleOutcome::Failed);

        let stats = counters.snapshot(2);
        assert_eq!(stats.worker_count, 2);
        assert_eq!(stats.registered, 3);
        assert_eq!(stats.in_rotation, 3);
        assert_eq!(stats.written_cycles, 2);
        assert_eq!(stats.empty_cycles, 1);
        assert_eq!(stats.failed_cycles, 1);
    }
}
