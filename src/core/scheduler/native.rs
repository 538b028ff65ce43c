//! Native `Scheduler` implementation using OS threads.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime, so a slow source only ever occupies the worker that polls it.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on the ready-queue; the fixed-delay sleep
//!   is a timed receive on the shutdown channel
//! - **Prompt drain**: dropping the shutdown sender wakes idle and sleeping
//!   workers at once
//! - **Bounded shutdown**: workers report their exit on a channel, so the
//!   grace period is a single deadline rather than a per-worker timeout

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, trace, warn};

use crate::config::SchedulerConfig;
use crate::core::error::{ConfigError, RenderError, SchedulerError, SinkError, SourceError};
use crate::core::job::Job;

use super::{CycleOutcome, SchedulerCounters, SchedulerState, SchedulerStats};

/// State shared between the scheduler handle and its workers.
struct Shared {
    /// Lifecycle. Requeue holds the read guard across the push.
    state: RwLock<SchedulerState>,
    ready_tx: Sender<Job>,
    ready_rx: Receiver<Job>,
    counters: SchedulerCounters,
    source_timeout: Duration,
}

impl Shared {
    fn is_running(&self) -> bool {
        *self.state.read() == SchedulerState::Running
    }

    /// Put a job back at the tail of the queue, or retire it once draining.
    fn requeue(&self, job: Job) {
        let state = self.state.read();
        if *state != SchedulerState::Running {
            drop(state);
            self.retire(job);
            return;
        }
        self.counters.queued.fetch_add(1, Ordering::AcqRel);
        if let Err(err) = self.ready_tx.send(job) {
            self.counters.queued.fetch_sub(1, Ordering::AcqRel);
            self.retire(err.into_inner());
        }
    }

    /// Drop a job from rotation permanently.
    fn retire(&self, job: Job) {
        self.counters.in_rotation.fetch_sub(1, Ordering::AcqRel);
        debug!(service = %job.service_name(), "Job retired from rotation");
    }
}

/// Sends the worker id when the worker thread ends, panicking or not.
struct ExitNotice {
    worker_id: usize,
    exit_tx: Sender<usize>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let _ = self.exit_tx.send(self.worker_id);
    }
}

/// Fixed pool of worker threads repeating registered jobs with fixed delay.
///
/// Lifecycle: `Idle` (register jobs) → `Running` (after `start`) →
/// `Draining` (after `shutdown`) → `Stopped`.
pub struct Scheduler {
    /// Scheduler configuration.
    config: SchedulerConfig,

    /// Queue, lifecycle, and counters shared with workers.
    shared: Arc<Shared>,

    /// Service names registered so far.
    services: Mutex<HashSet<String>>,

    /// Dropped on shutdown; disconnection is the stop signal.
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,

    /// Worker exit notifications.
    exit_tx: Sender<usize>,
    exit_rx: Receiver<usize>,

    /// Worker thread handles, indexed by worker id.
    workers: Mutex<Vec<Option<JoinHandle<()>>>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("state", &*self.shared.state.read())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create an idle scheduler.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid.
    pub fn new(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (ready_tx, ready_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = unbounded();
        let (exit_tx, exit_rx) = unbounded();

        let shared = Arc::new(Shared {
            state: RwLock::new(SchedulerState::Idle),
            ready_tx,
            ready_rx,
            counters: SchedulerCounters::default(),
            source_timeout: config.source_timeout,
        });

        Ok(Self {
            config,
            shared,
            services: Mutex::new(HashSet::new()),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            exit_tx,
            exit_rx,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Add a job to the initial ready-queue.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateService` if a job with the same service name exists
    /// - `ConfigError::AlreadyStarted` once `start` or `shutdown` has been called
    pub fn register(&self, job: Job) -> Result<(), ConfigError> {
        let state = self.shared.state.read();
        if *state != SchedulerState::Idle {
            return Err(ConfigError::AlreadyStarted);
        }

        let service = job.service_name().to_owned();
        let mut services = self.services.lock();
        if services.contains(&service) {
            return Err(ConfigError::DuplicateService(service));
        }

        let interval = job.interval();
        self.shared
            .ready_tx
            .send(job)
            .map_err(|_| ConfigError::Invalid("ready-queue closed".into()))?;
        services.insert(service.clone());

        let counters = &self.shared.counters;
        counters.registered.fetch_add(1, Ordering::AcqRel);
        counters.in_rotation.fetch_add(1, Ordering::AcqRel);
        counters.queued.fetch_add(1, Ordering::AcqRel);

        info!(
            service = %service,
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "Job registered"
        );
        Ok(())
    }

    /// Spawn the worker threads.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::AlreadyStarted` if called twice or after shutdown
    /// - `SchedulerError::Spawn` if a worker thread cannot be created; workers
    ///   already spawned are shut down again
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut state = self.shared.state.write();
            if *state != SchedulerState::Idle {
                return Err(SchedulerError::AlreadyStarted);
            }
            *state = SchedulerState::Running;
        }

        let mut workers = self.workers.lock();
        for worker_id in 0..self.config.worker_count {
            match spawn_worker(
                worker_id,
                Arc::clone(&self.shared),
                self.shutdown_rx.clone(),
                self.exit_tx.clone(),
                self.config.thread_stack_size,
            ) {
                Ok(handle) => workers.push(Some(handle)),
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to spawn worker thread");
                    drop(workers);
                    self.shutdown(Duration::from_secs(1));
                    return Err(SchedulerError::Spawn(e));
                }
            }
        }

        info!(
            worker_count = self.config.worker_count,
            jobs = self.shared.counters.registered.load(Ordering::Acquire),
            "Scheduler started"
        );
        Ok(())
    }

    /// Stop requeueing jobs and wait up to `grace` for in-flight executions.
    ///
    /// Workers still busy when the grace period ends are detached and counted
    /// in `SchedulerStats::abandoned_workers`; when they eventually finish
    /// they drop their job instead of requeueing it. A write already inside
    /// the sink completes, since the sink appends each payload under its lock.
    ///
    /// Calling this again, or concurrently, has no further effect.
    pub fn shutdown(&self, grace: Duration) {
        {
            let mut state = self.shared.state.write();
            let current = *state;
            match current {
                SchedulerState::Draining | SchedulerState::Stopped => return,
                SchedulerState::Idle => {
                    *state = SchedulerState::Stopped;
                    drop(state);
                    self.shutdown_tx.lock().take();
                    self.drain_queue();
                    info!("Scheduler stopped before start");
                    return;
                }
                SchedulerState::Running => *state = SchedulerState::Draining,
            }
        }

        info!(
            grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            "Shutting down scheduler"
        );

        // Disconnect wakes workers blocked on dequeue or sleeping out an interval
        self.shutdown_tx.lock().take();

        let mut workers = std::mem::take(&mut *self.workers.lock());
        let mut remaining = workers.iter().filter(|w| w.is_some()).count();
        let deadline = Instant::now().checked_add(grace);

        while remaining > 0 {
            let notice = match deadline {
                Some(deadline) => self.exit_rx.recv_deadline(deadline).ok(),
                None => self.exit_rx.recv().ok(),
            };
            let Some(worker_id) = notice else {
                break;
            };
            if let Some(handle) = workers.get_mut(worker_id).and_then(Option::take) {
                remaining -= 1;
                if handle.join().is_ok() {
                    debug!(worker_id = worker_id, "Worker joined successfully");
                } else {
                    warn!(worker_id = worker_id, "Worker panicked");
                }
            }
        }

        if remaining > 0 {
            self.shared
                .counters
                .abandoned_workers
                .store(remaining, Ordering::Relaxed);
            warn!(
                remaining = remaining,
                "Workers still busy after grace period - detaching"
            );
        }
        drop(workers);

        self.drain_queue();
        *self.shared.state.write() = SchedulerState::Stopped;

        info!("Scheduler shut down complete");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.shared.state.read()
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let worker_count = self.workers.lock().iter().filter(|w| w.is_some()).count();
        self.shared.counters.snapshot(worker_count)
    }

    /// Registered service names, sorted.
    #[must_use]
    pub fn services(&self) -> Vec<String> {
        let mut services: Vec<String> = self.services.lock().iter().cloned().collect();
        services.sort();
        services
    }

    /// Scheduler configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn drain_queue(&self) {
        while let Ok(job) = self.shared.ready_rx.try_recv() {
            self.shared.counters.queued.fetch_sub(1, Ordering::AcqRel);
            self.shared.retire(job);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Signal workers but don't join; explicit shutdown() is required for a graceful drain
        let mut state = self.shared.state.write();
        if *state == SchedulerState::Running {
            *state = SchedulerState::Draining;
            drop(state);
            self.shutdown_tx.lock().take();
            debug!("Scheduler dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    shared: Arc<Shared>,
    shutdown_rx: Receiver<()>,
    exit_tx: Sender<usize>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("poller-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            let _exit = ExitNotice { worker_id, exit_tx };
            debug!(worker_id = worker_id, "Worker thread started");

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to create worker runtime");
                    return;
                }
            };

            loop {
                let next = select! {
                    recv(shared.ready_rx) -> job => job.ok(),
                    recv(shutdown_rx) -> _ => None,
                };
                let Some(job) = next else {
                    debug!(worker_id = worker_id, "Shutdown signalled, worker exiting");
                    break;
                };
                shared.counters.queued.fetch_sub(1, Ordering::AcqRel);

                if !shared.is_running() {
                    shared.retire(job);
                    continue;
                }

                shared.counters.executing.fetch_add(1, Ordering::AcqRel);
                debug!(worker_id = worker_id, service = %job.service_name(), "Worker executing job");

                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    rt.block_on(execute_once(&job, shared.source_timeout))
                }))
                .unwrap_or_else(|_| {
                    error!(
                        worker_id = worker_id,
                        service = %job.service_name(),
                        "Job panicked during execution"
                    );
                    CycleOutcome::Failed
                });

                shared.counters.executing.fetch_sub(1, Ordering::AcqRel);
                shared.counters.record(outcome);

                // Fixed delay: the interval starts when the execution ends
                shared.counters.waiting.fetch_add(1, Ordering::AcqRel);
                let slept = matches!(
                    shutdown_rx.recv_timeout(job.interval()),
                    Err(RecvTimeoutError::Timeout)
                );
                shared.counters.waiting.fetch_sub(1, Ordering::AcqRel);

                if slept {
                    shared.requeue(job);
                } else {
                    shared.retire(job);
                }
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}

/// Run one cycle of a job: fetch, then hand the payload to the sink.
///
/// Never returns an error; every failure is logged and folded into the outcome.
pub(crate) async fn execute_once(job: &Job, source_timeout: Duration) -> CycleOutcome {
    let service = job.service_name();

    let fetched = tokio::time::timeout(source_timeout, job.source().fetch())
        .await
        .unwrap_or(Err(SourceError::Timeout(source_timeout)));

    let payload = match fetched {
        Ok(Some(payload)) if !payload.is_empty() => payload,
        Ok(_) => {
            warn!(service = %service, "No data received from source");
            return CycleOutcome::Empty;
        }
        Err(e) => {
            error!(service = %service, error = %e, "Error fetching data from source");
            return CycleOutcome::Failed;
        }
    };

    trace!(service = %service, payload = %payload, "Payload received");

    match job.sink().write(service, &payload) {
        Ok(()) => {
            debug!(service = %service, bytes = payload.len(), "Payload written");
            CycleOutcome::Written
        }
        Err(SinkError::Render(RenderError::UnsupportedShape(reason))) => {
            warn!(service = %service, reason = %reason, "Empty or unsupported payload structure");
            CycleOutcome::Empty
        }
        Err(e) => {
            error!(service = %service, error = %e, "Error writing payload");
            CycleOutcome::Failed
        }
    }
}
