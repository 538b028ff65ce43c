//! Scheduler configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for a `Scheduler`.
///
/// ```rust,ignore
/// let config = SchedulerConfig::new()
///     .with_worker_count(4)
///     .with_source_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads. Must be at least one.
    pub worker_count: usize,
    /// Upper bound on a single `Source::fetch` call.
    pub source_timeout: Duration,
    /// Stack size for each worker thread, in bytes.
    pub thread_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            thread_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Start from defaults: one worker, ten second source timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the per-fetch timeout.
    #[must_use]
    pub const fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.source_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err(ConfigError::Invalid(
                "thread_stack_size must be at least 64 KiB".into(),
            ));
        }
        Ok(())
    }
}
