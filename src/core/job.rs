//! Source and sink contracts and the job that binds them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{ConfigError, SinkError, SourceError};

/// A data source polled by the scheduler.
///
/// `fetch` returns `Ok(None)` when the source answered but had nothing to
/// say; that is logged as an empty payload rather than a failure.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use api_poller::core::{Source, SourceError};
///
/// struct Clock;
///
/// #[async_trait]
/// impl Source for Clock {
///     fn service_name(&self) -> &str {
///         "Clock"
///     }
///
///     async fn fetch(&self) -> Result<Option<String>, SourceError> {
///         Ok(Some(r#"{"tick":1}"#.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send + Sync + 'static {
    /// Stable identifier used as the job key and as the CSV layout selector.
    fn service_name(&self) -> &str;

    /// Produce one raw payload.
    ///
    /// On native platforms this runs on a dedicated worker thread inside that
    /// worker's single-threaded tokio runtime.
    async fn fetch(&self) -> Result<Option<String>, SourceError>;
}

/// Append-only output shared by all jobs of a run.
///
/// Implementations must serialize concurrent calls so that each payload's
/// bytes land contiguously.
pub trait Sink: Send + Sync + 'static {
    /// Render `payload` for `service_name` and append it.
    fn write(&self, service_name: &str, payload: &str) -> Result<(), SinkError>;
}

/// A source bound to a polling interval and a sink.
///
/// Immutable once built; the scheduler moves it between the ready-queue and
/// exactly one worker at a time.
pub struct Job {
    source: Arc<dyn Source>,
    sink: Arc<dyn Sink>,
    interval: Duration,
}

impl Job {
    /// Bind `source` to `sink`, repeating every `interval`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidInterval` for a zero interval.
    pub fn new(
        source: Arc<dyn Source>,
        sink: Arc<dyn Sink>,
        interval: Duration,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(Self {
            source,
            sink,
            interval,
        })
    }

    /// Service name of the bound source.
    #[must_use]
    pub fn service_name(&self) -> &str {
        self.source.service_name()
    }

    /// Fixed delay between the end of one execution and the next.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    pub(crate) fn sink(&self) -> &dyn Sink {
        self.sink.as_ref()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("service", &self.service_name())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
