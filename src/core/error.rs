//! Error types for polling, rendering, output, and configuration.
//!
//! Every per-cycle error (`SourceError`, `RenderError`, `SinkError`) is
//! recoverable: the scheduler logs it and moves on to the next cycle.
//! Only `ConfigError` is fatal, and it is raised before the scheduler starts.

use std::time::Duration;

use thiserror::Error;

/// Failure of a data source to produce a payload.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source did not answer within the configured timeout.
    #[error("source timed out after {0:?}")]
    Timeout(Duration),
    /// The remote end answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL, without credentials.
        url: String,
    },
    /// Connection, TLS, or body decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Any other source-specific failure.
    #[error("source failed: {0}")]
    Other(String),
}

/// Failure to turn a payload into output bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The payload is not valid JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    /// The payload parsed, but no rows can be inferred from its structure.
    #[error("unsupported structure: {0}")]
    UnsupportedShape(String),
}

/// Failure while writing a payload to the output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The payload could not be rendered; nothing was written.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The append itself failed.
    #[error("output i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid configuration detected before any job runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Pool size must be at least one.
    #[error("worker count must be greater than 0")]
    InvalidWorkerCount,
    /// Polling intervals must be positive.
    #[error("polling interval must be greater than 0")]
    InvalidInterval,
    /// Source timeouts must be positive.
    #[error("source timeout must be greater than 0")]
    InvalidTimeout,
    /// A job with this service name is already registered.
    #[error("service `{0}` is already registered")]
    DuplicateService(String),
    /// The service name is not in the catalog.
    #[error("unknown service `{0}`")]
    UnknownService(String),
    /// The output format name is not supported.
    #[error("unknown output format `{0}` (expected json or csv)")]
    UnknownFormat(String),
    /// No services were selected.
    #[error("at least one service must be selected")]
    NoServices,
    /// A selected service needs an API key that is not set.
    #[error("service `{service}` requires environment variable `{var}`")]
    MissingCredential {
        /// Service that needs the key.
        service: String,
        /// Environment variable holding the key.
        var: String,
    },
    /// Jobs can only be registered before the scheduler starts.
    #[error("scheduler already started")]
    AlreadyStarted,
    /// Any other invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors produced by the scheduler control surface.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// `start` was called more than once, or after shutdown.
    #[error("scheduler already started or stopped")]
    AlreadyStarted,
    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
