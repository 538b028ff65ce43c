//! Core scheduling abstractions: jobs, the fixed-delay scheduler, and errors.

pub mod error;
pub mod job;
pub mod scheduler;

pub use error::{AppResult, ConfigError, RenderError, SchedulerError, SinkError, SourceError};
pub use job::{Job, Sink, Source};
pub use scheduler::{CycleOutcome, Scheduler, SchedulerState, SchedulerStats};
