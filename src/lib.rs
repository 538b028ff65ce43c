//! # API Poller
//!
//! Periodically polls a fixed set of data sources on a bounded worker pool and
//! appends every response to a single output file, either as pretty-printed
//! JSON or as CSV rows inferred from the payload's structure.
//!
//! ## Scheduler - Fixed-Delay Polling on OS Threads
//!
//! The `Scheduler` keeps one ready-queue entry per registered `Job` and a fixed
//! number of worker threads. A worker takes a job, fetches from its source,
//! hands the payload to the sink, sleeps for the job's interval, and puts the
//! job back. A job therefore never runs twice at once, and a hung source can
//! hold at most one worker.
//!
//! ```rust,ignore
//! use api_poller::config::SchedulerConfig;
//! use api_poller::core::{Job, Scheduler};
//! use api_poller::infra::FileSink;
//! use api_poller::render::{OutputFormat, Renderer};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sink = Arc::new(FileSink::create(
//!     "./result/output.csv",
//!     Renderer::with_default_layouts(OutputFormat::Csv),
//! )?);
//!
//! let scheduler = Scheduler::new(SchedulerConfig::new().with_worker_count(2))?;
//! scheduler.register(Job::new(my_source, sink, Duration::from_secs(10))?)?;
//! scheduler.start()?;
//! // ...
//! scheduler.shutdown(Duration::from_secs(5));
//! ```
//!
//! ## Rendering - JSON to CSV Without a Schema
//!
//! CSV rows are inferred per payload: a service-specific whitelist for
//! payloads that nest their records in a list field, one header and one row
//! for a single object, or the first element's fields as the columns of an
//! array of objects. See [`render::csv`].
//!
//! For complete examples, see:
//! - `tests/scheduler_test.rs` - Scheduling and shutdown behaviour
//! - `tests/render_test.rs` - Rendering of the supported payload shapes

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: jobs, the scheduler, and errors.
pub mod core;
/// Configuration models for the scheduler, the run, and the services.
pub mod config;
/// Builders to construct the scheduler and sink from configuration.
pub mod builders;
/// Infrastructure adapters for output sinks and HTTP sources.
pub mod infra;
/// Serialization engine: pretty JSON and inferred CSV.
pub mod render;
/// Process lifetime control around the scheduler.
pub mod runtime;
/// Shared utilities.
pub mod util;
