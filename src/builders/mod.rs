//! Builders to construct the scheduler and its sink from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{
    build_file_sink, build_run, build_scheduler, http_source_factory, resolve_sources,
};
