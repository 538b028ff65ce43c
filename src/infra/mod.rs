//! Infrastructure adapters: output sinks and HTTP data sources.

pub mod sink;
pub mod source;

pub use sink::{FileSink, MemorySink};
pub use source::{HttpSource, ServiceKind};
