//! HTTP data sources.

pub mod catalog;
pub mod http;

pub use catalog::ServiceKind;
pub use http::{Endpoint, HttpSource};
