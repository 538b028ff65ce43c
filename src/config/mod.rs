//! Configuration models for the scheduler, the run, and the built-in services.

pub mod endpoints;
pub mod poller;
pub mod scheduler;

pub use endpoints::{Credentials, EndpointConfig, NYTIMES_API_KEY, WEATHERSTACK_API_KEY};
pub use poller::PollerConfig;
pub use scheduler::SchedulerConfig;
