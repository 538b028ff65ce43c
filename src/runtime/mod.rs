//! Process lifetime control around the scheduler.

pub mod lifetime;

pub use lifetime::run_for;
