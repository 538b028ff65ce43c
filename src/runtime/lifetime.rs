//! Run lifetime control, kept outside the scheduler.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::core::{Scheduler, SchedulerError, SchedulerStats};

/// Start `scheduler`, let it run for `duration`, then shut it down with `grace`.
///
/// Returns the statistics after shutdown.
///
/// # Errors
///
/// Returns the error from [`Scheduler::start`]; nothing runs in that case.
pub fn run_for(
    scheduler: &Scheduler,
    duration: Duration,
    grace: Duration,
) -> Result<SchedulerStats, SchedulerError> {
    scheduler.start()?;
    info!(
        run_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        "Application will shut down after the run duration"
    );

    thread::sleep(duration);

    info!("Shutdown timer elapsed, shutting down");
    scheduler.shutdown(grace);

    let stats = scheduler.stats();
    info!(
        written = stats.written_cycles,
        empty = stats.empty_cycles,
        failed = stats.failed_cycles,
        abandoned = stats.abandoned_workers,
        "Run finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::core::{Job, SchedulerState, Sink, Source, SourceError};
    use crate::infra::MemorySink;
    use crate::render::{OutputFormat, Renderer};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fact;

    #[async_trait]
    impl Source for Fact {
        fn service_name(&self) -> &str {
            "CatFacts"
        }

        async fn fetch(&self) -> Result<Option<String>, SourceError> {
            Ok(Some(r#"{"fact":"Cats purr"}"#.into()))
        }
    }

    #[test]
    fn test_run_for_stops_after_duration() {
        let sink = Arc::new(MemorySink::new(Renderer::with_default_layouts(OutputFormat::Csv)));
        let scheduler = Scheduler::new(SchedulerConfig::new()).unwrap();
        scheduler
            .register(
                Job::new(
                    Arc::new(Fact),
                    Arc::clone(&sink) as Arc<dyn Sink>,
                    Duration::from_millis(20),
                )
                .unwrap(),
            )
            .unwrap();

        let stats = run_for(&scheduler, Duration::from_millis(150), Duration::from_secs(1)).unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(stats.written_cycles >= 2);
        assert_eq!(stats.in_rotation, 0);
        assert_eq!(sink.count_for("CatFacts") as u64, stats.written_cycles);
    }

    #[test]
    fn test_run_for_rejects_started_scheduler() {
        let scheduler = Scheduler::new(SchedulerConfig::new()).unwrap();
        scheduler.shutdown(Duration::ZERO);
        assert!(matches!(
            run_for(&scheduler, Duration::ZERO, Duration::ZERO),
            Err(SchedulerError::AlreadyStarted)
        ));
    }
}
