//! Builders to construct a registered scheduler and its output sink from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{Credentials, PollerConfig};
use crate::core::{AppResult, ConfigError, Job, Scheduler, Sink, Source};
use crate::infra::sink::FileSink;
use crate::infra::source::ServiceKind;

/// Resolve one source per configured service, in configuration order.
///
/// Nothing touches the filesystem here, so a missing credential or an
/// unknown service is reported before any output is replaced.
///
/// # Errors
///
/// Returns the first configuration error: validation or source construction.
pub fn resolve_sources<FS>(
    cfg: &PollerConfig,
    mut source_factory: FS,
) -> Result<Vec<Arc<dyn Source>>, ConfigError>
where
    FS: FnMut(ServiceKind, &PollerConfig) -> Result<Arc<dyn Source>, ConfigError>,
{
    cfg.validate()?;
    cfg.service_kinds()?
        .into_iter()
        .map(|kind| source_factory(kind, cfg))
        .collect()
}

/// Build an idle scheduler with one job per source, all bound to `sink`.
///
/// # Errors
///
/// Returns the first configuration error: validation or registration.
pub fn build_scheduler(
    cfg: &PollerConfig,
    sources: Vec<Arc<dyn Source>>,
    sink: Arc<dyn Sink>,
) -> Result<Scheduler, ConfigError> {
    cfg.validate()?;

    let scheduler = Scheduler::new(cfg.scheduler_config())?;
    for source in sources {
        let job = Job::new(source, Arc::clone(&sink), cfg.interval())?;
        scheduler.register(job)?;
    }

    info!(
        services = %scheduler.services().join(","),
        worker_count = cfg.worker_count,
        interval_secs = cfg.interval_secs,
        format = %cfg.format,
        "Scheduler built"
    );
    Ok(scheduler)
}

/// Build everything a run needs: sources first, then the output file, then
/// the scheduler.
///
/// The previous output file is only replaced once every source resolved.
///
/// # Errors
///
/// Returns the configuration error, or the I/O error from creating the file.
pub fn build_run<FS>(cfg: &PollerConfig, source_factory: FS) -> AppResult<Scheduler>
where
    FS: FnMut(ServiceKind, &PollerConfig) -> Result<Arc<dyn Source>, ConfigError>,
{
    let sources = resolve_sources(cfg, source_factory).context("failed to set up services")?;

    let sink = build_file_sink(cfg)
        .with_context(|| format!("failed to create {}", cfg.output_path().display()))?;
    info!(path = %sink.path().display(), "Writing output");

    let scheduler = build_scheduler(cfg, sources, Arc::new(sink))?;
    Ok(scheduler)
}

/// Create the run's output file, replacing any previous one.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be created.
pub fn build_file_sink(cfg: &PollerConfig) -> std::io::Result<FileSink> {
    FileSink::create(cfg.output_path(), cfg.renderer())
}

/// Source factory producing the built-in HTTP sources.
pub fn http_source_factory(
    credentials: Credentials,
) -> impl FnMut(ServiceKind, &PollerConfig) -> Result<Arc<dyn Source>, ConfigError> {
    move |kind, cfg| {
        let source = kind.build_source(&cfg.endpoints, &credentials, cfg.source_timeout())?;
        Ok(Arc::new(source) as Arc<dyn Source>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SchedulerState, SourceError};
    use crate::infra::sink::MemorySink;
    use crate::render::{OutputFormat, Renderer};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Source for Named {
        fn service_name(&self) -> &str {
            self.0
        }

        async fn fetch(&self) -> Result<Option<String>, SourceError> {
            Ok(None)
        }
    }

    fn memory_sink() -> Arc<dyn Sink> {
        Arc::new(MemorySink::new(Renderer::with_default_layouts(OutputFormat::Csv)))
    }

    fn named(kind: ServiceKind, _cfg: &PollerConfig) -> Result<Arc<dyn Source>, ConfigError> {
        Ok(Arc::new(Named(kind.name())) as Arc<dyn Source>)
    }

    #[test]
    fn test_build_registers_every_service() {
        let cfg = PollerConfig::new(
            2,
            1,
            vec!["CatFacts".into(), "NYTimes".into()],
            OutputFormat::Csv,
        );
        let sources = resolve_sources(&cfg, named).unwrap();
        let scheduler = build_scheduler(&cfg, sources, memory_sink()).unwrap();

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.services(), vec!["CatFacts".to_string(), "NYTimes".to_string()]);
        assert_eq!(scheduler.stats().registered, 2);
        assert_eq!(scheduler.config().worker_count, 2);
    }

    #[test]
    fn test_build_fails_on_invalid_config() {
        let cfg = PollerConfig::new(0, 1, vec!["CatFacts".into()], OutputFormat::Csv);
        assert!(matches!(
            resolve_sources(&cfg, named),
            Err(ConfigError::InvalidWorkerCount)
        ));
        assert!(matches!(
            build_scheduler(&cfg, Vec::new(), memory_sink()),
            Err(ConfigError::InvalidWorkerCount)
        ));
    }

    #[test]
    fn test_resolve_propagates_factory_errors() {
        let cfg = PollerConfig::new(1, 1, vec!["Weather".into()], OutputFormat::Csv);
        let result = resolve_sources(&cfg, http_source_factory(Credentials::default()));
        assert!(matches!(result, Err(ConfigError::MissingCredential { .. })));
    }

    #[test]
    fn test_missing_credential_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PollerConfig::new(1, 1, vec!["NYTimes".into()], OutputFormat::PrettyJson);
        cfg.output_dir = dir.path().to_path_buf();
        std::fs::write(cfg.output_path(), "{\"prev\":1}\n").unwrap();

        let err = build_run(&cfg, http_source_factory(Credentials::default())).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingCredential { .. })
        ));
        assert_eq!(
            std::fs::read_to_string(cfg.output_path()).unwrap(),
            "{\"prev\":1}\n"
        );
    }

    #[test]
    fn test_build_run_replaces_output_once_sources_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PollerConfig::new(1, 1, vec!["CatFacts".into()], OutputFormat::Csv);
        cfg.output_dir = dir.path().join("result");
        std::fs::create_dir_all(&cfg.output_dir).unwrap();
        std::fs::write(cfg.output_path(), "old,rows\n").unwrap();

        let scheduler = build_run(&cfg, named).unwrap();

        assert_eq!(scheduler.services(), vec!["CatFacts".to_string()]);
        assert_eq!(std::fs::read_to_string(cfg.output_path()).unwrap(), "");
    }

    #[test]
    fn test_file_sink_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PollerConfig::new(1, 1, vec!["CatFacts".into()], OutputFormat::PrettyJson);
        cfg.output_dir = dir.path().join("result");

        let sink = build_file_sink(&cfg).unwrap();
        assert_eq!(sink.path(), dir.path().join("result").join("output.json"));
    }
}
