//! Command-line entry point: poll the selected services for a fixed number of
//! cycles and write every response to `./result/output.<format>`.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use api_poller::builders::{build_run, http_source_factory};
use api_poller::config::{Credentials, PollerConfig};
use api_poller::core::AppResult;
use api_poller::infra::source::ServiceKind;
use api_poller::render::OutputFormat;
use api_poller::runtime::run_for;
use api_poller::util::init_tracing;

/// Poll public APIs on a bounded worker pool and save the responses.
///
/// Example: `api-poller 5 10 NYTimes,CatFacts json`
#[derive(Parser, Debug)]
#[command(name = "api-poller", version, about)]
struct CliArgs {
    /// Maximum number of worker threads
    #[arg(required_unless_present = "config")]
    threads: Option<usize>,

    /// Seconds between the end of one call to a service and the next
    #[arg(required_unless_present = "config")]
    interval: Option<u64>,

    /// Comma-separated services: NYTimes, CatFacts, Weather
    #[arg(required_unless_present = "config")]
    services: Option<String>,

    /// Output format: json or csv
    #[arg(required_unless_present = "config")]
    format: Option<String>,

    /// Number of intervals to run before shutting down
    #[arg(long, env = "POLLER_CYCLES")]
    cycles: Option<u32>,

    /// Seconds to wait for in-flight calls at shutdown
    #[arg(long)]
    grace_secs: Option<u64>,

    /// Upper bound on a single call, in seconds
    #[arg(long)]
    source_timeout_secs: Option<u64>,

    /// Directory for the output file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file; replaces the positional arguments
    #[arg(long, conflicts_with_all = ["threads", "interval", "services", "format"])]
    config: Option<PathBuf>,
}

impl CliArgs {
    fn into_config(self) -> AppResult<PollerConfig> {
        let mut cfg = match self.config {
            Some(path) => PollerConfig::from_json_file(&path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => {
                let format: OutputFormat = self
                    .format
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .context("invalid output format")?;
                PollerConfig::new(
                    self.threads.unwrap_or_default(),
                    self.interval.unwrap_or_default(),
                    split_services(self.services.as_deref().unwrap_or_default()),
                    format,
                )
            }
        };

        if let Some(cycles) = self.cycles {
            cfg.cycles = cycles;
        }
        if let Some(grace) = self.grace_secs {
            cfg.shutdown_grace_secs = grace;
        }
        if let Some(timeout) = self.source_timeout_secs {
            cfg.source_timeout_secs = timeout;
        }
        if let Some(dir) = self.output_dir {
            cfg.output_dir = dir;
        }

        cfg.validate().with_context(|| {
            format!("invalid configuration (known services: {})", ServiceKind::catalog())
        })?;
        Ok(cfg)
    }
}

fn split_services(list: &str) -> Vec<String> {
    list.split(',').map(|s| s.trim().to_owned()).collect()
}

fn run(cfg: &PollerConfig) -> AppResult<()> {
    let scheduler = build_run(cfg, http_source_factory(Credentials::from_env()))?;

    run_for(&scheduler, cfg.run_duration(), cfg.shutdown_grace())
        .context("failed to start scheduler")?;
    Ok(())
}

fn main() -> AppResult<()> {
    init_tracing();

    let cfg = CliArgs::parse().into_config()?;
    info!(
        threads = cfg.worker_count,
        interval_secs = cfg.interval_secs,
        cycles = cfg.cycles,
        format = %cfg.format,
        "Starting poller"
    );

    if let Err(e) = run(&cfg) {
        error!(error = %format!("{e:#}"), "Poller failed");
        return Err(e);
    }
    Ok(())
}
