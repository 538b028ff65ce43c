//! Run configuration: what to poll, how often, and where output goes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;
use crate::infra::source::ServiceKind;
use crate::render::{NestedListLayout, OutputFormat, Renderer};

use super::{EndpointConfig, SchedulerConfig};

fn default_source_timeout_secs() -> u64 {
    10
}

fn default_cycles() -> u32 {
    5
}

fn default_grace_secs() -> u64 {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./result")
}

fn default_output_stem() -> String {
    "output".into()
}

/// Root configuration of a polling run. Built once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Worker thread count.
    pub worker_count: usize,
    /// Fixed delay between executions of one job, in seconds.
    pub interval_secs: u64,
    /// Services to poll, by catalog name.
    pub services: Vec<String>,
    /// Output format.
    pub format: OutputFormat,
    /// Upper bound on one fetch, in seconds.
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    /// Number of intervals to run before shutting down.
    #[serde(default = "default_cycles")]
    pub cycles: u32,
    /// How long shutdown waits for in-flight executions, in seconds.
    #[serde(default = "default_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Directory for the output file.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Output file name without extension.
    #[serde(default = "default_output_stem")]
    pub output_stem: String,
    /// Service-specific CSV layouts.
    #[serde(default = "NestedListLayout::defaults")]
    pub layouts: Vec<NestedListLayout>,
    /// Endpoints of the built-in services.
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

impl PollerConfig {
    /// Configuration with defaults for everything but the four required values.
    #[must_use]
    pub fn new(
        worker_count: usize,
        interval_secs: u64,
        services: Vec<String>,
        format: OutputFormat,
    ) -> Self {
        Self {
            worker_count,
            interval_secs,
            services,
            format,
            source_timeout_secs: default_source_timeout_secs(),
            cycles: default_cycles(),
            shutdown_grace_secs: default_grace_secs(),
            output_dir: default_output_dir(),
            output_stem: default_output_stem(),
            layouts: NestedListLayout::defaults(),
            endpoints: EndpointConfig::default(),
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found: zero pool size, zero interval or
    /// timeout, no services, unknown or duplicate services, an empty output stem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler_config().validate()?;
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        self.service_kinds()?;
        if self.output_stem.trim().is_empty() {
            return Err(ConfigError::Invalid("output_stem must not be empty".into()));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` on parse errors, or the validation error.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Invalid(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the file cannot be read, or any error
    /// from [`PollerConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&input)
    }

    /// Resolve service names against the catalog, rejecting unknowns and duplicates.
    ///
    /// # Errors
    ///
    /// `ConfigError::NoServices`, `ConfigError::UnknownService`, or
    /// `ConfigError::DuplicateService`.
    pub fn service_kinds(&self) -> Result<Vec<ServiceKind>, ConfigError> {
        if self.services.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::NoServices);
        }
        let mut seen = HashSet::new();
        let mut kinds = Vec::with_capacity(self.services.len());
        for name in self.services.iter().filter(|s| !s.trim().is_empty()) {
            let kind: ServiceKind = name.parse()?;
            if !seen.insert(kind) {
                return Err(ConfigError::DuplicateService(kind.name().to_owned()));
            }
            kinds.push(kind);
        }
        Ok(kinds)
    }

    /// Scheduler settings derived from this configuration.
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new()
            .with_worker_count(self.worker_count)
            .with_source_timeout(self.source_timeout())
    }

    /// Renderer for the configured format and layouts.
    #[must_use]
    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.format, self.layouts.clone())
    }

    /// Fixed delay between executions of one job.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Upper bound on one fetch.
    #[must_use]
    pub const fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    /// Shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Total run duration: `interval × cycles`.
    #[must_use]
    pub fn run_duration(&self) -> Duration {
        self.interval().saturating_mul(self.cycles)
    }

    /// Full output path, `<output_dir>/<output_stem>.<ext>`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_stem, self.format.extension()))
    }
}
