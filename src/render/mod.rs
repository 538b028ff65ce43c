//! Serialization engine: turns a service payload into output bytes.
//!
//! Rendering is a pure function of `(format, service name, payload)`. The
//! only side effect downstream is the sink's append.

pub mod csv;
pub mod json;
pub mod layout;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{ConfigError, RenderError};

pub use layout::NestedListLayout;

/// Output format, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Indented JSON, one document per payload.
    #[serde(alias = "json")]
    PrettyJson,
    /// Comma-separated rows with a header per payload.
    Csv,
}

impl OutputFormat {
    /// File extension for this format, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::PrettyJson => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrettyJson => f.write_str("pretty-json"),
            Self::Csv => f.write_str("csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "pretty-json" => Ok(Self::PrettyJson),
            "csv" => Ok(Self::Csv),
            _ => Err(ConfigError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Format-bound renderer with the nested-list layouts of the run.
#[derive(Debug, Clone)]
pub struct Renderer {
    format: OutputFormat,
    layouts: Arc<[NestedListLayout]>,
}

impl Renderer {
    /// Renderer for `format` using `layouts` for service-specific CSV shapes.
    #[must_use]
    pub fn new(format: OutputFormat, layouts: Vec<NestedListLayout>) -> Self {
        Self {
            format,
            layouts: layouts.into(),
        }
    }

    /// Renderer for `format` with the built-in layouts.
    #[must_use]
    pub fn with_default_layouts(format: OutputFormat) -> Self {
        Self::new(format, NestedListLayout::defaults())
    }

    /// Output format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render one payload.
    ///
    /// # Errors
    ///
    /// - `RenderError::MalformedPayload` if the payload is not JSON
    /// - `RenderError::UnsupportedShape` if CSV rows cannot be inferred
    pub fn render(&self, service_name: &str, payload: &str) -> Result<Vec<u8>, RenderError> {
        match self.format {
            OutputFormat::PrettyJson => json::render(payload),
            OutputFormat::Csv => csv::render(&self.layouts, service_name, payload),
        }
    }
}

/// Render one payload with the built-in layouts.
///
/// # Errors
///
/// See [`Renderer::render`].
pub fn render(
    format: OutputFormat,
    service_name: &str,
    payload: &str,
) -> Result<Vec<u8>, RenderError> {
    Renderer::with_default_layouts(format).render(service_name, payload)
}
