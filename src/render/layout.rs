//! Service-specific CSV layouts for payloads that wrap their records in a list field.

use serde::{Deserialize, Serialize};

/// Whitelisted columns for a service whose payload nests records under a list field.
///
/// The header is always `columns`, never inferred from the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedListLayout {
    /// Service the layout applies to, matched exactly.
    pub service: String,
    /// Top-level field holding the record list.
    pub list_field: String,
    /// Columns to emit, in order.
    pub columns: Vec<String>,
}

impl NestedListLayout {
    /// NYTimes most-viewed articles: `results` holding article records.
    #[must_use]
    pub fn nytimes() -> Self {
        Self {
            service: "NYTimes".into(),
            list_field: "results".into(),
            columns: ["title", "abstract", "url", "published_date", "byline", "section"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// Built-in layouts.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![Self::nytimes()]
    }
}
