//! In-memory sink for development and testing.

use parking_lot::Mutex;

use crate::core::{Sink, SinkError};
use crate::render::Renderer;

/// One rendered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    /// Service that produced the payload.
    pub service: String,
    /// Rendered bytes as appended.
    pub bytes: Vec<u8>,
}

/// Sink that keeps rendered output in memory, in append order.
#[derive(Debug)]
pub struct MemorySink {
    renderer: Renderer,
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all writes so far.
    #[must_use]
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().clone()
    }

    /// All output concatenated, as the equivalent file would hold it.
    #[must_use]
    pub fn contents(&self) -> String {
        let records = self.records.lock();
        records
            .iter()
            .map(|r| String::from_utf8_lossy(&r.bytes))
            .collect()
    }

    /// Number of writes for `service`.
    #[must_use]
    pub fn count_for(&self, service: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.service == service)
            .count()
    }
}

impl Sink for MemorySink {
    fn write(&self, service_name: &str, payload: &str) -> Result<(), SinkError> {
        let bytes = self.renderer.render(service_name, payload)?;
        self.records.lock().push(SinkRecord {
            service: service_name.to_owned(),
            bytes,
        });
        Ok(())
    }
}
