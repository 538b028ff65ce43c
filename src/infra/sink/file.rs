//! Append-only output file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::core::{Sink, SinkError};
use crate::render::Renderer;

/// Output file owned for the lifetime of a run.
///
/// The file is deleted and recreated once, at construction; every write
/// after that appends. Rendering happens outside the lock and each payload
/// is appended with a single `write_all` under it, so concurrent writers
/// never interleave.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    renderer: Renderer,
    file: Mutex<File>,
}

impl FileSink {
    /// Create the output file at `path`, replacing any existing file and
    /// creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be replaced or opened.
    pub fn create(path: impl Into<PathBuf>, renderer: Renderer) -> io::Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                info!(dir = %parent.display(), "Created output directory");
            }
        }

        match fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "Existing output file deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), format = %renderer.format(), "Output file opened");

        Ok(Self {
            path,
            renderer,
            file: Mutex::new(file),
        })
    }

    /// Create `<dir>/<stem>.<ext>`, the extension following the renderer's format.
    ///
    /// # Errors
    ///
    /// See [`FileSink::create`].
    pub fn in_dir(dir: impl AsRef<Path>, stem: &str, renderer: Renderer) -> io::Result<Self> {
        let path = dir
            .as_ref()
            .join(format!("{stem}.{}", renderer.format().extension()));
        Self::create(path, renderer)
    }

    /// Path of the output file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append already-rendered bytes as one contiguous write.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock();
        file.write_all(bytes)?;
        file.flush()
    }
}

impl Sink for FileSink {
    fn write(&self, service_name: &str, payload: &str) -> Result<(), SinkError> {
        let bytes = self.renderer.render(service_name, payload)?;
        self.append(&bytes)?;
        debug!(service = %service_name, bytes = bytes.len(), "Appended to output file");
        Ok(())
    }
}
