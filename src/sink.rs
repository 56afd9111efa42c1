//! Optional destination for raw response bodies.
//!
//! Useful when debugging a server that sends something unexpected: every
//! successfully decoded JSON body is handed to the configured sink along with
//! the request path.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Receives raw JSON response bodies.
///
/// A failing sink never fails the request; the client logs the error and
/// carries on.
pub trait ResponseSink: Send + Sync {
    /// Records the body returned for `path`.
    fn record(&self, path: &str, body: &[u8]) -> io::Result<()>;
}

/// Writes each body to `<dir>/<prefix>-<unix millis>-<seq>.json`.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
    seq: AtomicU64,
}

impl DirectorySink {
    /// Creates a sink writing into `dir` with the default `teamcity` prefix.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_prefix(dir, "teamcity")
    }

    /// Creates a sink writing into `dir` with a custom file name prefix.
    pub fn with_prefix(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// The directory bodies are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_file(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{}-{}-{}.json", self.prefix, millis, seq))
    }
}

impl ResponseSink for DirectorySink {
    fn record(&self, path: &str, body: &[u8]) -> io::Result<()> {
        let file = self.next_file();
        tracing::debug!(path = %path, file = %file.display(), "Writing response body");
        std::fs::write(file, body)
    }
}
