//! Media download layer
//!
//! Defines the [`DownloadProvider`] seam the link handler talks to, the error
//! taxonomy it reports, and [`DownloadedFile`], the guard that owns a
//! downloaded artifact until the request is finished.

pub mod ytdlp;

pub use ytdlp::YtdlpProvider;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Container the provider merges separate streams into
pub const MERGED_EXTENSION: &str = "mp4";

/// Errors reported by a [`DownloadProvider`]
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The extractor rejected the link: private account, removed content, unsupported URL
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    /// Anything else: missing executable, usage error, killed process, malformed output
    #[error("unexpected download failure: {0}")]
    Unexpected(String),
}

/// Fetches the media behind a URL into a local file.
///
/// Implementations block the calling thread until the file is on disk, so
/// callers on the async runtime must go through `spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait DownloadProvider: Send + Sync {
    /// Download `url` and return the path the provider declared for the output.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ExtractionFailed`] when the extractor refuses the
    /// link and [`DownloadError::Unexpected`] for every other failure.
    fn download(&self, url: &str) -> Result<PathBuf, DownloadError>;
}

/// Resolve the file actually written for a declared output path.
///
/// When streams get merged the container changes, so a declared
/// `abc.webm` ends up on disk as `abc.mp4`. The fallback is not checked
/// for existence here; reading its size later will fail if it is missing.
#[must_use]
pub fn resolve_output_path(declared: &Path) -> PathBuf {
    if declared.exists() {
        declared.to_path_buf()
    } else {
        declared.with_extension(MERGED_EXTENSION)
    }
}

/// Downloaded artifact, removed from disk when dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
}

impl DownloadedFile {
    /// Take ownership of the file at `path`
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Location of the artifact
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size on disk in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'ed (e.g. it was never created).
    pub async fn size(&self) -> std::io::Result<u64> {
        tokio::fs::metadata(&self.path).await.map(|m| m.len())
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        // Blocking unlink on the runtime thread; a single syscall per request
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed downloaded file"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove downloaded file"
            ),
        }
    }
}

/// Size in MiB as shown to users
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
