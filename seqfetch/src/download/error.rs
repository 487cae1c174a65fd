//! Error types for the download engine.

use std::io;
use std::path::PathBuf;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that can occur while downloading a deliverable.
#[derive(Debug)]
pub enum DownloadError {
    /// Object size could not be determined from response headers.
    MalformedHeader { url: String, reason: String },

    /// Server answered with a non-success status code.
    Http { url: String, status: u16 },

    /// Request could not be sent or the connection dropped.
    Transport { url: String, reason: String },

    /// Request exceeded the configured timeout.
    Timeout { url: String, timeout_secs: u64 },

    /// A range fetch delivered fewer (or more) bytes than its span.
    IncompleteRange {
        start: u64,
        end: u64,
        expected: u64,
        received: u64,
    },

    /// Checksum of the downloaded file does not match the expected digest.
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Failed to read a local file.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write or create a local file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Download was cancelled by the operator.
    Interrupted,

    /// A worker thread panicked before reporting a result.
    WorkerPanic,
}

impl DownloadError {
    /// Whether the retry policy may re-attempt the failed request.
    ///
    /// HTTP 403 is excluded: signed deliverable URLs expire, and retrying
    /// the same stale URL cannot succeed. The caller must refresh the URL
    /// and restart the download.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status != 403,
            Self::Transport { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedHeader { url, reason } => {
                write!(f, "cannot determine object size for {}: {}", url, reason)
            }
            Self::Http { url, status } => {
                write!(f, "request to {} failed with status {}", url, status)
            }
            Self::Transport { url, reason } => {
                write!(f, "request to {} failed: {}", url, reason)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::IncompleteRange {
                start,
                end,
                expected,
                received,
            } => {
                write!(
                    f,
                    "range {}-{} delivered {} of {} expected bytes",
                    start, end, received, expected
                )
            }
            Self::ChecksumMismatch {
                path,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "checksum mismatch for {}: expected {}, got {}",
                    path.display(),
                    expected,
                    actual
                )
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::Interrupted => write!(f, "download interrupted"),
            Self::WorkerPanic => write!(f, "download worker thread panicked"),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
