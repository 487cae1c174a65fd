//! Tuning configuration for the download engine.

use std::time::Duration;

use super::retry::RetryPolicy;

/// Minimum object bytes per concurrent range fetcher (8 MiB).
const DEFAULT_MIN_BYTES_PER_PART: u64 = 8 * 1024 * 1024;

/// Maximum concurrent range fetchers per download.
const DEFAULT_MAX_PARALLEL_PARTS: usize = 8;

/// Read-buffer size while streaming response bodies (3 MiB).
const DEFAULT_CHUNK_SIZE: usize = 3 * 1024 * 1024;

/// Connect/read timeout for every outbound GET.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tuning values for a [`FileDownloader`](super::FileDownloader).
///
/// All values are injected rather than read from process-wide state so the
/// engine can be exercised in tests with small objects and short budgets.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Minimum bytes of object per worker; below this a download stays
    /// single-stream.
    pub min_bytes_per_part: u64,
    /// Upper bound on concurrent range fetchers.
    pub max_parallel_parts: usize,
    /// Read-buffer size while streaming a response body to disk.
    pub chunk_size: usize,
    /// Timeout applied to every GET request.
    pub timeout: Duration,
    /// Retry behavior for failed requests.
    pub retry: RetryPolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            min_bytes_per_part: DEFAULT_MIN_BYTES_PER_PART,
            max_parallel_parts: DEFAULT_MAX_PARALLEL_PARTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl DownloadConfig {
    /// Override the minimum bytes per part.
    pub fn with_min_bytes_per_part(mut self, bytes: u64) -> Self {
        self.min_bytes_per_part = bytes;
        self
    }

    /// Override the maximum number of parallel parts.
    pub fn with_max_parallel_parts(mut self, parts: usize) -> Self {
        self.max_parallel_parts = parts.max(1);
        self
    }

    /// Override the streaming chunk size.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
