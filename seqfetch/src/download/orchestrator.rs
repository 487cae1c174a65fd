//! Top-level download coordination.
//!
//! [`FileDownloader`] owns the full lifecycle of one deliverable: probe
//! the object size, short-circuit on an up-to-date destination, stream
//! small objects over the already-open probe connection, fan parallel
//! range fetchers out over large ones, and finalize with an atomic
//! rename. The temp file is removed on every exit path except success.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

use super::checksum::verify_sha256;
use super::config::DownloadConfig;
use super::error::{DownloadError, DownloadResult};
use super::fetcher::fetch_range;
use super::plan::WorkerPlan;
use super::probe::object_size;
use super::progress::{CancelFlag, NullSink, ProgressSink, ProgressTracker};
use super::retry::with_retry;
use super::transport::{RemoteResponse, Transport};

/// Suffix appended to the destination path while bytes are in flight.
const TEMP_SUFFIX: &str = ".part";

/// Terminal state of one successfully handled download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Bytes were fetched and the destination was (re)written.
    Completed(PathBuf),
    /// Destination already held the full object; nothing was fetched.
    SkippedExisting(PathBuf),
}

impl DownloadOutcome {
    /// The destination path, whichever way it got there.
    pub fn path(&self) -> &Path {
        match self {
            Self::Completed(path) | Self::SkippedExisting(path) => path,
        }
    }
}

/// Caller-supplied policy for one download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Skip the fetch when the destination already has the probed size.
    pub skip_existing: bool,
    /// Suppress progress reporting regardless of the supplied sink.
    pub no_progress: bool,
    /// Verify the finished file against this SHA-256 digest before the
    /// destination is replaced.
    pub expected_sha256: Option<String>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
            no_progress: false,
            expected_sha256: None,
        }
    }
}

/// One deliverable in flight: where it comes from, where it lands, and
/// how big the probe said it is.
struct DownloadTarget {
    url: String,
    final_path: PathBuf,
    temp_path: PathBuf,
    total_bytes: u64,
}

/// Removes the temp file unless the download reached its rename.
///
/// Dropping the guard on any early return, error propagation, or panic
/// keeps half-written `.part` files from surviving a failed download.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Keep the file; called after the rename consumed it.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            fs::remove_file(&self.path).ok();
        }
    }
}

/// Parallel chunked downloader for platform deliverables.
pub struct FileDownloader {
    transport: Arc<dyn Transport>,
    config: DownloadConfig,
}

impl FileDownloader {
    /// Create a downloader with default tuning.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, DownloadConfig::default())
    }

    /// Create a downloader with custom tuning.
    pub fn with_config(transport: Arc<dyn Transport>, config: DownloadConfig) -> Self {
        Self { transport, config }
    }

    /// The active tuning values.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download `url` to `dest`.
    ///
    /// Probes the object size, then either skips (destination already
    /// complete), streams sequentially (objects small enough for one
    /// worker, reusing the probe response so no second request is made),
    /// or fans out range fetchers writing disjoint regions of one
    /// pre-sized temp file. The destination is only ever replaced by an
    /// atomic rename of the fully verified temp file.
    ///
    /// `cancel` is shared with the operator's interrupt handler; once set,
    /// workers stop at their next chunk boundary and the call returns
    /// [`DownloadError::Interrupted`].
    pub fn download(
        &self,
        url: &str,
        dest: &Path,
        options: &DownloadOptions,
        sink: Arc<dyn ProgressSink>,
        cancel: Arc<CancelFlag>,
    ) -> DownloadResult<DownloadOutcome> {
        let sink: Arc<dyn ProgressSink> = if options.no_progress {
            Arc::new(NullSink)
        } else {
            sink
        };

        let probe = with_retry(&self.config.retry, &cancel, || {
            let response = self.transport.get(url, None)?;
            if !response.is_success() {
                return Err(DownloadError::Http {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok(response)
        })?;
        let total = object_size(url, &probe)?;

        if options.skip_existing {
            if let Ok(meta) = fs::metadata(dest) {
                if meta.is_file() && meta.len() == total {
                    info!(path = %dest.display(), bytes = total, "destination up to date, skipping");
                    return Ok(DownloadOutcome::SkippedExisting(dest.to_path_buf()));
                }
            }
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DownloadError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let target = DownloadTarget {
            url: url.to_string(),
            final_path: dest.to_path_buf(),
            temp_path: temp_path_for(dest),
            total_bytes: total,
        };
        let guard = TempFileGuard::new(target.temp_path.clone());

        let plan = WorkerPlan::for_size(target.total_bytes, &self.config);
        sink.start(target.total_bytes);

        if plan.worker_count() <= 1 {
            debug!(url, bytes = target.total_bytes, "single-stream download");
            self.stream_single(&target, probe, sink.as_ref(), &cancel)?;
        } else {
            info!(url, bytes = target.total_bytes, workers = plan.worker_count(), "parallel download");
            drop(probe);
            self.fetch_parallel(&target, &plan, &sink, &cancel)?;
        }

        if cancel.is_cancelled() {
            return Err(DownloadError::Interrupted);
        }

        if let Some(expected) = options.expected_sha256.as_deref() {
            verify_sha256(&target.temp_path, expected)?;
        }

        if target.final_path.exists() {
            fs::remove_file(&target.final_path).map_err(|e| DownloadError::WriteFailed {
                path: target.final_path.clone(),
                source: e,
            })?;
        }
        fs::rename(&target.temp_path, &target.final_path).map_err(|e| {
            DownloadError::WriteFailed {
                path: target.final_path.clone(),
                source: e,
            }
        })?;
        guard.disarm();

        sink.finish();
        info!(path = %target.final_path.display(), bytes = target.total_bytes, "download complete");
        Ok(DownloadOutcome::Completed(target.final_path))
    }

    /// Consume the probe response straight into the temp file.
    ///
    /// Small objects keep exact single-connection semantics; no ranged
    /// request is ever issued for them.
    fn stream_single(
        &self,
        target: &DownloadTarget,
        mut response: RemoteResponse,
        sink: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> DownloadResult<()> {
        let total = target.total_bytes;
        let mut file = File::create(&target.temp_path).map_err(|e| DownloadError::WriteFailed {
            path: target.temp_path.clone(),
            source: e,
        })?;

        let mut buffer = vec![0u8; self.config.chunk_size];
        let mut received: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let n = response
                .body
                .read(&mut buffer)
                .map_err(|e| DownloadError::Transport {
                    url: target.url.clone(),
                    reason: format!("read error: {}", e),
                })?;
            if n == 0 {
                break;
            }

            file.write_all(&buffer[..n])
                .map_err(|e| DownloadError::WriteFailed {
                    path: target.temp_path.clone(),
                    source: e,
                })?;

            received += n as u64;
            sink.update(received);

            if received > total {
                break;
            }
        }

        if received != total {
            return Err(DownloadError::IncompleteRange {
                start: 0,
                end: total.saturating_sub(1),
                expected: total,
                received,
            });
        }
        Ok(())
    }

    /// Fan one fetcher thread out per planned range and join them all.
    ///
    /// A failing worker sets the shared cancel flag so its siblings stop
    /// at their next chunk boundary; every handle is still joined before
    /// the first failure (by range order) surfaces.
    fn fetch_parallel(
        &self,
        target: &DownloadTarget,
        plan: &WorkerPlan,
        sink: &Arc<dyn ProgressSink>,
        cancel: &Arc<CancelFlag>,
    ) -> DownloadResult<()> {
        let file = File::create(&target.temp_path).map_err(|e| DownloadError::WriteFailed {
            path: target.temp_path.clone(),
            source: e,
        })?;
        file.set_len(target.total_bytes)
            .map_err(|e| DownloadError::WriteFailed {
                path: target.temp_path.clone(),
                source: e,
            })?;
        drop(file);

        let tracker = Arc::new(ProgressTracker::new());
        let mut handles = Vec::with_capacity(plan.worker_count());

        for range in plan.ranges.iter().copied() {
            let transport = Arc::clone(&self.transport);
            let url = target.url.clone();
            let temp_path = target.temp_path.clone();
            let tracker = Arc::clone(&tracker);
            let sink = Arc::clone(sink);
            let cancel = Arc::clone(cancel);
            let config = self.config.clone();

            handles.push(thread::spawn(move || {
                let result = fetch_range(
                    transport.as_ref(),
                    &url,
                    range,
                    &temp_path,
                    &tracker,
                    sink.as_ref(),
                    &cancel,
                    &config,
                );
                if result.is_err() {
                    cancel.cancel();
                }
                result
            }));
        }

        let mut first_error = None;
        for handle in handles {
            let result = handle.join().unwrap_or(Err(DownloadError::WorkerPanic));
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Derive the in-flight temp path for a destination.
fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}
