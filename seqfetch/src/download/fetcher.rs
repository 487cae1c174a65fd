//! Single-range fetch: one ranged GET streamed into a pre-sized temp file.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use super::config::DownloadConfig;
use super::error::{DownloadError, DownloadResult};
use super::plan::ByteRange;
use super::progress::{CancelFlag, ProgressSink, ProgressTracker};
use super::retry::with_retry;
use super::transport::Transport;

/// Fetch one byte range of `url` into its offset within `temp_path`.
///
/// The temp file must already exist at its full length; this opens an
/// independent handle, seeks to the range start, and streams the body in
/// `config.chunk_size` chunks. Each worker owns a disjoint region, so no
/// two handles ever write the same offset.
///
/// Observing the cancellation flag returns `Ok(())` with partial bytes
/// left in place; the orchestrator removes the temp file either way.
pub(crate) fn fetch_range(
    transport: &dyn Transport,
    url: &str,
    range: ByteRange,
    temp_path: &Path,
    tracker: &ProgressTracker,
    sink: &dyn ProgressSink,
    cancel: &CancelFlag,
    config: &DownloadConfig,
) -> DownloadResult<()> {
    let expected = range.len();

    // A worker scheduled after cancellation never issues its request.
    if cancel.is_cancelled() {
        return Ok(());
    }

    // Request establishment is the retryable part; once bytes are flowing
    // a shortfall is an integrity failure, not a transient to re-attempt.
    let mut response = with_retry(&config.retry, cancel, || {
        let response = transport.get(url, Some(range))?;
        if !response.is_success() {
            return Err(DownloadError::Http {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response)
    })?;

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(temp_path)
        .map_err(|e| DownloadError::WriteFailed {
            path: temp_path.to_path_buf(),
            source: e,
        })?;
    file.seek(SeekFrom::Start(range.start))
        .map_err(|e| DownloadError::WriteFailed {
            path: temp_path.to_path_buf(),
            source: e,
        })?;

    let mut buffer = vec![0u8; config.chunk_size];
    let mut received: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!(start = range.start, end = range.end, "range fetch cancelled");
            return Ok(());
        }

        let n = response
            .body
            .read(&mut buffer)
            .map_err(|e| DownloadError::Transport {
                url: url.to_string(),
                reason: format!("read error: {}", e),
            })?;
        if n == 0 {
            break;
        }

        file.write_all(&buffer[..n])
            .map_err(|e| DownloadError::WriteFailed {
                path: temp_path.to_path_buf(),
                source: e,
            })?;

        received += n as u64;
        let completed = tracker.increment(n as u64);
        sink.update(completed);

        // A server ignoring the Range header streams the whole object;
        // stop counting rather than fill the disk before erroring.
        if received > expected {
            break;
        }
    }

    if received != expected {
        return Err(DownloadError::IncompleteRange {
            start: range.start,
            end: range.end,
            expected,
            received,
        });
    }

    debug!(start = range.start, end = range.end, bytes = received, "range complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::progress::NullSink;
    use crate::download::retry::RetryPolicy;
    use crate::download::transport::tests::MockTransport;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn test_config() -> DownloadConfig {
        DownloadConfig::default()
            .with_chunk_size(8)
            .with_retry(RetryPolicy::none())
    }

    fn presized_temp(dir: &TempDir, len: u64) -> std::path::PathBuf {
        let path = dir.path().join("deliverable.bam.part");
        let file = File::create(&path).unwrap();
        file.set_len(len).unwrap();
        path
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_fetch_writes_range_at_offset() {
        let dir = TempDir::new().unwrap();
        let data = payload(100);
        let temp = presized_temp(&dir, 100);
        let transport = MockTransport::new(data.clone());
        let tracker = ProgressTracker::new();

        fetch_range(
            &transport,
            "http://example.com/file",
            ByteRange::new(10, 49),
            &temp,
            &tracker,
            &NullSink,
            &CancelFlag::new(),
            &test_config(),
        )
        .unwrap();

        let written = fs::read(&temp).unwrap();
        assert_eq!(&written[10..50], &data[10..50]);
        assert_eq!(tracker.total(), 40);

        // Bytes outside the range are untouched zeroes.
        assert!(written[..10].iter().all(|&b| b == 0));
        assert!(written[50..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_delivery_is_incomplete_range() {
        let dir = TempDir::new().unwrap();
        let temp = presized_temp(&dir, 100);
        let transport = MockTransport::new(payload(100)).with_truncated_bodies(18);
        let tracker = ProgressTracker::new();

        let err = fetch_range(
            &transport,
            "http://example.com/file",
            ByteRange::new(0, 39),
            &temp,
            &tracker,
            &NullSink,
            &CancelFlag::new(),
            &test_config(),
        )
        .unwrap_err();

        match err {
            DownloadError::IncompleteRange {
                start,
                end,
                expected,
                received,
            } => {
                assert_eq!((start, end), (0, 39));
                assert_eq!(expected, 40);
                assert_eq!(received, 18);
            }
            other => panic!("expected IncompleteRange, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_fetch_returns_clean() {
        let dir = TempDir::new().unwrap();
        let temp = presized_temp(&dir, 100);
        let transport = MockTransport::new(payload(100));
        let tracker = ProgressTracker::new();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = fetch_range(
            &transport,
            "http://example.com/file",
            ByteRange::new(0, 99),
            &temp,
            &tracker,
            &NullSink,
            &cancel,
            &test_config(),
        );

        assert!(result.is_ok());
        assert_eq!(tracker.total(), 0);
    }

    #[test]
    fn test_transient_status_is_retried() {
        let dir = TempDir::new().unwrap();
        let temp = presized_temp(&dir, 64);
        let transport = MockTransport::new(payload(64)).with_status_script(&[503]);
        let tracker = ProgressTracker::new();
        let config = DownloadConfig::default().with_chunk_size(8).with_retry(RetryPolicy {
            initial_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
            max_elapsed: std::time::Duration::from_millis(100),
        });

        fetch_range(
            &transport,
            "http://example.com/file",
            ByteRange::new(0, 63),
            &temp,
            &tracker,
            &NullSink,
            &CancelFlag::new(),
            &config,
        )
        .unwrap();

        assert_eq!(transport.request_count(), 2);
        assert_eq!(tracker.total(), 64);
    }

    #[test]
    fn test_forbidden_surfaces_without_retry() {
        let dir = TempDir::new().unwrap();
        let temp = presized_temp(&dir, 64);
        let transport = MockTransport::new(payload(64)).with_status_script(&[403]);
        let tracker = ProgressTracker::new();
        let config = DownloadConfig::default().with_chunk_size(8);

        let err = fetch_range(
            &transport,
            "http://example.com/file",
            ByteRange::new(0, 63),
            &temp,
            &tracker,
            &NullSink,
            &CancelFlag::new(),
            &config,
        )
        .unwrap_err();

        assert!(matches!(err, DownloadError::Http { status: 403, .. }));
        assert_eq!(transport.request_count(), 1);
    }
}
