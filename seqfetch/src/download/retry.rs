//! Bounded exponential backoff for failed requests.

use std::time::{Duration, Instant};

use tracing::warn;

use super::error::DownloadResult;
use super::progress::CancelFlag;

/// Retry behavior for transient request failures.
///
/// Delays double from `initial_delay` up to `max_delay`; retries stop once
/// the next sleep would push the total elapsed time past `max_elapsed`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Total time budget across all attempts of one request.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            max_elapsed: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries. Used by tests asserting fail-fast paths.
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }
}

/// Run `op`, retrying retryable failures under `policy`.
///
/// Fatal errors (HTTP 403, malformed headers, integrity failures) surface
/// immediately. The cancellation flag is honored between attempts so an
/// interrupted download does not sit out a backoff sleep.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    cancel: &CancelFlag,
    mut op: impl FnMut() -> DownloadResult<T>,
) -> DownloadResult<T> {
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt = 1u32;

    loop {
        let error = match op() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_retryable() || cancel.is_cancelled() {
            return Err(error);
        }
        if started.elapsed() + delay >= policy.max_elapsed {
            return Err(error);
        }

        warn!(attempt, delay_ms = delay.as_millis() as u64, error = %error, "retrying request");
        std::thread::sleep(delay);

        delay = (delay * 2).min(policy.max_delay);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::error::DownloadError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            max_elapsed: Duration::from_millis(200),
        }
    }

    fn http_error(status: u16) -> DownloadError {
        DownloadError::Http {
            url: "http://example.com/file".to_string(),
            status,
        }
    }

    #[test]
    fn test_success_passes_through() {
        let cancel = CancelFlag::new();
        let result = with_retry(&quick_policy(), &cancel, || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_retries_transient_failure_until_success() {
        let cancel = CancelFlag::new();
        let attempts = AtomicUsize::new(0);

        let result = with_retry(&quick_policy(), &cancel, || {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(http_error(503))
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_forbidden_fails_without_retry() {
        let cancel = CancelFlag::new();
        let attempts = AtomicUsize::new(0);

        let result: DownloadResult<()> = with_retry(&quick_policy(), &cancel, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(http_error(403))
        });

        assert!(matches!(
            result,
            Err(DownloadError::Http { status: 403, .. })
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_elapsed_budget_bounds_attempts() {
        let cancel = CancelFlag::new();
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(30),
            max_delay: Duration::from_millis(30),
            max_elapsed: Duration::from_millis(50),
        };
        let attempts = AtomicUsize::new(0);

        let result: DownloadResult<()> = with_retry(&policy, &cancel, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(http_error(500))
        });

        assert!(result.is_err());
        assert!(attempts.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_cancelled_download_does_not_retry() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let attempts = AtomicUsize::new(0);

        let result: DownloadResult<()> = with_retry(&quick_policy(), &cancel, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(http_error(500))
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_none_policy_never_retries() {
        let cancel = CancelFlag::new();
        let attempts = AtomicUsize::new(0);

        let result: DownloadResult<()> = with_retry(&RetryPolicy::none(), &cancel, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(http_error(500))
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
