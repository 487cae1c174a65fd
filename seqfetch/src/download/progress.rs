//! Shared progress and cancellation state for one download.
//!
//! All range fetchers for a download share one byte counter and one
//! cancellation flag. The counter is the only shared mutable in-memory
//! state in the engine; atomics keep both lock-free.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Sink for progress updates driving a single external indicator.
///
/// The CLI implements this with a terminal progress bar; library callers
/// that want silence use [`NullSink`].
pub trait ProgressSink: Send + Sync {
    /// Called once before any bytes are fetched.
    fn start(&self, total_bytes: u64);
    /// Called with the running total after each chunk lands.
    fn update(&self, bytes_completed: u64);
    /// Called once after the destination file is finalized.
    fn finish(&self);
}

/// A sink that discards all updates.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn start(&self, _total_bytes: u64) {}
    fn update(&self, _bytes_completed: u64) {}
    fn finish(&self) {}
}

/// Monotonically increasing byte counter shared by concurrent fetchers.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    bytes_completed: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker starting at zero bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` bytes and return the total after the addition.
    ///
    /// Concurrent increments never lose an update; each caller sees the
    /// total as of its own addition.
    pub fn increment(&self, amount: u64) -> u64 {
        self.bytes_completed.fetch_add(amount, Ordering::SeqCst) + amount
    }

    /// Current total.
    pub fn total(&self) -> u64 {
        self.bytes_completed.load(Ordering::SeqCst)
    }
}

/// Cooperative cancellation flag checked at chunk boundaries.
///
/// Setting the flag never tears down an in-flight network read; it only
/// stops further writes and increments once a fetcher observes it.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that all fetchers stop at their next chunk boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
