//! Worker planning and byte-range partitioning.
//!
//! Decides how many concurrent range fetchers a download gets and carves
//! the object into the contiguous inclusive ranges they will fetch.

use super::config::DownloadConfig;

/// An inclusive pair of byte offsets within a remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte of the range.
    pub start: u64,
    /// Last byte of the range (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Create a range. `end` must be >= `start`.
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// Number of bytes the range spans.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// The set of ranges a download will fetch concurrently.
///
/// May hold fewer ranges than the planned worker count when the object is
/// not evenly divisible; an empty plan means a zero-byte object.
#[derive(Debug, Clone)]
pub struct WorkerPlan {
    /// Ranges in ascending offset order, one per worker.
    pub ranges: Vec<ByteRange>,
}

impl WorkerPlan {
    /// Plan a download of `total_bytes` using the given tuning values.
    pub fn for_size(total_bytes: u64, config: &DownloadConfig) -> Self {
        let workers = plan_workers(
            total_bytes,
            config.min_bytes_per_part,
            config.max_parallel_parts,
        );
        Self {
            ranges: build_ranges(total_bytes, workers),
        }
    }

    /// Number of workers the plan will spawn.
    pub fn worker_count(&self) -> usize {
        self.ranges.len()
    }
}

/// Decide how many range fetchers to run for an object of `total_bytes`.
///
/// Small objects get one worker (connection setup would dominate tiny
/// ranges); large objects are capped at `max_parallel` connections.
pub fn plan_workers(total_bytes: u64, min_bytes_per_part: u64, max_parallel: usize) -> usize {
    let per_size = total_bytes.div_ceil(min_bytes_per_part.max(1)) as usize;
    per_size.clamp(1, max_parallel.max(1))
}

/// Partition `[0, total_bytes)` into contiguous inclusive ranges.
///
/// Uses ceiling division for the part size, so the final range absorbs the
/// remainder. When `total_bytes` is not evenly divisible the last start may
/// land past the end of the object; emission stops there, which is why the
/// result can be shorter than `worker_count`.
pub fn build_ranges(total_bytes: u64, worker_count: usize) -> Vec<ByteRange> {
    if total_bytes == 0 {
        return Vec::new();
    }

    let worker_count = worker_count.max(1) as u64;
    let part_size = total_bytes.div_ceil(worker_count);

    let mut ranges = Vec::with_capacity(worker_count as usize);
    for i in 0..worker_count {
        let start = i * part_size;
        if start >= total_bytes {
            break;
        }
        let end = (start + part_size).min(total_bytes) - 1;
        ranges.push(ByteRange::new(start, end));
    }

    ranges
}
