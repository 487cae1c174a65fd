//! Parallel chunked downloads of platform deliverables.
//!
//! This module turns one pre-signed deliverable URL into one finished
//! file on disk, fetching large objects over several concurrent ranged
//! connections:
//! - Object size detection from response headers (`probe`)
//! - Worker planning and byte-range partitioning (`plan`)
//! - Shared progress counter and cooperative cancellation (`progress`)
//! - Bounded exponential backoff for transient failures (`retry`)
//! - Per-range streaming into a pre-sized temp file (`fetcher`)
//! - SHA-256 verification of finished files (`checksum`)
//! - High-level lifecycle coordination (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! FileDownloader (orchestrator)
//!         │
//!         ├── probe ──► object size (content-range / content-length)
//!         ├── plan ───► worker count + inclusive byte ranges
//!         │
//!         ├── single stream ──► reuse probe response   (small objects)
//!         └── parallel ───────► N × fetch_range        (large objects)
//!                 │    each: own file handle, seek to offset,
//!                 │          shared ProgressTracker + CancelFlag
//!                 └── join ──► verify ──► atomic rename
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use seqfetch::download::{
//!     CancelFlag, DownloadOptions, FileDownloader, HttpTransport, NullSink,
//! };
//!
//! let transport = Arc::new(HttpTransport::new(Duration::from_secs(30)));
//! let downloader = FileDownloader::new(transport);
//!
//! let outcome = downloader.download(
//!     "https://deliverables.example.com/sample.bam?sig=...",
//!     Path::new("results/sample.bam"),
//!     &DownloadOptions::default(),
//!     Arc::new(NullSink),
//!     Arc::new(CancelFlag::new()),
//! )?;
//! ```

mod checksum;
mod config;
mod error;
mod fetcher;
mod plan;
mod probe;
mod progress;
mod retry;
mod transport;

mod orchestrator;

pub use checksum::{file_sha256, verify_sha256};
pub use config::DownloadConfig;
pub use error::{DownloadError, DownloadResult};
pub use orchestrator::{DownloadOptions, DownloadOutcome, FileDownloader};
pub use plan::{build_ranges, plan_workers, ByteRange, WorkerPlan};
pub use probe::object_size;
pub use progress::{CancelFlag, NullSink, ProgressSink, ProgressTracker};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, RemoteResponse, Transport};
