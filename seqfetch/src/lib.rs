//! SeqFetch - deliverable downloads for sequencing pipelines
//!
//! This library provides the download engine used by the `seqfetch` CLI to
//! pull result deliverables (alignments, variant calls, reports) from the
//! sequencing platform: parallel ranged fetching for large objects, a
//! single-connection path for small ones, and atomic finalization so a
//! half-written file is never observed at the destination path.

pub mod download;
