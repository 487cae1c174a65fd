//! The `download` subcommand: fetch one deliverable by pre-signed URL.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use seqfetch::download::{
    CancelFlag, DownloadConfig, DownloadOptions, DownloadOutcome, FileDownloader, HttpTransport,
    ProgressSink,
};
use tracing::warn;

use crate::error::CliError;
use crate::progress::TerminalSink;

/// Arguments for `seqfetch download`.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Pre-signed deliverable URL
    pub url: String,

    /// Destination file path
    pub output: PathBuf,

    /// Re-download even if the destination already has the expected size
    #[arg(long)]
    pub force: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Expected SHA-256 digest of the deliverable (64 hex characters)
    #[arg(long, value_name = "DIGEST")]
    pub sha256: Option<String>,

    /// Maximum parallel connections for one download
    #[arg(long, value_name = "N")]
    pub max_parts: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Run the download subcommand.
pub fn run(args: DownloadArgs) -> Result<(), CliError> {
    let expected_sha256 = args.sha256.map(|d| validate_sha256(&d)).transpose()?;

    let mut config = DownloadConfig::default();
    if let Some(parts) = args.max_parts {
        config = config.with_max_parallel_parts(parts);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let cancel = Arc::new(CancelFlag::new());
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            warn!(error = %e, "could not install interrupt handler");
        }
    }

    let transport = Arc::new(HttpTransport::new(config.timeout));
    let downloader = FileDownloader::with_config(transport, config);
    let sink: Arc<dyn ProgressSink> = Arc::new(TerminalSink::new());

    let options = DownloadOptions {
        skip_existing: !args.force,
        no_progress: args.no_progress,
        expected_sha256,
    };

    match downloader.download(&args.url, &args.output, &options, sink, cancel)? {
        DownloadOutcome::Completed(path) => {
            println!("Downloaded to {}", path.display());
        }
        DownloadOutcome::SkippedExisting(path) => {
            println!("Already up to date: {}", path.display());
        }
    }

    Ok(())
}

/// Require a 64-character hex digest, normalized to lowercase.
fn validate_sha256(digest: &str) -> Result<String, CliError> {
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CliError::InvalidArgument(format!(
            "--sha256 expects 64 hex characters, got {:?}",
            digest
        )));
    }
    Ok(digest.to_ascii_lowercase())
}
