//! CLI error type.

use seqfetch::download::DownloadError;
use thiserror::Error;

/// Errors surfaced to the terminal with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The download engine failed.
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// A command-line argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
