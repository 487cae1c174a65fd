//! HTTP transport abstraction for testability.
//!
//! The engine talks to the platform through the `Transport` trait so that
//! tests can substitute a mock serving ranges from an in-memory payload.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use super::error::{DownloadError, DownloadResult};
use super::plan::ByteRange;

/// The slice of an HTTP response the download engine consumes.
///
/// Deliverable URLs are pre-signed, so no authentication state travels with
/// the response; status and the two size-bearing headers are all the engine
/// reads before streaming the body.
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `content-length` header, if present and numeric.
    pub content_length: Option<u64>,
    /// Raw value of the `content-range` header, if present.
    pub content_range: Option<String>,
    /// Streaming response body.
    pub body: Box<dyn Read + Send>,
}

impl RemoteResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for issuing GET requests against deliverable URLs.
///
/// `range` of `None` requests the whole object; `Some(range)` adds a
/// `Range: bytes=<start>-<end>` header.
pub trait Transport: Send + Sync {
    /// Perform a (possibly ranged) GET and return the streaming response.
    fn get(&self, url: &str, range: Option<ByteRange>) -> DownloadResult<RemoteResponse>;
}

/// Real transport backed by a blocking reqwest client.
///
/// Redirects are disabled: deliverable URLs are pre-signed and a redirect
/// would strip the signature query parameters.
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the given connect/read timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self { client, timeout }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, range: Option<ByteRange>) -> DownloadResult<RemoteResponse> {
        let mut request = self.client.get(url);
        if let Some(range) = range {
            request = request.header("Range", format!("bytes={}-{}", range.start, range.end));
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                DownloadError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                DownloadError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Ok(RemoteResponse {
            status,
            content_length,
            content_range,
            body: Box::new(response),
        })
    }
}
