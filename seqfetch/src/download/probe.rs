//! Object size detection from response headers.

use super::error::{DownloadError, DownloadResult};
use super::transport::RemoteResponse;

/// Determine the full object size from a probe response.
///
/// Works for both a plain GET (`content-length` carries the total) and a
/// ranged GET (`content-range: bytes <start>-<end>/<total>` carries it
/// after the slash, while `content-length` only covers the slice).
pub fn object_size(url: &str, response: &RemoteResponse) -> DownloadResult<u64> {
    if let Some(value) = response.content_range.as_deref() {
        return parse_content_range_total(value).ok_or_else(|| DownloadError::MalformedHeader {
            url: url.to_string(),
            reason: format!("unparseable content-range {:?}", value),
        });
    }

    response
        .content_length
        .ok_or_else(|| DownloadError::MalformedHeader {
            url: url.to_string(),
            reason: "neither content-range nor content-length present".to_string(),
        })
}

/// Extract `<total>` from a `bytes <start>-<end>/<total>` header value.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn response(content_length: Option<u64>, content_range: Option<&str>) -> RemoteResponse {
        RemoteResponse {
            status: 200,
            content_length,
            content_range: content_range.map(|s| s.to_string()),
            body: Box::new(Cursor::new(Vec::new())),
        }
    }

    #[test]
    fn test_size_from_content_length() {
        let resp = response(Some(4096), None);
        assert_eq!(object_size("http://x", &resp).unwrap(), 4096);
    }

    #[test]
    fn test_content_range_takes_precedence() {
        // A ranged probe: content-length covers the slice, the total sits
        // after the slash.
        let resp = response(Some(500), Some("bytes 0-499/123456"));
        assert_eq!(object_size("http://x", &resp).unwrap(), 123456);
    }

    #[test]
    fn test_missing_both_headers_is_malformed() {
        let resp = response(None, None);
        let err = object_size("http://x", &resp).unwrap_err();
        assert!(matches!(err, DownloadError::MalformedHeader { .. }));
    }

    #[test]
    fn test_garbled_content_range_is_malformed() {
        for bad in ["bytes 0-499", "bytes 0-499/abc", "nonsense"] {
            let resp = response(None, Some(bad));
            let err = object_size("http://x", &resp).unwrap_err();
            assert!(
                matches!(err, DownloadError::MalformedHeader { .. }),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_wildcard_total_is_malformed() {
        // RFC 7233 allows "bytes 0-499/*" when the total is unknown; the
        // engine cannot pre-size a file from it.
        let resp = response(None, Some("bytes 0-499/*"));
        assert!(object_size("http://x", &resp).is_err());
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("bytes 0-499/1234"), Some(1234));
        assert_eq!(parse_content_range_total("bytes 500-999/1000"), Some(1000));
        assert_eq!(parse_content_range_total("bytes 0-0/1"), Some(1));
        assert_eq!(parse_content_range_total("bytes 0-499/*"), None);
        assert_eq!(parse_content_range_total(""), None);
    }
}
