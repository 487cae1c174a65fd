//! SHA-256 verification of downloaded deliverables.
//!
//! The platform publishes a digest next to each deliverable; when the
//! caller passes one along, the finished temp file is verified before it
//! is renamed over the destination.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::{DownloadError, DownloadResult};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the lowercase hex SHA-256 digest of a file.
pub fn file_sha256(path: &Path) -> DownloadResult<String> {
    let mut file = File::open(path).map_err(|e| DownloadError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buffer).map_err(|e| DownloadError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify a file against an expected lowercase hex SHA-256 digest.
pub fn verify_sha256(path: &Path, expected: &str) -> DownloadResult<()> {
    let actual = file_sha256(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(DownloadError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_ascii_lowercase(),
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn write_fixture(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_file_sha256_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "hello.txt", b"hello world");

        assert_eq!(file_sha256(&path).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn test_verify_accepts_uppercase_digest() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "hello.txt", b"hello world");

        assert!(verify_sha256(&path, &HELLO_SHA256.to_ascii_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_mismatch_carries_both_digests() {
        let dir = TempDir::new().unwrap();
        let path = write_fixture(&dir, "hello.txt", b"hello world");

        match verify_sha256(&path, "0000") {
            Err(DownloadError::ChecksumMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, "0000");
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("expected ChecksumMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = file_sha256(Path::new("/nonexistent/deliverable.bam")).unwrap_err();
        assert!(matches!(err, DownloadError::ReadFailed { .. }));
    }
}
