//! File download with integrity verification

use crate::builder::RequestBuilder;
use crate::transport::Transport;
use futures::StreamExt;
use paygate_canonical::Params;
use paygate_errors::{DownloadError, Error};
use sha1::{Digest, Sha1};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Chunk size for reading the written file back during verification
const CHUNK_SIZE: usize = 64 * 1024;

/// Single-use description of a download: where from, and what the bytes
/// should hash to. An empty `hash_value` skips verification.
#[derive(Debug, Clone)]
pub struct DownloadDescriptor {
    pub download_url: String,
    pub hash_value: Option<String>,
}

/// Streams gateway files to disk and verifies them by re-reading.
pub struct Downloader {
    builder: Arc<RequestBuilder>,
    transport: Arc<dyn Transport>,
}

impl Downloader {
    #[must_use]
    pub fn new(builder: Arc<RequestBuilder>, transport: Arc<dyn Transport>) -> Self {
        Self { builder, transport }
    }

    /// Download a file to `dest` and verify its checksum.
    ///
    /// The download URL is signed as a read-only request like any other
    /// call. The response body is streamed to the destination file; the
    /// checksum is then computed from a second pass over the written file,
    /// not the in-flight stream, so a partial or corrupted write cannot
    /// verify. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns a [`DownloadError::CorruptedFile`] if an expected checksum
    /// is present and does not match (the bad file is deleted first);
    /// signing, transport and I/O errors propagate unchanged. Bytes
    /// already written before a mid-stream failure are left on disk.
    pub async fn download_and_verify(
        &self,
        descriptor: &DownloadDescriptor,
        dest: &Path,
    ) -> Result<u64, Error> {
        let request = self.builder.build_v1(
            &descriptor.download_url,
            "GET",
            None,
            &Params::new(),
            None,
        )?;

        let mut stream = self.transport.stream(&request).await?;

        let mut bytes_written = 0u64;
        {
            let mut file = File::create(dest)
                .await
                .map_err(|e| Error::io_with_path(&e, dest))?;

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                bytes_written += chunk.len() as u64;
            }
            file.flush().await?;
        }

        tracing::debug!(dest = %dest.display(), bytes_written, "download complete");

        let actual = hash_file_sha1(dest).await?;
        if let Some(expected) = descriptor
            .hash_value
            .as_deref()
            .filter(|h| !h.is_empty())
        {
            if !actual.eq_ignore_ascii_case(expected) {
                // a file known to be bad must not be left looking usable
                let _ = tokio::fs::remove_file(dest).await;
                return Err(DownloadError::CorruptedFile {
                    expected: expected.to_lowercase(),
                    actual,
                }
                .into());
            }
            tracing::debug!(dest = %dest.display(), "checksum verified");
        }

        Ok(bytes_written)
    }
}

/// SHA-1 of a file, computed by reading it back from disk.
async fn hash_file_sha1(path: &Path) -> Result<String, Error> {
    let mut file = File::open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;

    let mut hasher = Sha1::new();
    let mut buffer = vec![0; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_file_sha1_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        tokio::fs::write(&path, b"hello gateway").await.unwrap();

        let digest = hash_file_sha1(&path).await.unwrap();
        assert_eq!(digest, "331b143d76c3b8ce62afeb91cd22972fa36cd8ba");
    }

    #[tokio::test]
    async fn test_hash_file_missing() {
        let result = hash_file_sha1(Path::new("/nonexistent/file.bin")).await;
        assert!(result.is_err());
    }
}
