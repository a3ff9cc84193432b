//! Transport and download error types

use thiserror::Error;

/// Errors from the HTTP transport layer, passed through opaquely.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("SSL/TLS error: {0}")]
    TlsError(String),
}

/// Errors from streaming a remote file to disk and verifying it.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("downloaded file is corrupted: expected checksum {expected}, got {actual}")]
    CorruptedFile { expected: String, actual: String },

    #[error("download stream failed: {0}")]
    StreamFailed(String),
}
