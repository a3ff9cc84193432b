#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the paygate client library
//!
//! This crate provides fine-grained error types organized by domain.
//! A failed signature or a corrupted download must never be treated as
//! success, so every error propagates to the immediate caller without
//! retries or silent recovery.

use thiserror::Error;

pub mod config;
pub mod credential;
pub mod decode;
pub mod network;
pub mod signing;

// Re-export all error types at the root
pub use config::ConfigError;
pub use credential::CredentialError;
pub use decode::DecodeError;
pub use network::{DownloadError, TransportError};
pub use signing::SigningError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Error)]
pub enum Error {
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for paygate operations
pub type Result<T> = std::result::Result<T, Error>;
