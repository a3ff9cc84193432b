//! Signing error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SigningError {
    #[error("private key file not found: {path}")]
    KeyFileNotFound { path: String },

    #[error("invalid private key material: {0}")]
    InvalidPrivateKey(String),

    #[error("signature computation failed: {0}")]
    SignatureFailed(String),
}
