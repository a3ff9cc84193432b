//! Credential resolution error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("no secret key configured for endpoint: {endpoint}")]
    NoSecretKey { endpoint: String },

    #[error("no request signer available: {reason}")]
    NoRequestSigner { reason: String },
}
