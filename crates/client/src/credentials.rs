//! Credential resolution
//!
//! Signers borrow key material transiently per call; nothing here hands
//! out owned secrets beyond the per-endpoint lookup the legacy scheme
//! requires.

use paygate_config::Config;
use paygate_errors::{CredentialError, Error};
use paygate_signing::RsaSha256Signer;

/// External collaborator that owns all credential material.
pub trait CredentialProvider: Send + Sync {
    /// The private-key signer for the asymmetric scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if no key material is configured; the request must
    /// be aborted, never sent unsigned.
    fn request_signer(&self) -> Result<&RsaSha256Signer, Error>;

    /// The shared secret for a legacy-scheme endpoint. Different endpoints
    /// may use different merchant secrets.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret resolves for the endpoint.
    fn secret_key_for(&self, endpoint: &str) -> Result<String, Error>;

    /// Optional bearer token attached to outgoing requests.
    fn access_token(&self) -> Option<String>;
}

/// Credential provider backed by the static configuration file.
pub struct ConfigCredentials {
    signer: Option<RsaSha256Signer>,
    secret_key: Option<String>,
}

impl ConfigCredentials {
    /// Build credentials from configuration, loading the private key file
    /// if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured key file is missing or invalid.
    /// A configuration without a key path yields a provider that fails
    /// only when the asymmetric scheme is actually used.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let signer = match &config.gateway.key_path {
            Some(path) => Some(RsaSha256Signer::from_key_file(
                &config.gateway.mch_id,
                &config.gateway.serial_no,
                path,
            )?),
            None => None,
        };

        Ok(Self {
            signer,
            secret_key: config.gateway.secret_key.clone(),
        })
    }

    /// Build credentials from an in-memory key, for callers that manage
    /// key storage themselves.
    #[must_use]
    pub fn with_signer(signer: RsaSha256Signer, secret_key: Option<String>) -> Self {
        Self {
            signer: Some(signer),
            secret_key,
        }
    }
}

impl CredentialProvider for ConfigCredentials {
    fn request_signer(&self) -> Result<&RsaSha256Signer, Error> {
        self.signer.as_ref().ok_or_else(|| {
            CredentialError::NoRequestSigner {
                reason: "no private key configured".to_string(),
            }
            .into()
        })
    }

    fn secret_key_for(&self, endpoint: &str) -> Result<String, Error> {
        self.secret_key.clone().ok_or_else(|| {
            CredentialError::NoSecretKey {
                endpoint: endpoint.to_string(),
            }
            .into()
        })
    }

    fn access_token(&self) -> Option<String> {
        None
    }
}
