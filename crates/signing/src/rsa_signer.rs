//! Asymmetric request signing (current scheme)

use crate::{nonce_str, SignChain};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use paygate_errors::{Error, SigningError};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Scheme token carried in the authorization header
pub const AUTH_SCHEME: &str = "SHA256-RSA2048";

/// A computed authorization header plus the serial number of the
/// certificate whose key produced it.
#[derive(Debug, Clone)]
pub struct Authorization {
    pub value: String,
    pub serial_no: String,
}

/// Signs canonical request triples with an RSA private key.
///
/// The key is parsed once at construction; a request is never sent with a
/// missing or malformed key because construction fails first.
pub struct RsaSha256Signer {
    mch_id: String,
    serial_no: String,
    signing_key: SigningKey<Sha256>,
}

impl RsaSha256Signer {
    /// Create a signer from a PKCS#8 PEM private key string.
    ///
    /// # Errors
    ///
    /// Returns a [`SigningError`] if the key material is malformed.
    pub fn new(mch_id: &str, serial_no: &str, private_key_pem: &str) -> Result<Self, Error> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| SigningError::InvalidPrivateKey(e.to_string()))?;

        Ok(Self {
            mch_id: mch_id.to_string(),
            serial_no: serial_no.to_string(),
            signing_key: SigningKey::new(private_key),
        })
    }

    /// Create a signer from a PKCS#8 PEM private key file.
    ///
    /// # Errors
    ///
    /// Returns a [`SigningError`] if the file is missing or its contents
    /// are not a valid private key.
    pub fn from_key_file(mch_id: &str, serial_no: &str, path: &Path) -> Result<Self, Error> {
        let pem = std::fs::read_to_string(path).map_err(|_| SigningError::KeyFileNotFound {
            path: path.display().to_string(),
        })?;
        Self::new(mch_id, serial_no, &pem)
    }

    /// Serial number of the certificate this signer's key belongs to
    #[must_use]
    pub fn serial_no(&self) -> &str {
        &self.serial_no
    }

    /// Sign a canonical request triple and produce the authorization
    /// header value.
    ///
    /// The signed message is `method\nurl\ntimestamp\nnonce\nbody\n`; for
    /// read-only requests the body slot is the empty string, which the
    /// gateway expects.
    ///
    /// # Errors
    ///
    /// Returns a [`SigningError`] if the signature cannot be computed.
    pub fn sign_request(&self, chain: &SignChain) -> Result<Authorization, Error> {
        let timestamp = unix_timestamp();
        let nonce = nonce_str();

        let message = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            chain.method, chain.canonical_url, timestamp, nonce, chain.sign_body
        );

        let signature = self
            .signing_key
            .try_sign(message.as_bytes())
            .map_err(|e| SigningError::SignatureFailed(e.to_string()))?;

        tracing::debug!(
            url = %chain.canonical_url,
            method = %chain.method,
            "signed request"
        );

        let value = format!(
            "{AUTH_SCHEME} mchid=\"{}\",nonce_str=\"{nonce}\",timestamp=\"{timestamp}\",\
             serial_no=\"{}\",signature=\"{}\"",
            self.mch_id,
            self.serial_no,
            BASE64.encode(signature.to_bytes()),
        );

        Ok(Authorization {
            value,
            serial_no: self.serial_no.clone(),
        })
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
