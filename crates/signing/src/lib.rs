#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Request signing for paygate
//!
//! Two historical schemes coexist. The current scheme signs a canonical
//! method/URL/body triple with an RSA private key and emits an
//! authorization header. The legacy scheme computes an MD5 digest over
//! sorted key-value pairs with a shared merchant secret and travels inside
//! the request body itself. Endpoints choose their scheme; both are
//! implemented here so call sites never branch on the mechanics.

mod legacy;
mod rsa_signer;

pub use legacy::sign_md5;
pub use rsa_signer::{Authorization, RsaSha256Signer, AUTH_SCHEME};

use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of the nonce injected into every legacy request
pub const NONCE_LENGTH: usize = 32;

/// The exact triple a signature is computed over.
///
/// `sign_body` must match byte-for-byte what will be transmitted, or the
/// gateway-side verification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignChain {
    pub method: String,
    pub canonical_url: String,
    pub sign_body: String,
}

impl SignChain {
    #[must_use]
    pub fn new(method: &str, canonical_url: &str, sign_body: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            canonical_url: canonical_url.to_string(),
            sign_body: sign_body.to_string(),
        }
    }
}

/// Generate a fixed-length random alphanumeric nonce.
///
/// Required for replay resistance in the legacy scheme and for the
/// authorization token of the current one.
#[must_use]
pub fn nonce_str() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_str_shape() {
        let nonce = nonce_str();
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_nonce_str_unique() {
        assert_ne!(nonce_str(), nonce_str());
    }

    #[test]
    fn test_sign_chain_uppercases_method() {
        let chain = SignChain::new("post", "pay/order", "{}");
        assert_eq!(chain.method, "POST");
        assert_eq!(chain.canonical_url, "pay/order");
    }
}
