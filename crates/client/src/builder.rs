//! Request construction and signing orchestration

use crate::credentials::CredentialProvider;
use crate::request::SignedRequest;
use paygate_canonical::{self as canonical, Params, StringParams};
use paygate_config::Config;
use paygate_errors::Error;
use paygate_signing::{nonce_str, sign_md5, SignChain};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Header carrying the serial number of the signing certificate
pub const SERIAL_HEADER: &str = "Pay-Serial";

/// Path prefix for the sandbox gateway environment
const SANDBOX_PREFIX: &str = "sandboxnew/";

/// Builds signed request descriptions for both signing schemes.
///
/// Stateless apart from the injected config and credential handles; any
/// number of builds may run concurrently.
pub struct RequestBuilder {
    config: Arc<Config>,
    credentials: Arc<dyn CredentialProvider>,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(config: Arc<Config>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Rewrite an endpoint for the sandbox environment.
    ///
    /// Happens before any canonicalization or signing: the rewrite changes
    /// the canonical URL and therefore the signature.
    #[must_use]
    pub fn wrap(&self, endpoint: &str) -> String {
        // absolute URLs (download links handed out by the gateway) are
        // already environment-specific and are signed as given
        if self.config.gateway.sandbox && !endpoint.contains("://") {
            format!("{SANDBOX_PREFIX}{endpoint}")
        } else {
            endpoint.to_string()
        }
    }

    /// Build a request signed with the asymmetric scheme.
    ///
    /// Merge order is defaults (appid, mchid) < caller options; empty
    /// values are dropped after the merge. A query map, when present, is
    /// appended to the canonical URL as a sorted `?`-joined string before
    /// signing and preserved as-is for transport-level attachment.
    /// Non-read-only methods sign and carry the canonical JSON rendering
    /// of the option map; read-only methods sign an empty body.
    ///
    /// # Errors
    ///
    /// Returns an error if no signer is available or signing fails; the
    /// request is aborted, never sent unsigned.
    pub fn build_v1(
        &self,
        endpoint: &str,
        method: &str,
        query: Option<&StringParams>,
        options: &Params,
        extra_headers: Option<&BTreeMap<String, String>>,
    ) -> Result<SignedRequest, Error> {
        let endpoint = self.wrap(endpoint);
        let method = method.to_uppercase();

        let mut defaults = Params::new();
        defaults.insert(
            "appid".to_string(),
            Value::String(self.config.gateway.app_id.clone()),
        );
        defaults.insert(
            "mchid".to_string(),
            Value::String(self.config.gateway.mch_id.clone()),
        );

        let options = canonical::filter_empty(&canonical::merge(&[&defaults, options]));

        let query = query
            .map(canonical::filter_empty_strings)
            .filter(|q| !q.is_empty());
        let canonical_url = match &query {
            Some(q) => format!("{endpoint}?{}", canonical::sorted_query_string(q)),
            None => endpoint.clone(),
        };

        let sign_body = if SignedRequest::is_read_only(&method) {
            String::new()
        } else {
            canonical::json_body(&options)?
        };

        let signer = self.credentials.request_signer()?;
        let authorization =
            signer.sign_request(&SignChain::new(&method, &canonical_url, &sign_body))?;

        // caller headers first, signer-set keys win
        let mut headers = extra_headers.cloned().unwrap_or_default();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), authorization.value);
        headers.insert(SERIAL_HEADER.to_string(), authorization.serial_no);

        let body = if SignedRequest::is_read_only(&method) {
            None
        } else {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
            Some(sign_body)
        };

        Ok(SignedRequest {
            url: endpoint,
            method,
            headers,
            query,
            body,
        })
    }

    /// Build a request signed with the shared-secret legacy scheme.
    ///
    /// A fresh 32-character nonce is injected before signing on every
    /// call; the legacy scheme requires it for replay resistance. The
    /// signed parameter map travels as a flat XML body on non-read-only
    /// methods; read-only methods carry no body.
    ///
    /// # Errors
    ///
    /// Returns an error if no secret key resolves for the endpoint; the
    /// request is aborted.
    pub fn build_v2(
        &self,
        endpoint: &str,
        method: &str,
        params: &StringParams,
    ) -> Result<SignedRequest, Error> {
        let endpoint = self.wrap(endpoint);
        let method = method.to_uppercase();

        let mut base = StringParams::new();
        base.insert("nonce_str".to_string(), nonce_str());

        let mut signed = canonical::filter_empty_strings(&canonical::merge(&[params, &base]));

        let secret_key = self.credentials.secret_key_for(&endpoint)?;
        let signature = sign_md5(&signed, &secret_key);
        signed.insert("sign".to_string(), signature);

        let mut headers = BTreeMap::new();
        let body = if SignedRequest::is_read_only(&method) {
            None
        } else {
            headers.insert("Content-Type".to_string(), "text/xml".to_string());
            Some(canonical::to_xml(&signed))
        };

        let query = self.config.gateway.debug.then(|| {
            let mut q = StringParams::new();
            q.insert("debug".to_string(), "1".to_string());
            q
        });

        Ok(SignedRequest {
            url: endpoint,
            method,
            headers,
            query,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_errors::CredentialError;
    use paygate_signing::RsaSha256Signer;
    use serde_json::json;

    const TEST_KEY_PEM: &str = include_str!("../../signing/tests/data/test_key.pem");

    struct TestCredentials {
        signer: Option<RsaSha256Signer>,
        secret_key: Option<String>,
    }

    impl CredentialProvider for TestCredentials {
        fn request_signer(&self) -> Result<&RsaSha256Signer, Error> {
            self.signer.as_ref().ok_or_else(|| {
                CredentialError::NoRequestSigner {
                    reason: "test".to_string(),
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

    fn builder(sandbox: bool) -> RequestBuilder {
        let mut config = Config::default();
        config.gateway.app_id = "wx1234".to_string();
        config.gateway.mch_id = "10000100".to_string();
        config.gateway.serial_no = "5157F09E".to_string();
        config.gateway.sandbox = sandbox;

        let credentials = TestCredentials {
            signer: Some(RsaSha256Signer::new("10000100", "5157F09E", TEST_KEY_PEM).unwrap()),
            secret_key: Some("192006250b4c09247ec02edce69f6a2d".to_string()),
        };

        RequestBuilder::new(Arc::new(config), Arc::new(credentials))
    }

    #[test]
    fn test_v1_get_has_no_body() {
        let request = builder(false)
            .build_v1("pay/order/query", "GET", None, &Params::new(), None)
            .unwrap();

        assert_eq!(request.method, "GET");
        assert!(request.body.is_none());
        assert!(request.headers.contains_key("Authorization"));
        assert_eq!(request.headers[SERIAL_HEADER], "5157F09E");
    }

    #[test]
    fn test_v1_post_body_is_canonical_json() {
        let mut options = Params::new();
        options.insert("total".to_string(), json!(100));
        options.insert("attach".to_string(), json!(""));

        let request = builder(false)
            .build_v1("pay/order", "post", None, &options, None)
            .unwrap();

        assert_eq!(request.method, "POST");
        // empty value filtered, defaults merged, keys ascending
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"appid":"wx1234","mchid":"10000100","total":100}"#)
        );
        assert_eq!(
            request.headers["Content-Type"],
            "application/json".to_string()
        );
    }

    #[test]
    fn test_v1_query_preserved_and_url_unchanged() {
        let mut query = StringParams::new();
        query.insert("bill_date".to_string(), "2024-01-01".to_string());
        query.insert("bill_type".to_string(), "ALL".to_string());
        query.insert("empty".to_string(), String::new());

        let request = builder(false)
            .build_v1("bill/download", "GET", Some(&query), &Params::new(), None)
            .unwrap();

        // the transport URL carries no query string; the map does
        assert_eq!(request.url, "bill/download");
        let q = request.query.unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q["bill_date"], "2024-01-01");
        assert!(!q.contains_key("empty"));
    }

    #[test]
    fn test_sandbox_rewrite_applies_before_signing() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;
        use rsa::pkcs1v15::{Signature, VerifyingKey};
        use rsa::pkcs8::DecodePrivateKey;
        use rsa::signature::Verifier;
        use rsa::RsaPrivateKey;
        use sha2::Sha256;

        let request = builder(true)
            .build_v1("pay/order", "GET", None, &Params::new(), None)
            .unwrap();
        assert_eq!(request.url, "sandboxnew/pay/order");

        // the signature must cover the rewritten URL, not the original one
        let auth = &request.headers["Authorization"];
        let field = |name: &str| -> String {
            let start = auth.find(&format!("{name}=\"")).unwrap() + name.len() + 2;
            let end = auth[start..].find('"').unwrap();
            auth[start..start + end].to_string()
        };
        let message = format!(
            "GET\nsandboxnew/pay/order\n{}\n{}\n\n",
            field("timestamp"),
            field("nonce_str")
        );

        let private_key = RsaPrivateKey::from_pkcs8_pem(TEST_KEY_PEM).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(private_key.to_public_key());
        let signature_bytes = BASE64.decode(field("signature")).unwrap();
        let signature = Signature::try_from(signature_bytes.as_slice()).unwrap();
        verifying_key.verify(message.as_bytes(), &signature).unwrap();

        let request = builder(false)
            .build_v1("pay/order", "GET", None, &Params::new(), None)
            .unwrap();
        assert_eq!(request.url, "pay/order");
    }

    #[test]
    fn test_wrap_leaves_absolute_urls_alone() {
        let b = builder(true);
        assert_eq!(
            b.wrap("https://files.test/bill.csv"),
            "https://files.test/bill.csv"
        );
    }

    #[test]
    fn test_v1_caller_headers_lose_to_signer() {
        let mut extra = BTreeMap::new();
        extra.insert("Authorization".to_string(), "caller-value".to_string());
        extra.insert("X-Request-Id".to_string(), "abc123".to_string());

        let request = builder(false)
            .build_v1("pay/order", "GET", None, &Params::new(), Some(&extra))
            .unwrap();

        assert_ne!(request.headers["Authorization"], "caller-value");
        assert_eq!(request.headers["X-Request-Id"], "abc123");
    }

    #[test]
    fn test_v1_without_signer_aborts() {
        let config = Arc::new(Config::default());
        let builder = RequestBuilder::new(
            config,
            Arc::new(TestCredentials {
                signer: None,
                secret_key: None,
            }),
        );

        let result = builder.build_v1("pay/order", "GET", None, &Params::new(), None);
        assert!(matches!(
            result,
            Err(Error::Credential(CredentialError::NoRequestSigner { .. }))
        ));
    }

    #[test]
    fn test_v2_injects_nonce_and_sign() {
        let mut params = StringParams::new();
        params.insert("out_trade_no".to_string(), "T100".to_string());

        let request = builder(false)
            .build_v2("pay/micropay", "POST", &params)
            .unwrap();

        let body = request.body.unwrap();
        assert!(body.starts_with("<xml>"));
        assert!(body.contains("<out_trade_no><![CDATA[T100]]></out_trade_no>"));
        assert!(body.contains("<nonce_str><![CDATA["));
        assert!(body.contains("<sign><![CDATA["));
        assert_eq!(request.headers["Content-Type"], "text/xml");
    }

    #[test]
    fn test_v2_get_carries_no_body() {
        let request = builder(false)
            .build_v2("pay/orderquery", "GET", &StringParams::new())
            .unwrap();
        assert!(request.body.is_none());
    }

    #[test]
    fn test_v2_without_secret_key_aborts() {
        let mut config = Config::default();
        config.gateway.mch_id = "10000100".to_string();
        let builder = RequestBuilder::new(
            Arc::new(config),
            Arc::new(TestCredentials {
                signer: None,
                secret_key: None,
            }),
        );

        let result = builder.build_v2("pay/micropay", "POST", &StringParams::new());
        assert!(matches!(
            result,
            Err(Error::Credential(CredentialError::NoSecretKey { .. }))
        ));
    }

    #[test]
    fn test_v2_debug_flag_adds_query() {
        let mut config = Config::default();
        config.gateway.debug = true;
        let builder = RequestBuilder::new(
            Arc::new(config),
            Arc::new(TestCredentials {
                signer: None,
                secret_key: Some("secret".to_string()),
            }),
        );

        let request = builder
            .build_v2("pay/micropay", "POST", &StringParams::new())
            .unwrap();
        assert_eq!(request.query.unwrap()["debug"], "1");
    }
}
