//! High-level gateway client facade

use crate::builder::RequestBuilder;
use crate::credentials::CredentialProvider;
use crate::decode::{decode_json, decode_xml};
use crate::download::{DownloadDescriptor, Downloader};
use crate::request::SignedRequest;
use crate::transport::{HttpTransport, Transport, TransportResponse};
use paygate_canonical::{Params, StringParams};
use paygate_config::Config;
use paygate_errors::Error;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Header carrying the optional access token
const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// The gateway client: request construction, signing, transport and
/// decoding behind one handle. Cheap to share; all per-call state lives on
/// the stack of the call.
pub struct GatewayClient {
    credentials: Arc<dyn CredentialProvider>,
    builder: Arc<RequestBuilder>,
    transport: Arc<dyn Transport>,
    secure_transport: Option<Arc<dyn Transport>>,
}

impl GatewayClient {
    /// Create a client with an HTTP transport built from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URI is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self, Error> {
        let transport = Arc::new(HttpTransport::new(
            &config.gateway.base_uri,
            &config.network,
        )?);
        Ok(Self::with_transport(config, credentials, transport))
    }

    /// Create a client over a caller-supplied transport.
    #[must_use]
    pub fn with_transport(
        config: Config,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let config = Arc::new(config);
        let builder = Arc::new(RequestBuilder::new(
            Arc::clone(&config),
            Arc::clone(&credentials),
        ));

        Self {
            credentials,
            builder,
            transport,
            secure_transport: None,
        }
    }

    /// Attach a transport carrying a client certificate, used by
    /// [`safe_request`](Self::safe_request) for endpoints that demand
    /// mutual TLS.
    #[must_use]
    pub fn with_secure_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.secure_transport = Some(transport);
        self
    }

    /// Execute a current-scheme request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Signing, transport and decode errors propagate separately; see
    /// [`paygate_errors::Error`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &str,
        query: Option<&StringParams>,
        options: &Params,
    ) -> Result<T, Error> {
        let response = self.request_raw(endpoint, method, query, options).await?;
        decode_json(&response)
    }

    /// Execute a current-scheme request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns signing or transport errors.
    pub async fn request_raw(
        &self,
        endpoint: &str,
        method: &str,
        query: Option<&StringParams>,
        options: &Params,
    ) -> Result<TransportResponse, Error> {
        let mut request = self.builder.build_v1(endpoint, method, query, options, None)?;
        self.apply_access_token(&mut request);
        self.transport.send(&request).await
    }

    /// Execute a legacy-scheme request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns key-resolution or transport errors.
    pub async fn request_v2(
        &self,
        endpoint: &str,
        method: &str,
        params: &StringParams,
    ) -> Result<TransportResponse, Error> {
        let mut request = self.builder.build_v2(endpoint, method, params)?;
        self.apply_access_token(&mut request);
        self.transport.send(&request).await
    }

    /// Execute a legacy-scheme request over the certificate-bearing
    /// transport and decode the XML response.
    ///
    /// # Errors
    ///
    /// Returns key-resolution, transport or decode errors.
    pub async fn safe_request(
        &self,
        endpoint: &str,
        method: &str,
        params: &StringParams,
    ) -> Result<StringParams, Error> {
        let mut request = self.builder.build_v2(endpoint, method, params)?;
        self.apply_access_token(&mut request);

        let transport = self.secure_transport.as_ref().unwrap_or(&self.transport);
        let response = transport.send(&request).await?;
        decode_xml(&response)
    }

    /// Download a gateway file to `dest`, verifying its checksum when the
    /// descriptor carries one. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// See [`Downloader::download_and_verify`].
    pub async fn download(
        &self,
        descriptor: &DownloadDescriptor,
        dest: &Path,
    ) -> Result<u64, Error> {
        Downloader::new(Arc::clone(&self.builder), Arc::clone(&self.transport))
            .download_and_verify(descriptor, dest)
            .await
    }

    // Token decoration happens after signing: it is transport metadata,
    // not signed material.
    fn apply_access_token(&self, request: &mut SignedRequest) {
        if let Some(token) = self.credentials.access_token() {
            request
                .headers
                .insert(ACCESS_TOKEN_HEADER.to_string(), token);
        }
    }
}
