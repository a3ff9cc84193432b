//! HTTP transport seam
//!
//! Signing and decoding never touch the network directly; they hand a
//! [`SignedRequest`] to a [`Transport`]. Transport failures are opaque
//! [`TransportError`]s, distinct from signing and decode errors. Timeout
//! and cancellation live entirely on this side of the seam.

use crate::request::SignedRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use paygate_config::NetworkConfig;
use paygate_errors::{Error, TransportError};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// A received response: status, headers, and the full body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl TransportResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes signed request descriptions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a request and buffer the whole response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] for connection, TLS or timeout
    /// failures; gateway-level errors arrive as responses, not errors.
    async fn send(&self, request: &SignedRequest) -> Result<TransportResponse, Error>;

    /// Execute a request and stream the response body chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request fails or the response
    /// status is not successful.
    async fn stream(
        &self,
        request: &SignedRequest,
    ) -> Result<BoxStream<'static, Result<Bytes, Error>>, Error>;
}

/// Transport backed by a pooled reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_uri: Url,
}

impl HttpTransport {
    /// Create a transport resolving endpoint paths against `base_uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URI is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(base_uri: &str, config: &NetworkConfig) -> Result<Self, Error> {
        let base_uri =
            Url::parse(base_uri).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TransportError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, base_uri })
    }

    fn build_request(&self, request: &SignedRequest) -> Result<reqwest::RequestBuilder, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::RequestFailed(format!("bad method {}", request.method)))?;

        let url = self
            .base_uri
            .join(&request.url)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(query) = &request.query {
            builder = builder.query(&query.iter().collect::<Vec<_>>());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SignedRequest) -> Result<TransportResponse, Error> {
        tracing::debug!(url = %request.url, method = %request.method, "sending request");

        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    async fn stream(
        &self,
        request: &SignedRequest,
    ) -> Result<BoxStream<'static, Result<Bytes, Error>>, Error> {
        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::RequestFailed(e.to_string()).into()))
            .boxed())
    }
}

fn map_reqwest_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        TransportError::Timeout {
            url: err
                .url()
                .map(std::string::ToString::to_string)
                .unwrap_or_default(),
        }
        .into()
    } else if err.is_connect() {
        TransportError::ConnectionRefused(err.to_string()).into()
    } else {
        TransportError::RequestFailed(err.to_string()).into()
    }
}
