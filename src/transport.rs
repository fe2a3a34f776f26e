//! HTTP transport for the etcd client
//!
//! The client dispatches through the [`Transport`] trait so failover can
//! be exercised against scripted transports in tests. [`HyperTransport`]
//! is the production implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

/// HTTP verbs used by the etcd v2 API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a key or an introspection endpoint.
    Get,
    /// Write a key or create a directory.
    Put,
    /// Remove a key or a directory.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Put => f.write_str("PUT"),
            Method::Delete => f.write_str("DELETE"),
        }
    }
}

/// One completed HTTP exchange.
///
/// An error status is still a completed exchange; the structured error
/// payload in the body belongs to the response model, not the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status returned by the server.
    pub status: StatusCode,
    /// Raw response body.
    pub body: Bytes,
}

/// Network-layer failures.
///
/// These are the only errors that advance the client to the next
/// endpoint; once every candidate has failed they reach the caller
/// wrapped in [`Error::Unreachable`](crate::Error::Unreachable).
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection-level failure (refused, reset, DNS, protocol).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Request/response surface the client dispatches through.
///
/// Implementations must keep connection-level failures (a
/// [`TransportError`]) distinct from completed exchanges (a
/// [`RawResponse`], whatever its status). `put` bodies arrive already
/// form-encoded.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET to an absolute URL.
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;

    /// Issue a PUT with a form-encoded body to an absolute URL.
    async fn put(&self, url: &str, body: &str) -> Result<RawResponse, TransportError>;

    /// Issue a DELETE to an absolute URL.
    async fn delete(&self, url: &str) -> Result<RawResponse, TransportError>;
}

type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// Production [`Transport`] backed by hyper.
///
/// Speaks HTTP/1.1, which is what the etcd v2 API serves. Plain `http://`
/// and `https://` (standard CA verification via webpki roots) URLs are
/// both supported. An optional per-request timeout turns a stalled
/// endpoint into a [`TransportError::Timeout`] so the client can move on
/// to the next candidate.
#[derive(Clone)]
pub struct HyperTransport {
    client: HttpClient<HttpsConnector, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl HyperTransport {
    /// Create a transport with no per-request timeout.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// Create a transport that aborts requests after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let client = HttpClient::builder(TokioExecutor::new()).build(https_connector);

        Self { client, timeout }
    }

    async fn dispatch(
        &self,
        method: hyper::Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;

        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(form) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Full::new(Bytes::copy_from_slice(form.as_bytes()))),
            None => builder.body(Full::new(Bytes::new())),
        }
        .map_err(|e| TransportError::Connection(format!("Failed to build request: {}", e)))?;

        let pending = self.client.request(request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => pending.await,
        }
        .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Connection(format!("Failed to read body: {}", e)))?
            .to_bytes();

        Ok(RawResponse { status, body })
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.dispatch(hyper::Method::GET, url, None).await
    }

    async fn put(&self, url: &str, body: &str) -> Result<RawResponse, TransportError> {
        self.dispatch(hyper::Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.dispatch(hyper::Method::DELETE, url, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyper_transport_builds() {
        let _ = HyperTransport::new();
        let _ = HyperTransport::with_timeout(Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_transport_error() {
        let transport = HyperTransport::new();
        let result = transport.get("not a url").await;
        match result.unwrap_err() {
            TransportError::InvalidUrl(msg) => assert!(msg.contains("not a url")),
            e => panic!("Expected InvalidUrl error, got: {:?}", e),
        }
    }
}
