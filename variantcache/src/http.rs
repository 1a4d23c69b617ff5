//! HTTP client abstraction for testability.
//!
//! Both the origin client and the HTTP object store talk to the network
//! through [`AsyncHttpClient`], so they can be exercised with a scripted
//! client in tests.

use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("variantcache/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures (no response was obtained).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("failed to create HTTP client: {0}")]
    Build(String),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Asynchronous HTTP operations used by the network adapters.
///
/// Non-2xx statuses are returned as responses, not errors; callers decide
/// what each status means for them.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs a GET request.
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;

    /// Performs a PUT request with the given body.
    fn put(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;

    /// Performs a DELETE request.
    fn delete(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

/// Async HTTP client backed by reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self { client })
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &'static str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, HttpError> {
        let mut request = request;
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        trace!(method, url, "HTTP request starting");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    method,
                    url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                if e.is_timeout() {
                    return Err(HttpError::Timeout {
                        url: url.to_string(),
                    });
                }
                return Err(HttpError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status().as_u16();
        debug!(method, url, status, "HTTP response received");

        let body = response.bytes().await.map_err(|e| {
            warn!(method, url, error = %e, "Failed to read response body");
            HttpError::Body {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        trace!(method, url, bytes = body.len(), "HTTP response body read");
        Ok(HttpResponse { status, body })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        self.execute(self.client.get(url), "GET", url, headers).await
    }

    async fn put(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(self.client.put(url).body(body), "PUT", url, headers)
            .await
    }

    async fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        self.execute(self.client.delete(url), "DELETE", url, headers)
            .await
    }
}

impl<C: AsyncHttpClient> AsyncHttpClient for Arc<C> {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        (**self).get(url, headers).await
    }

    async fn put(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Bytes,
    ) -> Result<HttpResponse, HttpError> {
        (**self).put(url, headers, body).await
    }

    async fn delete(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, HttpError> {
        (**self).delete(url, headers).await
    }
}
