//! S3-style object store reached over HTTP.
//!
//! Objects live at `<endpoint>/<bucket>/<key>`. Uploads carry the base64
//! SHA-256 of the payload in `x-amz-checksum-sha256`; a compliant server
//! rejects the write when the received bytes hash differently.

use super::checksum::ContentChecksum;
use super::path::StorageKey;
use super::types::{BlobStore, StoreError};
use crate::http::{AsyncHttpClient, HttpError, HttpResponse};
use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the upload checksum.
pub const CHECKSUM_HEADER: &str = "x-amz-checksum-sha256";

/// Blob store backed by an HTTP object service.
pub struct HttpBlobStore<C: AsyncHttpClient> {
    client: C,
    base: Url,
    bucket: String,
    token: Option<String>,
}

impl<C: AsyncHttpClient> HttpBlobStore<C> {
    /// Create a store for `bucket` at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the endpoint is not an absolute
    /// http(s) URL or the bucket name is empty or contains `/`.
    pub fn new(client: C, endpoint: &str, bucket: &str) -> Result<Self, StoreError> {
        let base = Url::parse(endpoint)
            .map_err(|e| StoreError::Config(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        let bucket = bucket.trim();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(StoreError::Config(format!("invalid bucket name '{}'", bucket)));
        }

        Ok(Self {
            client,
            base,
            bucket: bucket.to_string(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Object URL of a key.
    pub fn url_for(&self, key: &StorageKey) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.bucket)
                .extend(key.as_str().split('/'));
        }
        url.into()
    }

    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn transport_error(key: &StorageKey, e: HttpError) -> StoreError {
        StoreError::Transport {
            key: key.to_string(),
            message: e.to_string(),
        }
    }

    fn status_error(key: &StorageKey, response: &HttpResponse) -> StoreError {
        StoreError::Status {
            key: key.to_string(),
            status: response.status,
        }
    }
}

impl<C: AsyncHttpClient> BlobStore for HttpBlobStore<C> {
    async fn get(&self, key: &StorageKey) -> Result<Option<Bytes>, StoreError> {
        let url = self.url_for(key);
        let auth = self.auth_header();
        let mut headers: Vec<(&str, &str)> = Vec::with_capacity(1);
        if let Some(auth) = auth.as_deref() {
            headers.push(("authorization", auth));
        }

        let response = self
            .client
            .get(&url, &headers)
            .await
            .map_err(|e| Self::transport_error(key, e))?;

        match response.status {
            200..=299 => Ok(Some(response.body)),
            404 => Ok(None),
            _ => {
                warn!(url = %url, status = response.status, "object store GET failed");
                Err(Self::status_error(key, &response))
            }
        }
    }

    async fn put(&self, key: &StorageKey, data: Bytes) -> Result<(), StoreError> {
        let url = self.url_for(key);
        let checksum = ContentChecksum::of(&data).to_base64();
        let auth = self.auth_header();

        let mut headers: Vec<(&str, &str)> = vec![
            ("content-type", "application/octet-stream"),
            (CHECKSUM_HEADER, &checksum),
        ];
        if let Some(auth) = auth.as_deref() {
            headers.push(("authorization", auth));
        }

        let response = self
            .client
            .put(&url, &headers, data)
            .await
            .map_err(|e| Self::transport_error(key, e))?;

        if response.is_success() {
            debug!(url = %url, "object store PUT");
            return Ok(());
        }

        warn!(url = %url, status = response.status, "object store PUT failed");
        // S3 answers a digest mismatch with 400 BadDigest
        if response.status == 400 && response.body.windows(9).any(|w| w == b"BadDigest") {
            return Err(StoreError::ChecksumMismatch {
                key: key.to_string(),
                expected: checksum,
                actual: "rejected by store".to_string(),
            });
        }
        Err(Self::status_error(key, &response))
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StoreError> {
        let url = self.url_for(key);
        let auth = self.auth_header();
        let mut headers: Vec<(&str, &str)> = Vec::with_capacity(1);
        if let Some(auth) = auth.as_deref() {
            headers.push(("authorization", auth));
        }

        let response = self
            .client
            .delete(&url, &headers)
            .await
            .map_err(|e| Self::transport_error(key, e))?;

        match response.status {
            200..=299 | 404 => Ok(()),
            _ => {
                warn!(url = %url, status = response.status, "object store DELETE failed");
                Err(Self::status_error(key, &response))
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
