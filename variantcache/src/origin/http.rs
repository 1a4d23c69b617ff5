//! Origin reached with a plain HTTP GET.

use super::{OriginClient, OriginError};
use crate::http::{AsyncHttpClient, HttpResponse};
use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

/// How an origin response status is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Found,
    NotFound,
    Unavailable,
}

/// Classify an origin response status.
///
/// 404 and 410 mean the image does not exist. A 5xx is treated the same
/// way: a source that cannot produce the image is reported as not having
/// it. Anything else that is not 2xx is an unexpected answer.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Found,
        404 | 410 => StatusClass::NotFound,
        500..=599 => StatusClass::NotFound,
        _ => StatusClass::Unavailable,
    }
}

/// Origin client issuing `GET <root_url>/<filename>`.
pub struct HttpOrigin<C: AsyncHttpClient> {
    http_client: C,
    root_url: String,
}

impl<C: AsyncHttpClient> HttpOrigin<C> {
    /// Creates an origin rooted at `root_url`.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::Config`] if `root_url` is not an absolute
    /// http(s) URL.
    pub fn new(http_client: C, root_url: &str) -> Result<Self, OriginError> {
        let parsed = Url::parse(root_url)
            .map_err(|e| OriginError::Config(format!("invalid root URL '{}': {}", root_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(OriginError::Config(format!(
                "root URL must use http or https: {}",
                root_url
            )));
        }

        Ok(Self {
            http_client,
            root_url: root_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// URL of a file, joined with exactly one `/`.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{}", self.root_url, filename.trim_start_matches('/'))
    }

    fn interpret(filename: &str, url: &str, response: HttpResponse) -> Result<Bytes, OriginError> {
        match classify_status(response.status) {
            StatusClass::Found => {
                debug!(url = url, bytes = response.body.len(), "origin fetch succeeded");
                Ok(response.body)
            }
            StatusClass::NotFound => {
                debug!(url = url, status = response.status, "origin reports image missing");
                Err(OriginError::NotFound {
                    filename: filename.to_string(),
                    reason: format!("HTTP {}", response.status),
                })
            }
            StatusClass::Unavailable => {
                warn!(url = url, status = response.status, "unexpected origin status");
                Err(OriginError::UpstreamUnavailable {
                    filename: filename.to_string(),
                    message: format!("unexpected HTTP {}", response.status),
                })
            }
        }
    }
}

impl<C: AsyncHttpClient> OriginClient for HttpOrigin<C> {
    async fn fetch(&self, filename: &str) -> Result<Bytes, OriginError> {
        let url = self.url_for(filename);
        let response = self.http_client.get(&url, &[]).await.map_err(|e| {
            warn!(url = %url, error = %e, "origin request failed");
            OriginError::UpstreamUnavailable {
                filename: filename.to_string(),
                message: e.to_string(),
            }
        })?;
        Self::interpret(filename, &url, response)
    }

    fn name(&self) -> &str {
        "http"
    }
}
