//! reqwest-backed HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::Method;
use url::Url;

use super::Transport;
use crate::api::params::RequestFrame;
use crate::error::TransportError;

const DEFAULT_USER_AGENT: &str = concat!("wapiti-lib/", env!("CARGO_PKG_VERSION"));

/// Sends request frames to an `api.php` endpoint over HTTP.
///
/// GET requests carry the frame as the query string; POST requests send it
/// as a form body. Responses with a non-success status become
/// [`TransportError::Http`].
///
/// This transport is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use wapiti_lib::transport::HttpTransport;
///
/// let transport = HttpTransport::builder()
///     .url("https://en.wikipedia.org/w/api.php")
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

#[derive(Debug)]
struct HttpTransportInner {
    endpoint: Url,
    method: Method,
    http_client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a new builder for constructing a transport.
    pub fn builder() -> HttpTransportBuilder<Missing> {
        HttpTransportBuilder::new()
    }

    /// Returns the API endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Returns the HTTP method used for requests.
    pub fn method(&self) -> &Method {
        &self.inner.method
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError> {
        let inner = &self.inner;
        debug!("{} {} ({} params)", inner.method, inner.endpoint, frame.len());

        let mut request = inner.http_client.request(inner.method.clone(), inner.endpoint.clone());
        request = if inner.method == Method::POST {
            request.form(frame.pairs())
        } else {
            request.query(frame.pairs())
        };
        if let Some(timeout) = inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| match inner.timeout {
            Some(timeout) if e.is_timeout() => TransportError::Timeout(timeout),
            _ => TransportError::from(e),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.text().await?);
        }

        let retry_after = parse_retry_after(&response);
        let message = response
            .text()
            .await
            .ok()
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
        Err(TransportError::Http {
            status: status.as_u16(),
            message,
            retry_after,
        })
    }
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing an [`HttpTransport`].
///
/// Uses the typestate pattern so `build` is only available once the
/// endpoint URL is set.
pub struct HttpTransportBuilder<U> {
    url: U,
    method: Method,
    user_agent: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl HttpTransportBuilder<Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            method: Method::GET,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }

    /// Sets the `api.php` endpoint URL.
    pub fn url(self, url: impl Into<String>) -> HttpTransportBuilder<Set<String>> {
        HttpTransportBuilder {
            url: Set(url.into()),
            method: self.method,
            user_agent: self.user_agent,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl Default for HttpTransportBuilder<Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> HttpTransportBuilder<U> {
    /// Sends frames as POST form bodies instead of GET query strings.
    pub fn post(mut self) -> Self {
        self.method = Method::POST;
        self
    }

    /// Sets the `User-Agent` header.
    ///
    /// Wikimedia sites reject requests without a descriptive user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl HttpTransportBuilder<Set<String>> {
    /// Builds the [`HttpTransport`].
    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let endpoint = Url::parse(&self.url.0)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", self.url.0, e)))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder().user_agent(self.user_agent);
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpTransport {
            inner: Arc::new(HttpTransportInner {
                endpoint,
                method: self.method,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults() {
        let transport = HttpTransport::builder()
            .url("https://en.wikipedia.org/w/api.php")
            .build()
            .unwrap();
        assert_eq!(transport.method(), &Method::GET);
        assert_eq!(transport.endpoint().host_str(), Some("en.wikipedia.org"));
    }

    #[test]
    fn test_build_post() {
        let transport = HttpTransport::builder()
            .post()
            .url("https://example.org/api.php")
            .build()
            .unwrap();
        assert_eq!(transport.method(), &Method::POST);
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpTransport::builder().url("not a url").build().unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
