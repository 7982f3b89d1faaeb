//! Transport trait and implementations.
//!
//! The query engine depends only on [`Transport::send`]: one request frame in,
//! one raw response body out. HTTP method, headers, authentication and
//! connection reuse are the transport's concern.

mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::params::RequestFrame;
use crate::error::TransportError;

pub use http::HttpTransport;
pub use http::HttpTransportBuilder;
pub use http::Missing;
pub use http::Set;

/// Sends one request frame and returns the raw response body.
///
/// The engine calls `send` once per page, retrying failures according to its
/// [`RetryConfig`](crate::rate_limit::RetryConfig). Implementations should
/// not retry on their own.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use wapiti_lib::api::params::RequestFrame;
/// use wapiti_lib::error::TransportError;
/// use wapiti_lib::transport::Transport;
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn send(&self, _frame: &RequestFrame) -> Result<String, TransportError> {
///         Err(TransportError::other("offline"))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the frame's parameters and returns the response body.
    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError> {
        (**self).send(frame).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError> {
        (**self).send(frame).await
    }
}

/// A transport that answers every request with the same body.
///
/// Useful for testing or for replaying a captured response.
///
/// # Example
///
/// ```
/// use wapiti_lib::transport::StaticTransport;
///
/// let transport = StaticTransport::new(r#"{"query": {"pages": {}}}"#);
/// ```
#[derive(Debug, Clone)]
pub struct StaticTransport {
    body: String,
}

impl StaticTransport {
    /// Creates a transport that always returns `body`.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn send(&self, _frame: &RequestFrame) -> Result<String, TransportError> {
        Ok(self.body.clone())
    }
}
