//! Response extraction errors

use super::ApiErrorDetail;

/// Errors raised while extracting records from one response body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractError {
    /// The body is not JSON or lacks the expected structure.
    #[error("{0}")]
    Malformed(String),

    /// The body carries a server-reported `error` section.
    #[error("{0}")]
    Api(Box<ApiErrorDetail>),
}

impl ExtractError {
    /// Creates a new malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
