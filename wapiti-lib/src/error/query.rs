//! Top-level error type for query operations

use std::fmt;
use std::time::Duration;

use super::ApiErrorDetail;
use super::FieldError;
use super::TransportError;
use crate::model::Identifier;

/// Where in a query operation an error happened.
///
/// Pages are numbered from 1 within each batch. `batch` and `page` are `None`
/// when the error is not tied to a particular request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Name of the operation that failed.
    pub operation: String,
    /// Index of the batch being processed.
    pub batch: Option<usize>,
    /// Page number within the batch.
    pub page: Option<usize>,
}

impl ErrorContext {
    /// Creates a context for a whole operation.
    pub fn operation(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            batch: None,
            page: None,
        }
    }

    /// Creates a context for one page of one batch.
    pub fn page(operation: impl Into<String>, batch: usize, page: usize) -> Self {
        Self {
            operation: operation.into(),
            batch: Some(batch),
            page: Some(page),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation '{}'", self.operation)?;
        if let Some(batch) = self.batch {
            write!(f, ", batch {}", batch)?;
        }
        if let Some(page) = self.page {
            write!(f, ", page {}", page)?;
        }
        Ok(())
    }
}

/// Errors returned by [`QueryOperation`](crate::api::query::QueryOperation).
///
/// Parameter errors are raised before any request is sent. Everything else
/// carries an [`ErrorContext`] naming the operation, batch and page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was not supplied and has no default.
    #[error("operation '{operation}': missing required parameter '{name}'")]
    MissingParameter { operation: String, name: String },

    /// The caller supplied a field the operation does not declare.
    #[error("operation '{operation}': unexpected parameter '{name}'")]
    UnexpectedParameter { operation: String, name: String },

    /// The caller supplied a value of the wrong shape for a field.
    #[error("operation '{operation}': invalid value for '{name}': {message}")]
    InvalidParameter {
        operation: String,
        name: String,
        message: String,
    },

    /// The transport failed and retries were exhausted.
    #[error("{context}: transport failed after {attempts} attempt(s): {source}")]
    Transport {
        context: ErrorContext,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The response did not have the expected structure.
    #[error("{context}: malformed response: {message}")]
    MalformedResponse { context: ErrorContext, message: String },

    /// The server reported an error in the response body.
    #[error("{context}: API error {detail}")]
    Api {
        context: ErrorContext,
        detail: Box<ApiErrorDetail>,
    },

    /// A batch kept returning continuation tokens past the page limit.
    #[error("{context}: continuation limit of {max_pages} page(s) exceeded")]
    ContinuationLimitExceeded { context: ErrorContext, max_pages: usize },

    /// The caller cancelled the operation.
    #[error("{context}: cancelled")]
    Cancelled { context: ErrorContext },

    /// The whole operation ran past its deadline.
    #[error("{context}: timed out after {elapsed:?}")]
    Timeout { context: ErrorContext, elapsed: Duration },

    /// A merged record could not be converted into the output type.
    #[error("operation '{operation}': cannot build output for '{identifier}': {source}")]
    Conversion {
        operation: String,
        identifier: Identifier,
        #[source]
        source: FieldError,
    },
}

impl Error {
    /// Returns the name of the operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            Self::MissingParameter { operation, .. }
            | Self::UnexpectedParameter { operation, .. }
            | Self::InvalidParameter { operation, .. }
            | Self::Conversion { operation, .. } => operation,
            Self::Transport { context, .. }
            | Self::MalformedResponse { context, .. }
            | Self::Api { context, .. }
            | Self::ContinuationLimitExceeded { context, .. }
            | Self::Cancelled { context }
            | Self::Timeout { context, .. } => &context.operation,
        }
    }

    /// Returns the request context, if the error happened in the network phase.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Transport { context, .. }
            | Self::MalformedResponse { context, .. }
            | Self::Api { context, .. }
            | Self::ContinuationLimitExceeded { context, .. }
            | Self::Cancelled { context }
            | Self::Timeout { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Returns `true` for errors raised before any request was sent.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::UnexpectedParameter { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// Returns `true` if the operation stopped early and records gathered so
    /// far are still meaningful (limit, cancellation, deadline).
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            Self::ContinuationLimitExceeded { .. } | Self::Cancelled { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
