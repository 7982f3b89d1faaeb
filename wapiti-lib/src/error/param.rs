//! Parameter declaration and resolution errors

use super::Error;

/// Errors raised while declaring a [`ParamSet`](crate::api::params::ParamSet).
///
/// These are programmer errors in an operation declaration, reported when
/// the set is built rather than when a query runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Two params resolve to the same wire name.
    #[error("duplicate parameter '{wire_name}'")]
    DuplicateParameter { wire_name: String },

    /// Two params share the same logical name.
    #[error("duplicate field '{name}'")]
    DuplicateField { name: String },

    /// More than one multi-value param is marked as the batched field.
    #[error("only one batched field is allowed, found '{first}' and '{second}'")]
    MultipleBatchedParameters { first: String, second: String },

    /// `batched()` was used on a param that is not multi-value.
    #[error("field '{name}' is not multi-value and cannot be batched")]
    NotBatchable { name: String },
}

impl ParamError {
    /// Creates a new duplicate parameter error.
    pub fn duplicate(wire_name: impl Into<String>) -> Self {
        Self::DuplicateParameter {
            wire_name: wire_name.into(),
        }
    }
}

/// Errors raised while resolving caller field values against a
/// [`ParamSet`](crate::api::params::ParamSet).
///
/// The query facade converts these into [`Error`] with the operation name
/// attached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A required field has no value and no default.
    #[error("missing required parameter '{name}'")]
    Missing { name: String },

    /// A value was supplied for an undeclared or static field.
    #[error("unexpected parameter '{name}'")]
    Unexpected { name: String },

    /// A value of the wrong shape was supplied.
    #[error("invalid value for '{name}': {message}")]
    Invalid { name: String, message: String },
}

impl ResolveError {
    /// Creates a new missing parameter error.
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing { name: name.into() }
    }

    /// Creates a new unexpected parameter error.
    pub fn unexpected(name: impl Into<String>) -> Self {
        Self::Unexpected { name: name.into() }
    }

    /// Creates a new invalid value error.
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Attaches the operation name.
    pub fn into_error(self, operation: impl Into<String>) -> Error {
        let operation = operation.into();
        match self {
            Self::Missing { name } => Error::MissingParameter { operation, name },
            Self::Unexpected { name } => Error::UnexpectedParameter { operation, name },
            Self::Invalid { name, message } => Error::InvalidParameter {
                operation,
                name,
                message,
            },
        }
    }
}
