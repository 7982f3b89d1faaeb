//! Typed query results.

use crate::model::Identifier;

/// One typed output of a query, keyed by the entity identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord<T> {
    /// The stable key of the entity.
    pub identifier: Identifier,
    /// The typed output built from the merged fields.
    pub payload: T,
}

impl<T> ResultRecord<T> {
    /// Creates a new result record.
    pub fn new(identifier: Identifier, payload: T) -> Self {
        Self { identifier, payload }
    }

    /// Consumes the record and returns the payload.
    pub fn into_payload(self) -> T {
        self.payload
    }
}
