//! Response wrapper with completion status

use crate::error::Error;

/// The result of a best-effort query: the records gathered plus whether the
/// operation ran to completion.
///
/// # Example
///
/// ```ignore
/// let response = operation
///     .execute_best_effort(&transport, fields, &cancel)
///     .await?;
///
/// if let Some(err) = response.error() {
///     eprintln!("partial result: {}", err);
/// }
///
/// let records = response.into_inner();
/// ```
#[derive(Debug)]
pub struct Response<T> {
    data: T,
    /// Whether the operation finished or stopped early.
    pub completion: Completion,
    /// Counters collected while running.
    pub stats: QueryStats,
}

impl<T> Response<T> {
    /// Creates a complete response.
    pub fn complete(data: T, stats: QueryStats) -> Self {
        Self {
            data,
            completion: Completion::Complete,
            stats,
        }
    }

    /// Creates a response for an operation that stopped with `error`.
    pub fn incomplete(data: T, error: Error, stats: QueryStats) -> Self {
        Self {
            data,
            completion: Completion::Incomplete(error),
            stats,
        }
    }

    /// Returns `true` if every batch ran to completion.
    pub fn is_complete(&self) -> bool {
        matches!(self.completion, Completion::Complete)
    }

    /// Returns the error that stopped the operation, if any.
    pub fn error(&self) -> Option<&Error> {
        match &self.completion {
            Completion::Complete => None,
            Completion::Incomplete(error) => Some(error),
        }
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the response and returns the inner data, complete or not.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Consumes the response, discarding partial data on failure.
    pub fn into_result(self) -> Result<T, Error> {
        match self.completion {
            Completion::Complete => Ok(self.data),
            Completion::Incomplete(error) => Err(error),
        }
    }

    /// Maps the inner data using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Response<U> {
        Response {
            data: f(self.data),
            completion: self.completion,
            stats: self.stats,
        }
    }
}

/// Completion status of a query.
#[derive(Debug)]
pub enum Completion {
    /// Every batch reached its last page.
    Complete,
    /// The operation stopped early; the data holds what was merged before.
    Incomplete(Error),
}

/// Counters for one query execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Number of batches the input was split into.
    pub batches: usize,
    /// Number of transport calls, retries included.
    pub requests: usize,
    /// Number of retried calls.
    pub retries: usize,
    /// Number of responses merged into the result.
    pub pages: usize,
}

impl QueryStats {
    /// Adds another set of counters to this one.
    pub fn add(&mut self, other: &QueryStats) {
        self.batches += other.batches;
        self.requests += other.requests;
        self.retries += other.retries;
        self.pages += other.pages;
    }
}
