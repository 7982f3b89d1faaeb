//! Typed query operation facade.

use std::marker::PhantomData;

use log::debug;
use tokio_util::sync::CancellationToken;

use super::ContinuationEngine;
use super::EngineOutcome;
use super::QueryOptions;
use super::ResultRecord;
use crate::api::extract::Extractor;
use crate::api::params::ParamSet;
use crate::api::params::RequestFrame;
use crate::error::Error;
use crate::model::FieldValues;
use crate::model::FromFields;
use crate::model::Record;
use crate::response::Response;
use crate::transport::Transport;

/// A declared query: params, extraction rules, tunables and an output type.
///
/// Concrete operations are values of this type, not subclasses. Build one
/// with [`QueryOperation::new`] and run it against any [`Transport`].
///
/// # Example
///
/// ```ignore
/// use wapiti_lib::api::extract::Extractor;
/// use wapiti_lib::api::params::{Param, ParamSet};
/// use wapiti_lib::api::query::QueryOperation;
/// use wapiti_lib::model::{FieldValues, Record};
///
/// let params = ParamSet::builder()
///     .param(Param::fixed("action", "query"))
///     .param(Param::fixed("format", "json"))
///     .param(Param::multi("titles").required().batched())
///     .build()?;
///
/// let extractor = Extractor::new(["query", "pages"]);
/// let operation = QueryOperation::<Record>::new("pages", params, extractor);
/// let pages = operation
///     .execute(&transport, &FieldValues::new().set("titles", ["Coffee", "Tea"]))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryOperation<T> {
    name: String,
    params: ParamSet,
    extractor: Extractor,
    options: QueryOptions,
    output: PhantomData<fn() -> T>,
}

impl<T: FromFields> QueryOperation<T> {
    /// Creates an operation with default options.
    pub fn new(name: impl Into<String>, params: ParamSet, extractor: Extractor) -> Self {
        Self {
            name: name.into(),
            params,
            extractor,
            options: QueryOptions::default(),
            output: PhantomData,
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared params.
    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    /// Returns the extractor.
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Returns the options.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Validates caller values and resolves them into one frame per batch.
    ///
    /// No request is sent.
    pub fn resolve(&self, fields: &FieldValues) -> Result<Vec<RequestFrame>, Error> {
        self.params
            .resolve(fields, self.options.max_batch_size)
            .map_err(|e| e.into_error(&self.name))
    }

    /// Runs the query and returns the typed outputs in first-seen order.
    pub async fn execute<R: Transport + ?Sized>(
        &self,
        transport: &R,
        fields: &FieldValues,
    ) -> Result<Vec<T>, Error> {
        let records = self.execute_records(transport, fields).await?;
        Ok(records.into_iter().map(ResultRecord::into_payload).collect())
    }

    /// Runs the query and returns the outputs with their identifiers.
    pub async fn execute_records<R: Transport + ?Sized>(
        &self,
        transport: &R,
        fields: &FieldValues,
    ) -> Result<Vec<ResultRecord<T>>, Error> {
        self.execute_cancellable(transport, fields, &CancellationToken::new())
            .await
    }

    /// Runs the query, stopping with [`Error::Cancelled`] once `cancel` fires.
    pub async fn execute_cancellable<R: Transport + ?Sized>(
        &self,
        transport: &R,
        fields: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRecord<T>>, Error> {
        let outcome = self.run(transport, fields, cancel).await?;
        if let Some(error) = outcome.error {
            return Err(error);
        }
        outcome
            .records
            .into_iter()
            .map(|record| self.convert(record))
            .collect()
    }

    /// Runs the query and returns whatever was gathered, even on failure.
    ///
    /// Parameter errors are still returned as `Err` since nothing was sent.
    /// Any later failure is reported through [`Response::completion`]
    /// alongside the records merged before it. Records that cannot be
    /// converted are skipped and reported the same way.
    pub async fn execute_best_effort<R: Transport + ?Sized>(
        &self,
        transport: &R,
        fields: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<Response<Vec<ResultRecord<T>>>, Error> {
        let EngineOutcome { records, error, stats } = self.run(transport, fields, cancel).await?;

        let mut converted = Vec::with_capacity(records.len());
        let mut conversion_error = None;
        for record in records {
            match self.convert(record) {
                Ok(record) => converted.push(record),
                Err(e) => {
                    conversion_error.get_or_insert(e);
                }
            }
        }

        Ok(match error.or(conversion_error) {
            None => Response::complete(converted, stats),
            Some(error) => Response::incomplete(converted, error, stats),
        })
    }

    async fn run<R: Transport + ?Sized>(
        &self,
        transport: &R,
        fields: &FieldValues,
        cancel: &CancellationToken,
    ) -> Result<EngineOutcome, Error> {
        let frames = self.resolve(fields)?;
        debug!("{}: {} batch(es)", self.name, frames.len());

        let outcome = ContinuationEngine::new(&self.name, &self.extractor, &self.options, transport)
            .with_cancellation(cancel.clone())
            .run(frames)
            .await;
        Ok(outcome)
    }

    fn convert(&self, record: Record) -> Result<ResultRecord<T>, Error> {
        let identifier = record.identifier().clone();
        match T::from_fields(record) {
            Ok(payload) => Ok(ResultRecord::new(identifier, payload)),
            Err(source) => Err(Error::Conversion {
                operation: self.name.clone(),
                identifier,
                source,
            }),
        }
    }
}
