//! Request/response loop that follows continuation tokens.

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use futures::future::join_all;
use log::debug;
use log::trace;
use log::warn;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::Accumulator;
use super::QueryOptions;
use crate::api::extract::ContinuationToken;
use crate::api::extract::Extractor;
use crate::api::params::RequestFrame;
use crate::error::Error;
use crate::error::ErrorContext;
use crate::error::ExtractError;
use crate::error::TransportError;
use crate::model::Record;
use crate::response::QueryStats;
use crate::transport::Transport;

/// Observable states of one batch in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing sent yet.
    Start,
    /// A request is in flight (including retries).
    AwaitingResponse,
    /// A response is being extracted and merged.
    Merging,
    /// Deciding whether to follow a continuation token.
    Continuing,
    /// The batch has no more pages.
    Done,
    /// The batch stopped on an error, cancellation or a failed sibling.
    Failed,
}

/// A batch's position in the loop, with the data each state carries.
enum Step {
    Start,
    AwaitingResponse(RequestFrame),
    Merging(String),
    Continuing(Option<ContinuationToken>),
    Done,
    Failed(Error),
    /// Stopped because another batch failed.
    Aborted,
}

impl Step {
    fn state(&self) -> EngineState {
        match self {
            Self::Start => EngineState::Start,
            Self::AwaitingResponse(_) => EngineState::AwaitingResponse,
            Self::Merging(_) => EngineState::Merging,
            Self::Continuing(_) => EngineState::Continuing,
            Self::Done => EngineState::Done,
            Self::Failed(_) | Self::Aborted => EngineState::Failed,
        }
    }
}

enum BatchEnd {
    Done,
    Failed(Error),
    Aborted,
}

#[derive(Default)]
struct Counters {
    requests: AtomicUsize,
    retries: AtomicUsize,
    pages: AtomicUsize,
}

impl Counters {
    fn snapshot(&self, batches: usize) -> QueryStats {
        QueryStats {
            batches,
            requests: self.requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
        }
    }
}

/// What the engine produced: merged records, and the error that stopped it.
#[derive(Debug)]
pub struct EngineOutcome {
    /// Merged records in first-seen order. Partial when `error` is set.
    pub records: Vec<Record>,
    /// The terminal error, if any batch failed.
    pub error: Option<Error>,
    /// Counters for the run.
    pub stats: QueryStats,
}

impl EngineOutcome {
    /// Returns the final state: `Done` if every batch finished.
    pub fn state(&self) -> EngineState {
        match self.error {
            None => EngineState::Done,
            Some(_) => EngineState::Failed,
        }
    }
}

/// Drives the request loop for a set of resolved frames.
///
/// Each frame is one batch. Within a batch, requests are strictly sequential:
/// send, extract, merge, then follow the continuation token (if any) with a
/// new frame built from the batch's frame plus the token. Batches run
/// concurrently up to the options' concurrency limit and merge into one
/// shared [`Accumulator`].
///
/// Cancellation is checked before each dispatch and before each
/// continuation decision. A response that arrives after cancellation is
/// dropped. When one batch fails, the others stop at their next check.
///
/// A batch fails with [`Error::ContinuationLimitExceeded`] when page
/// `max_pages + 1` still carries a continuation token.
pub struct ContinuationEngine<'a, T: ?Sized> {
    operation: &'a str,
    extractor: &'a Extractor,
    options: &'a QueryOptions,
    transport: &'a T,
    cancel: CancellationToken,
}

impl<'a, T: Transport + ?Sized> ContinuationEngine<'a, T> {
    /// Creates a new engine.
    pub fn new(
        operation: &'a str,
        extractor: &'a Extractor,
        options: &'a QueryOptions,
        transport: &'a T,
    ) -> Self {
        Self {
            operation,
            extractor,
            options,
            transport,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses a caller-owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs every batch to completion or failure.
    pub async fn run(&self, frames: Vec<RequestFrame>) -> EngineOutcome {
        let batches = frames.len();
        let accumulator = Mutex::new(Accumulator::new());
        let counters = Counters::default();
        // Child token: a failing batch stops its siblings without touching
        // the caller's token.
        let abort = self.cancel.child_token();

        let runs = join_all(frames.into_iter().enumerate().map(|(batch, frame)| {
            self.run_batch(batch, frame, &accumulator, &abort, &counters)
        }));

        let error = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, runs).await {
                Ok(ends) => first_error(ends),
                Err(_) => Some(Error::Timeout {
                    context: ErrorContext::operation(self.operation),
                    elapsed: limit,
                }),
            },
            None => first_error(runs.await),
        };

        let records = accumulator.into_inner().into_records();
        let stats = counters.snapshot(batches);
        debug!(
            "{}: {} record(s) from {} batch(es), {} request(s), {}",
            self.operation,
            records.len(),
            stats.batches,
            stats.requests,
            match &error {
                None => "done".to_string(),
                Some(e) => format!("failed: {}", e),
            }
        );

        EngineOutcome { records, error, stats }
    }

    async fn run_batch(
        &self,
        batch: usize,
        base: RequestFrame,
        accumulator: &Mutex<Accumulator>,
        abort: &CancellationToken,
        counters: &Counters,
    ) -> BatchEnd {
        let _permit = self.options.concurrency.acquire().await;
        let mut page = 0;
        let mut step = Step::Start;

        loop {
            trace!("{}: batch {} page {} {:?}", self.operation, batch, page, step.state());

            step = match step {
                Step::Start => Step::AwaitingResponse(base.clone()),
                Step::AwaitingResponse(frame) => match self.interruption(abort, batch, page) {
                    Some(stop) => stop,
                    None => {
                        page += 1;
                        match self.dispatch(&frame, batch, page, abort, counters).await {
                            Ok(body) => Step::Merging(body),
                            Err(stop) => stop,
                        }
                    }
                },
                Step::Merging(body) => match self.interruption(abort, batch, page) {
                    Some(stop) => stop,
                    None => match self.extractor.extract_str(&body) {
                        Ok(extraction) => {
                            let count = extraction.records.len();
                            accumulator.lock().await.merge_page(batch, page, extraction.records);
                            counters.pages.fetch_add(1, Ordering::Relaxed);
                            trace!(
                                "{}: batch {} page {} merged {} record(s)",
                                self.operation,
                                batch,
                                page,
                                count
                            );
                            Step::Continuing(extraction.continuation)
                        }
                        Err(e) => Step::Failed(self.extract_error(e, batch, page)),
                    },
                },
                Step::Continuing(token) => match (self.interruption(abort, batch, page), token) {
                    (Some(stop), _) => stop,
                    (None, None) => Step::Done,
                    (None, Some(_)) if page > self.options.max_pages => {
                        Step::Failed(Error::ContinuationLimitExceeded {
                            context: self.context(batch, page),
                            max_pages: self.options.max_pages,
                        })
                    }
                    (None, Some(token)) => {
                        let mut next = base.clone();
                        token.apply_to(&mut next);
                        Step::AwaitingResponse(next)
                    }
                },
                Step::Done => return BatchEnd::Done,
                Step::Failed(error) => {
                    abort.cancel();
                    return BatchEnd::Failed(error);
                }
                Step::Aborted => return BatchEnd::Aborted,
            };
        }
    }

    /// Sends one frame, retrying transport failures per the retry config.
    async fn dispatch(
        &self,
        frame: &RequestFrame,
        batch: usize,
        page: usize,
        abort: &CancellationToken,
        counters: &Counters,
    ) -> Result<String, Step> {
        let retry = &self.options.retry;
        let mut retries = 0;

        loop {
            if let Some(limiter) = &self.options.rate_limiter {
                tokio::select! {
                    _ = limiter.acquire() => {}
                    _ = abort.cancelled() => {}
                }
            }
            if let Some(stop) = self.interruption(abort, batch, page) {
                return Err(stop);
            }

            debug!("{}: batch {} page {} sending {}", self.operation, batch, page, frame);
            counters.requests.fetch_add(1, Ordering::Relaxed);
            let error = match self.send(frame).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if !retry.should_retry(&error, retries) {
                return Err(Step::Failed(Error::Transport {
                    context: self.context(batch, page),
                    attempts: retries + 1,
                    source: error,
                }));
            }

            let delay = retry.delay_for(&error, retries);
            warn!(
                "{}: batch {} page {} attempt {} failed ({}), retrying in {:?}",
                self.operation,
                batch,
                page,
                retries + 1,
                error,
                delay
            );
            retries += 1;
            counters.retries.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = abort.cancelled() => {}
            }
            if let Some(stop) = self.interruption(abort, batch, page) {
                return Err(stop);
            }
        }
    }

    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError> {
        match self.options.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send(frame))
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => self.transport.send(frame).await,
        }
    }

    /// Returns the step to stop at if the batch has been told to stop.
    fn interruption(&self, abort: &CancellationToken, batch: usize, page: usize) -> Option<Step> {
        if !abort.is_cancelled() {
            return None;
        }
        if self.cancel.is_cancelled() {
            Some(Step::Failed(Error::Cancelled {
                context: self.context(batch, page),
            }))
        } else {
            Some(Step::Aborted)
        }
    }

    fn context(&self, batch: usize, page: usize) -> ErrorContext {
        let mut context = ErrorContext::page(self.operation, batch, page);
        if page == 0 {
            context.page = None;
        }
        context
    }

    fn extract_error(&self, error: ExtractError, batch: usize, page: usize) -> Error {
        let context = self.context(batch, page);
        match error {
            ExtractError::Malformed(message) => Error::MalformedResponse { context, message },
            ExtractError::Api(detail) => Error::Api { context, detail },
        }
    }
}

/// Picks the terminal error of the lowest failed batch.
fn first_error(ends: Vec<BatchEnd>) -> Option<Error> {
    ends.into_iter().find_map(|end| match end {
        BatchEnd::Failed(error) => Some(error),
        BatchEnd::Done | BatchEnd::Aborted => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StaticTransport;

    fn frames(n: usize) -> Vec<RequestFrame> {
        (0..n)
            .map(|i| RequestFrame::new().with("titles", format!("T{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_single_page_is_done() {
        let transport = StaticTransport::new(r#"{"query": {"pages": {"1": {"pageid": 1}}}}"#);
        let extractor = Extractor::new(["query", "pages"]);
        let options = QueryOptions::default();

        let outcome = ContinuationEngine::new("test", &extractor, &options, &transport)
            .run(frames(1))
            .await;

        assert_eq!(outcome.state(), EngineState::Done);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.requests, 1);
        assert_eq!(outcome.stats.pages, 1);
    }

    #[tokio::test]
    async fn test_no_frames() {
        let transport = StaticTransport::new("{}");
        let extractor = Extractor::new(["query", "pages"]);
        let options = QueryOptions::default();

        let outcome = ContinuationEngine::new("test", &extractor, &options, &transport)
            .run(Vec::new())
            .await;

        assert_eq!(outcome.state(), EngineState::Done);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats, QueryStats::default());
    }

    #[tokio::test]
    async fn test_same_entity_across_batches_merges_once() {
        let transport = StaticTransport::new(r#"{"query": {"pages": {"5": {"pageid": 5}}}}"#);
        let extractor = Extractor::new(["query", "pages"]);
        let options = QueryOptions::default();

        let outcome = ContinuationEngine::new("test", &extractor, &options, &transport)
            .run(frames(3))
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.stats.batches, 3);
        assert_eq!(outcome.stats.requests, 3);
    }

    #[tokio::test]
    async fn test_zero_page_limit_allows_one_request() {
        let transport =
            StaticTransport::new(r#"{"continue": {"gapcontinue": "B"}, "query": {"pages": {}}}"#);
        let extractor = Extractor::new(["query", "pages"]);
        let options = QueryOptions::default().max_pages(0);

        let outcome = ContinuationEngine::new("test", &extractor, &options, &transport)
            .run(frames(1))
            .await;

        assert_eq!(outcome.state(), EngineState::Failed);
        assert!(matches!(
            outcome.error,
            Some(Error::ContinuationLimitExceeded { max_pages: 0, .. })
        ));
        assert_eq!(outcome.stats.requests, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let transport = StaticTransport::new("{}");
        let extractor = Extractor::new(["query", "pages"]);
        let options = QueryOptions::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = ContinuationEngine::new("test", &extractor, &options, &transport)
            .with_cancellation(cancel)
            .run(frames(2))
            .await;

        match outcome.error {
            Some(Error::Cancelled { context }) => {
                assert_eq!(context.batch, Some(0));
                assert_eq!(context.page, None);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(outcome.stats.requests, 0);
    }
}
