//! Query execution: the continuation engine and the typed operation facade.
//!
//! - [`QueryOperation`] - binds params, extractor, options and output type
//! - [`ContinuationEngine`] - sends requests and follows continuation tokens
//! - [`Accumulator`] - merges records by identifier across pages and batches
//! - [`QueryOptions`] - batch size, page limit, retries, concurrency, timeouts

mod accumulator;
mod engine;
mod operation;
mod options;
mod result;

pub use accumulator::Accumulator;
pub use accumulator::Sequence;
pub use engine::ContinuationEngine;
pub use engine::EngineOutcome;
pub use engine::EngineState;
pub use operation::QueryOperation;
pub use options::DEFAULT_MAX_BATCH_SIZE;
pub use options::DEFAULT_MAX_PAGES;
pub use options::QueryOptions;
pub use result::ResultRecord;
