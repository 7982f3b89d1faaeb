//! Typed client framework for MediaWiki-style action API queries
//!
//! Declare what to fetch as a [`QueryOperation`](api::query::QueryOperation)
//! (a [`ParamSet`](api::params::ParamSet), an
//! [`Extractor`](api::extract::Extractor) and an output type) and run it
//! against any [`Transport`](transport::Transport). The framework batches
//! oversized inputs, follows continuation tokens and merges partial entities
//! into one ordered result.

pub mod api;
pub mod error;
pub mod model;
pub mod rate_limit;
pub mod response;
pub mod transport;

pub use response::Completion;
pub use response::QueryStats;
pub use response::Response;
