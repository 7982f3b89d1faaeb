//! Error types

mod api;
mod extract;
mod field;
mod param;
mod query;
mod transport;

pub use api::*;
pub use extract::*;
pub use field::*;
pub use param::*;
pub use query::*;
pub use transport::*;
