//! Declarative parameter model.
//!
//! - [`Param`] - one wire parameter: name, prefix, multiplicity, default
//! - [`ParamSet`] - an ordered, validated collection of params that resolves
//!   caller values into one [`RequestFrame`] per batch

mod frame;
mod param;
mod set;

pub use frame::RequestFrame;
pub use param::JoinRule;
pub use param::Multiplicity;
pub use param::Param;
pub use set::ParamSet;
pub use set::ParamSetBuilder;
