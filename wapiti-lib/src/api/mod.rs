//! Query API framework

pub mod extract;
pub mod operations;
pub mod params;
pub mod query;
