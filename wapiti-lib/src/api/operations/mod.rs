//! Concrete operation declarations built on the query framework.

mod protection;

pub use protection::GET_PROTECTIONS;
pub use protection::get_protections;
