//! Stable entity identifier

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// The stable key of one entity in a query result (e.g. a page id).
///
/// Identifiers are compared as strings so that numeric ids (`1`), string ids
/// and the object keys of missing pages (`"-1"`) all share one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Creates a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an identifier out of a raw JSON value.
    ///
    /// Accepts strings and integers. Anything else yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self(s.clone())),
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the identifier as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<i64> for Identifier {
    fn from(v: i64) -> Self {
        Self(v.to_string())
    }
}

impl From<u64> for Identifier {
    fn from(v: u64) -> Self {
        Self(v.to_string())
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
