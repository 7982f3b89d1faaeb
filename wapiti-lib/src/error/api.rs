//! Server-reported error types

use std::collections::HashMap;

/// Error information reported in-band by the API.
///
/// MediaWiki-style APIs answer failed queries with HTTP 200 and an `error`
/// section such as `{"error": {"code": "badvalue", "info": "..."}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiErrorDetail {
    /// The machine-readable error code (e.g., "badvalue").
    pub code: String,
    /// Human-readable error message.
    pub info: String,
    /// Any other fields of the error object.
    pub additional_info: HashMap<String, serde_json::Value>,
}

impl ApiErrorDetail {
    /// Creates a new error detail with the given code and message.
    pub fn new(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            info: info.into(),
            additional_info: HashMap::new(),
        }
    }

    /// Builds the detail from the raw `error` section of a response.
    pub fn from_json(section: &serde_json::Value) -> Self {
        let Some(obj) = section.as_object() else {
            return Self::new("unknown", section.to_string());
        };

        let mut detail = Self::new(
            obj.get("code").and_then(|v| v.as_str()).unwrap_or("unknown"),
            obj.get("info")
                .or_else(|| obj.get("*"))
                .and_then(|v| v.as_str())
                .unwrap_or_default(),
        );
        detail.additional_info = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "code" | "info"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        detail
    }

    /// Checks if this error has the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code == code
    }
}

impl std::fmt::Display for ApiErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.info)
    }
}
