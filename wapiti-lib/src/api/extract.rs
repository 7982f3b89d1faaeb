//! Mapping of raw response bodies into records and continuation tokens.

use log::warn;
use serde_json::Map;
use serde_json::Value;

use super::params::RequestFrame;
use crate::error::ApiErrorDetail;
use crate::error::ExtractError;
use crate::model::Identifier;
use crate::model::Record;
use crate::model::type_name;

/// Section holding the server-reported error.
const ERROR_KEY: &str = "error";

/// Section holding non-fatal server warnings.
const WARNINGS_KEY: &str = "warnings";

/// Pre-1.26 continuation section, grouped by module.
const LEGACY_CONTINUATION_KEY: &str = "query-continue";

/// Opaque continuation data echoed back to fetch the next page.
///
/// Holds the flattened `name → value` pairs of the response's continuation
/// section. An empty section is never turned into a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationToken {
    params: Vec<(String, String)>,
}

impl ContinuationToken {
    /// Builds a token from explicit pairs. Returns `None` if there are none.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Option<Self> {
        let params: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        (!params.is_empty()).then_some(Self { params })
    }

    /// Returns the value of one token field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the token fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of token fields.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the token has no fields.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Writes the token fields into a frame, replacing existing values.
    pub fn apply_to(&self, frame: &mut RequestFrame) {
        for (name, value) in &self.params {
            frame.set(name.clone(), value.clone());
        }
    }
}

/// The outcome of extracting one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Records in server order.
    pub records: Vec<Record>,
    /// Continuation for the next page, if the server sent one.
    pub continuation: Option<ContinuationToken>,
}

/// Extracts records and continuation from response bodies.
///
/// The result container is found by walking `result_path` from the root of
/// the body. It may be an object keyed by id or an array of entities. Each
/// entity must be a JSON object; its identifier comes from `id_field`,
/// falling back to the object key (or the `title` field inside arrays).
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use wapiti_lib::api::extract::Extractor;
///
/// let extractor = Extractor::new(["query", "pages"]);
/// let extraction = extractor
///     .extract(&json!({
///         "continue": {"incontinue": "42", "continue": "||"},
///         "query": {"pages": {"42": {"pageid": 42, "title": "Tea"}}}
///     }))
///     .unwrap();
///
/// assert_eq!(extraction.records.len(), 1);
/// assert_eq!(extraction.records[0].identifier().as_str(), "42");
/// assert_eq!(extraction.continuation.unwrap().get("incontinue"), Some("42"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extractor {
    result_path: Vec<String>,
    continuation_key: String,
    id_field: String,
}

impl Extractor {
    /// Creates an extractor for the result container at `result_path`.
    ///
    /// Defaults: continuation section `continue`, id field `pageid`.
    pub fn new<S: Into<String>>(result_path: impl IntoIterator<Item = S>) -> Self {
        Self {
            result_path: result_path.into_iter().map(Into::into).collect(),
            continuation_key: "continue".to_string(),
            id_field: "pageid".to_string(),
        }
    }

    /// Sets the name of the continuation section.
    pub fn continuation_key(mut self, key: impl Into<String>) -> Self {
        self.continuation_key = key.into();
        self
    }

    /// Sets the field holding each entity's stable id.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Returns the path to the result container.
    pub fn result_path(&self) -> &[String] {
        &self.result_path
    }

    /// Returns the dotted result path, for messages.
    pub fn result_section(&self) -> String {
        self.result_path.join(".")
    }

    /// Parses and extracts a raw response body.
    pub fn extract_str(&self, body: &str) -> Result<Extraction, ExtractError> {
        let body: Value = serde_json::from_str(body)
            .map_err(|e| ExtractError::malformed(format!("response is not JSON: {}", e)))?;
        self.extract(&body)
    }

    /// Extracts records and continuation from a parsed response body.
    pub fn extract(&self, body: &Value) -> Result<Extraction, ExtractError> {
        let root = body.as_object().ok_or_else(|| {
            ExtractError::malformed(format!(
                "response is a JSON {}, expected object",
                type_name(body)
            ))
        })?;

        if let Some(error) = root.get(ERROR_KEY) {
            return Err(ExtractError::Api(Box::new(ApiErrorDetail::from_json(error))));
        }
        if let Some(warnings) = root.get(WARNINGS_KEY) {
            warn!("server warnings: {}", warnings);
        }

        let container = self.locate(body)?;
        let records = match container {
            Value::Object(entities) => self.records_from_object(entities)?,
            Value::Array(entities) => self.records_from_array(entities)?,
            other => {
                return Err(ExtractError::malformed(format!(
                    "result section '{}' is a {}, expected object or array",
                    self.result_section(),
                    type_name(other)
                )));
            }
        };

        Ok(Extraction {
            records,
            continuation: self.continuation(root),
        })
    }

    fn locate<'a>(&self, body: &'a Value) -> Result<&'a Value, ExtractError> {
        let mut current = body;
        for key in &self.result_path {
            current = current.get(key).ok_or_else(|| {
                ExtractError::malformed(format!(
                    "missing result section '{}'",
                    self.result_section()
                ))
            })?;
        }
        Ok(current)
    }

    fn records_from_object(
        &self,
        entities: &Map<String, Value>,
    ) -> Result<Vec<Record>, ExtractError> {
        entities
            .iter()
            .map(|(key, entity)| {
                let fields = entity_fields(entity, key)?;
                let identifier = fields
                    .get(&self.id_field)
                    .and_then(Identifier::from_json)
                    .unwrap_or_else(|| Identifier::new(key.as_str()));
                Ok(Record::from_map(identifier, fields.clone()))
            })
            .collect()
    }

    fn records_from_array(&self, entities: &[Value]) -> Result<Vec<Record>, ExtractError> {
        entities
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let fields = entity_fields(entity, &index.to_string())?;
                let identifier = fields
                    .get(&self.id_field)
                    .or_else(|| fields.get("title"))
                    .and_then(Identifier::from_json)
                    .ok_or_else(|| {
                        ExtractError::malformed(format!(
                            "entity {} has no '{}' field",
                            index, self.id_field
                        ))
                    })?;
                Ok(Record::from_map(identifier, fields.clone()))
            })
            .collect()
    }

    fn continuation(&self, root: &Map<String, Value>) -> Option<ContinuationToken> {
        let mut pairs = Vec::new();

        if let Some(Value::Object(section)) = root.get(&self.continuation_key) {
            pairs.extend(section.iter().map(|(k, v)| (k.clone(), wire_value(v))));
        }

        // Legacy form nests params under the module that produced them.
        if let Some(Value::Object(modules)) = root.get(LEGACY_CONTINUATION_KEY) {
            for params in modules.values().filter_map(Value::as_object) {
                pairs.extend(params.iter().map(|(k, v)| (k.clone(), wire_value(v))));
            }
        }

        ContinuationToken::from_pairs(pairs)
    }
}

fn entity_fields<'a>(entity: &'a Value, key: &str) -> Result<&'a Map<String, Value>, ExtractError> {
    entity.as_object().ok_or_else(|| {
        ExtractError::malformed(format!(
            "entity '{}' is a {}, expected object",
            key,
            type_name(entity)
        ))
    })
}

fn wire_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
