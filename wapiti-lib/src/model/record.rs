//! Raw entity record and the output type contract

use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use super::Identifier;
use crate::error::FieldError;

/// One entity from a query result: its identifier and raw fields.
///
/// Records are what the extractor produces and what the accumulator merges.
/// Typed getters give checked access to the fields.
///
/// # Example
///
/// ```
/// use wapiti_lib::model::Record;
///
/// let record = Record::new("1")
///     .set("title", "Coffee")
///     .set("length", 4096);
///
/// assert_eq!(record.get_string("title").unwrap(), Some("Coffee"));
/// assert_eq!(record.get_long("length").unwrap(), Some(4096));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The stable key of the entity.
    pub(crate) identifier: Identifier,

    /// The field values.
    pub(crate) fields: Map<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new(identifier: impl Into<Identifier>) -> Self {
        Self {
            identifier: identifier.into(),
            fields: Map::new(),
        }
    }

    /// Creates a record from a raw JSON object.
    pub fn from_map(identifier: impl Into<Identifier>, fields: Map<String, Value>) -> Self {
        Self {
            identifier: identifier.into(),
            fields,
        }
    }

    /// Returns the entity identifier.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record and returns its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(field, "string", type_name(other))),
        }
    }

    /// Gets a boolean field value.
    ///
    /// MediaWiki marks boolean flags by the presence of an empty string
    /// (`"new": ""`), so an empty string reads as `true`.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.is_empty() => Ok(Some(true)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", type_name(other))),
        }
    }

    /// Gets an i64 field value.
    pub fn get_long(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| FieldError::type_mismatch(field, "long", "float")),
            Some(other) => Err(FieldError::type_mismatch(field, "long", type_name(other))),
        }
    }

    /// Gets an f64 field value.
    pub fn get_float(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(FieldError::type_mismatch(field, "float", type_name(other))),
        }
    }

    /// Gets an array field value.
    pub fn get_array(&self, field: &str) -> Result<Option<&Vec<Value>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(FieldError::type_mismatch(field, "array", type_name(other))),
        }
    }

    /// Gets an object field value.
    pub fn get_object(&self, field: &str) -> Result<Option<&Map<String, Value>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Object(obj)) => Ok(Some(obj)),
            Some(other) => Err(FieldError::type_mismatch(field, "object", type_name(other))),
        }
    }

    /// Deserializes the whole record into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, FieldError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| FieldError::invalid(self.identifier.as_str(), e.to_string()))
    }
}

/// Returns a short name for the JSON type of a value.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "long",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Output type contract
// =============================================================================

/// Types a query operation can produce from a merged [`Record`].
///
/// # Example
///
/// ```
/// use wapiti_lib::error::FieldError;
/// use wapiti_lib::model::{FromFields, Record};
///
/// struct Title(String);
///
/// impl FromFields for Title {
///     fn from_fields(record: Record) -> Result<Self, FieldError> {
///         let title = record
///             .get_string("title")?
///             .ok_or_else(|| FieldError::missing("title"))?;
///         Ok(Title(title.to_string()))
///     }
/// }
/// ```
pub trait FromFields: Sized {
    /// Builds the output value from a record.
    fn from_fields(record: Record) -> Result<Self, FieldError>;
}

impl FromFields for Record {
    fn from_fields(record: Record) -> Result<Self, FieldError> {
        Ok(record)
    }
}

/// Output adapter that deserializes each record with serde.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use wapiti_lib::model::{FromFields, Json, Record};
///
/// #[derive(Deserialize)]
/// struct Page {
///     title: String,
/// }
///
/// let record = Record::new("1").set("title", "Coffee");
/// let Json(page) = Json::<Page>::from_fields(record).unwrap();
/// assert_eq!(page.title, "Coffee");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwraps the deserialized value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> FromFields for Json<T> {
    fn from_fields(record: Record) -> Result<Self, FieldError> {
        record.deserialize().map(Json)
    }
}
