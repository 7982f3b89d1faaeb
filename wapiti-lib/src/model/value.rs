//! Caller-supplied field values

/// A value supplied by the caller for one declared field.
///
/// Single-value fields take [`FieldValue::Single`]; multi-value fields take
/// [`FieldValue::Multi`]. A single value given for a multi-value field is
/// treated as a one-element list.
///
/// # Example
///
/// ```
/// use wapiti_lib::model::FieldValue;
///
/// let limit = FieldValue::from(50u32);
/// let titles = FieldValue::from(vec!["Coffee", "Tea"]);
/// assert_eq!(titles.len(), 2);
/// assert!(!limit.is_multi());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// One scalar value.
    Single(String),
    /// An ordered sequence of scalar values.
    Multi(Vec<String>),
}

impl FieldValue {
    /// Returns `true` if this is a list value.
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Returns the number of scalars held.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(values) => values.len(),
        }
    }

    /// Returns `true` if this is an empty list.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the value into a list of scalars.
    pub fn into_values(self) -> Vec<String> {
        match self {
            Self::Single(v) => vec![v],
            Self::Multi(values) => values,
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Single(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Single(v.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        Self::Single(v.clone())
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    Self::Single(v.to_string())
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize);

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        Self::Multi(v)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self {
        Self::Multi(v.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for FieldValue {
    fn from(v: &[&str]) -> Self {
        Self::Multi(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldValue {
    fn from(v: [&str; N]) -> Self {
        Self::Multi(v.iter().map(|s| s.to_string()).collect())
    }
}

/// The field values supplied for one call, addressed by logical field name.
///
/// Insertion order is kept; setting a name twice replaces the earlier value.
///
/// # Example
///
/// ```
/// use wapiti_lib::model::FieldValues;
///
/// let fields = FieldValues::new()
///     .set("titles", ["Coffee", "Tea"])
///     .set("limit", 10u32);
/// assert!(fields.contains("titles"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    values: Vec<(String, FieldValue)>,
}

impl FieldValues {
    /// Creates an empty set of field values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder pattern).
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a field value, replacing any earlier value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Returns the value for a field, if supplied.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns `true` if a value was supplied for the field.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over the supplied names and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the number of supplied fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no fields were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}
