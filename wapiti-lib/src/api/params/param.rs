//! Single wire-parameter descriptor.

use crate::model::FieldValue;

/// Separator used by the API between multi-value items.
const PIPE: char = '|';

/// Alternate separator when an item itself contains a pipe.
const UNIT_SEPARATOR: char = '\u{1f}';

/// How a param receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// Fixed at declaration time, never supplied by the caller.
    Static,
    /// One scalar supplied by the caller.
    Single,
    /// An ordered list of scalars supplied by the caller.
    Multi,
}

/// How the items of a multi-value param are joined into one wire value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum JoinRule {
    /// `a|b|c`, switching to U+001F separators (with a leading U+001F) when
    /// any item contains a pipe.
    #[default]
    Pipe,
    /// `a,b,c`.
    Comma,
    /// Any other separator.
    Custom(String),
}

impl JoinRule {
    /// Joins items into a single wire value.
    pub fn join(&self, items: &[String]) -> String {
        match self {
            Self::Pipe if items.iter().any(|i| i.contains(PIPE)) => {
                let mut joined = String::from(UNIT_SEPARATOR);
                joined.push_str(&items.join(&UNIT_SEPARATOR.to_string()));
                joined
            }
            Self::Pipe => items.join("|"),
            Self::Comma => items.join(","),
            Self::Custom(sep) => items.join(sep),
        }
    }
}

/// Declares how one logical field becomes a `(name, value)` pair on the wire.
///
/// Params are immutable once placed in a [`ParamSet`](super::ParamSet).
///
/// # Example
///
/// ```
/// use wapiti_lib::api::params::Param;
///
/// let prop = Param::fixed("prop", "info");
/// let titles = Param::multi("titles").required().batched().unprefixed();
/// let limit = Param::single("limit").prefix("in").default_value(10u32);
///
/// assert_eq!(prop.wire_name(), "prop");
/// assert_eq!(limit.wire_name(), "inlimit");
/// assert!(titles.is_batched());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    prefix: Option<String>,
    auto_prefix: bool,
    multiplicity: Multiplicity,
    required: bool,
    default: Option<FieldValue>,
    join: JoinRule,
    batched: bool,
}

impl Param {
    fn new(name: impl Into<String>, multiplicity: Multiplicity) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            auto_prefix: true,
            multiplicity,
            required: false,
            default: None,
            join: JoinRule::default(),
            batched: false,
        }
    }

    /// Declares a static param whose value is always sent.
    ///
    /// Static params are never auto-prefixed; give the full wire name.
    pub fn fixed(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let mut param = Self::new(name, Multiplicity::Static);
        param.auto_prefix = false;
        param.default = Some(value.into());
        param
    }

    /// Declares a single-value param.
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(name, Multiplicity::Single)
    }

    /// Declares a multi-value param.
    pub fn multi(name: impl Into<String>) -> Self {
        Self::new(name, Multiplicity::Multi)
    }

    /// Marks the param as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value used when the caller supplies none.
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets an explicit wire-name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Opts out of the set's field prefix.
    pub fn unprefixed(mut self) -> Self {
        self.auto_prefix = false;
        self
    }

    /// Sets the join rule for multi-value items.
    pub fn join(mut self, join: JoinRule) -> Self {
        self.join = join;
        self
    }

    /// Marks this multi-value param as the one split across batches.
    pub fn batched(mut self) -> Self {
        self.batched = true;
        self
    }

    /// Applies the set's field prefix if this param accepts one.
    pub(crate) fn apply_field_prefix(&mut self, prefix: &str) {
        if self.auto_prefix && self.prefix.is_none() {
            self.prefix = Some(prefix.to_string());
        }
    }

    /// Returns the logical field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name sent on the wire (`prefix + name`).
    pub fn wire_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the multiplicity.
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Returns `true` if the caller must supply a value (or a default exists).
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns `true` if the value is fixed at declaration time.
    pub fn is_static(&self) -> bool {
        self.multiplicity == Multiplicity::Static
    }

    /// Returns `true` if this param is split across batches.
    pub fn is_batched(&self) -> bool {
        self.batched
    }

    /// Returns the default (or static) value.
    pub fn value(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    /// Returns the join rule.
    pub fn join_rule(&self) -> &JoinRule {
        &self.join
    }

    /// Encodes a value for the wire.
    ///
    /// A multi-value param joins even a single value, as a one-item list.
    pub(crate) fn encode(&self, value: &FieldValue) -> String {
        match value {
            FieldValue::Single(v) if self.multiplicity == Multiplicity::Multi => {
                self.join.join(std::slice::from_ref(v))
            }
            FieldValue::Single(v) => v.clone(),
            FieldValue::Multi(items) => self.join.join(items),
        }
    }
}
