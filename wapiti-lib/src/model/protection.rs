//! Page protection information

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::FromFields;
use super::Identifier;
use super::Record;
use crate::error::FieldError;

/// Protection settings for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionInfo {
    /// The page identifier.
    pub page_id: Identifier,
    /// The page title, when the server reported one.
    pub title: Option<String>,
    /// Active protections, in server order.
    pub protections: Vec<Protection>,
}

impl ProtectionInfo {
    /// Returns `true` if the page has no protection at all.
    pub fn is_unprotected(&self) -> bool {
        self.protections.is_empty()
    }

    /// Returns the protection level for an action type (e.g. "edit"), if any.
    pub fn level_for(&self, kind: &str) -> Option<&str> {
        self.protections
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.level.as_str())
    }
}

/// One protection entry (`{"type": "edit", "level": "sysop", ...}`).
#[derive(Debug, Clone, PartialEq)]
pub struct Protection {
    /// The protected action ("edit", "move", "upload", ...).
    pub kind: String,
    /// The user group required to perform the action.
    pub level: String,
    /// When the protection ends, if reported.
    pub expiry: Option<Expiry>,
    /// Whether the protection cascades to transcluded pages.
    pub cascade: bool,
    /// The page this protection cascades from, if inherited.
    pub source: Option<String>,
}

/// Protection expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Never expires.
    Infinite,
    /// Expires at the given time.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Parses an expiry as reported by the API.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "infinity" | "infinite" | "indefinite" | "never" => Some(Self::Infinite),
            _ => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| Self::At(dt.with_timezone(&Utc))),
        }
    }

    /// Returns `true` if the protection has ended at `now`.
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Infinite => false,
            Self::At(at) => *at <= now,
        }
    }
}

#[derive(Deserialize)]
struct RawProtection {
    #[serde(rename = "type")]
    kind: String,
    level: String,
    expiry: Option<String>,
    cascade: Option<Value>,
    source: Option<String>,
}

impl TryFrom<RawProtection> for Protection {
    type Error = FieldError;

    fn try_from(raw: RawProtection) -> Result<Self, FieldError> {
        let expiry = match raw.expiry {
            Some(s) => Some(Expiry::parse(&s).ok_or_else(|| {
                FieldError::invalid("expiry", format!("unrecognized expiry '{}'", s))
            })?),
            None => None,
        };

        // Cascade is a presence flag ("cascade": "") in the default format.
        let cascade = match raw.cascade {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        };

        Ok(Self {
            kind: raw.kind,
            level: raw.level,
            expiry,
            cascade,
            source: raw.source,
        })
    }
}

impl FromFields for ProtectionInfo {
    fn from_fields(record: Record) -> Result<Self, FieldError> {
        let title = record.get_string("title").ok().flatten().map(str::to_string);

        // `prop=info&inprop=protection` puts the list on the page itself;
        // some proxies nest it under `info`.
        let raw = match record.get("protection") {
            Some(list) => list.clone(),
            None => record
                .get_object("info")?
                .and_then(|info| info.get("protection"))
                .cloned()
                .ok_or_else(|| FieldError::missing("protection"))?,
        };

        let raw: Vec<RawProtection> = serde_json::from_value(raw)
            .map_err(|e| FieldError::invalid("protection", e.to_string()))?;
        let protections = raw
            .into_iter()
            .map(Protection::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            page_id: record.identifier,
            title,
            protections,
        })
    }
}
