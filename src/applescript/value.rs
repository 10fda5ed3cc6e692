// Decoded AppleScript values

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record fields in the order AppleScript printed them.
pub type Record = IndexMap<String, ParsedValue>;

/// A value decoded from AppleScript's textual output.
///
/// Serializes untagged, so a tree maps directly onto JSON
/// (`Missing` becomes `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedValue {
    /// AppleScript's `missing value`
    Missing,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ParsedValue>),
    Record(Record),
}

impl ParsedValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, ParsedValue::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParsedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Plain text for a value: strings as-is, `None` for missing values,
    /// everything else in literal form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            ParsedValue::Missing => None,
            ParsedValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::format::format_value(self))
    }
}

impl From<bool> for ParsedValue {
    fn from(value: bool) -> Self {
        ParsedValue::Bool(value)
    }
}

impl From<i64> for ParsedValue {
    fn from(value: i64) -> Self {
        ParsedValue::Integer(value)
    }
}

impl From<u32> for ParsedValue {
    fn from(value: u32) -> Self {
        ParsedValue::Integer(i64::from(value))
    }
}

impl From<f64> for ParsedValue {
    fn from(value: f64) -> Self {
        ParsedValue::Float(value)
    }
}

impl From<&str> for ParsedValue {
    fn from(value: &str) -> Self {
        ParsedValue::String(value.to_string())
    }
}

impl From<String> for ParsedValue {
    fn from(value: String) -> Self {
        ParsedValue::String(value)
    }
}

impl<T: Into<ParsedValue>> From<Option<T>> for ParsedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParsedValue::Missing)
    }
}

impl<T: Into<ParsedValue>> From<Vec<T>> for ParsedValue {
    fn from(values: Vec<T>) -> Self {
        ParsedValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Record> for ParsedValue {
    fn from(record: Record) -> Self {
        ParsedValue::Record(record)
    }
}
