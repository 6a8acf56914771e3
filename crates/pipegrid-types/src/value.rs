use serde::{Deserialize, Serialize};
use std::fmt;

/// Value stored under one field of a cell.
///
/// Editors only ever write text or numbers. The remaining variants exist so
/// that any draft handed back by the caller deserializes; a corrupted draft
/// must never block the rest of the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<CellValue>),
    Other(serde_json::Value),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Number value; non-finite input has no JSON form and becomes `Null`.
    pub fn number(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Null)
    }

    /// Truthiness as the review editors understand it: empty text, zero,
    /// `false` and null do not count as data.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Flag(flag) => *flag,
            CellValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            CellValue::Text(s) => !s.is_empty(),
            CellValue::List(_) | CellValue::Other(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CellValue]> {
        match self {
            CellValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Display form cut to `max` characters, used by the "current data" list.
    pub fn preview(&self, max: usize) -> String {
        self.to_string().chars().take(max).collect()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            CellValue::Flag(flag) => write!(f, "{}", flag),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::List(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            CellValue::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::number(n)
    }
}

impl From<bool> for CellValue {
    fn from(flag: bool) -> Self {
        CellValue::Flag(flag)
    }
}
