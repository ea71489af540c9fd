//! Dynamically typed single-cell values

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::schema::DataKind;

/// A single cell passed across dynamic interfaces (predicates, generic getters).
///
/// Every variant carries its own null, so a null still knows which kind of column it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Int(Option<i32>),
    Float(Option<f32>),
    Str(Option<String>),
    Char(Option<u8>),
    Bool(Option<bool>),
}

impl CellValue {
    /// A null of the given kind
    pub fn null(kind: DataKind) -> Self {
        match kind {
            DataKind::Int => CellValue::Int(None),
            DataKind::Float => CellValue::Float(None),
            DataKind::String => CellValue::Str(None),
            DataKind::Char => CellValue::Char(None),
            DataKind::Bool => CellValue::Bool(None),
        }
    }

    /// A single-byte character value
    pub fn char(c: u8) -> Self {
        CellValue::Char(Some(c))
    }

    pub fn kind(&self) -> DataKind {
        match self {
            CellValue::Int(_) => DataKind::Int,
            CellValue::Float(_) => DataKind::Float,
            CellValue::Str(_) => DataKind::String,
            CellValue::Char(_) => DataKind::Char,
            CellValue::Bool(_) => DataKind::Bool,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Int(v) => v.is_none(),
            CellValue::Float(v) => v.is_none(),
            CellValue::Str(v) => v.is_none(),
            CellValue::Char(v) => v.is_none(),
            CellValue::Bool(v) => v.is_none(),
        }
    }

    /// Numeric view of int and float values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(Some(i)) => Some(f64::from(*i)),
            CellValue::Float(Some(f)) => Some(f64::from(*f)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Str(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Int(Some(i)) => Cow::Owned(i.to_string()),
            CellValue::Float(Some(f)) => Cow::Owned(f.to_string()),
            CellValue::Str(Some(s)) => Cow::Borrowed(s.as_str()),
            CellValue::Char(Some(c)) => Cow::Owned(char::from(*c).to_string()),
            CellValue::Bool(Some(b)) => Cow::Owned(b.to_string()),
            _ => Cow::Borrowed("NULL"),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(Some(i))
    }
}

impl From<f32> for CellValue {
    fn from(f: f32) -> Self {
        CellValue::Float(Some(f))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(Some(f as f32))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(Some(b))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Str(Some(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Str(Some(s))
    }
}

impl From<Option<i32>> for CellValue {
    fn from(v: Option<i32>) -> Self {
        CellValue::Int(v)
    }
}

impl From<Option<f32>> for CellValue {
    fn from(v: Option<f32>) -> Self {
        CellValue::Float(v)
    }
}

impl From<Option<String>> for CellValue {
    fn from(v: Option<String>) -> Self {
        CellValue::Str(v)
    }
}

impl From<Option<bool>> for CellValue {
    fn from(v: Option<bool>) -> Self {
        CellValue::Bool(v)
    }
}
