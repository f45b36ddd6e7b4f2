//! A single tabular cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of one feature in one row.
///
/// The JSON form is untagged, so `1500`, `7.5`, `"NAmes"` and `null` map to
/// `Int`, `Float`, `Str` and `Null` respectively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl FeatureValue {
    /// True for `Null` and for floating-point NaN.
    pub fn is_missing(&self) -> bool {
        match self {
            FeatureValue::Null => true,
            FeatureValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. `None` for strings and missing values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureValue::Int(_) | FeatureValue::Float(_))
    }

    /// Category label of the cell, or `None` if it is missing.
    ///
    /// Numbers are rendered the way they would print, so a categorical column
    /// that receives `60` sees the label `"60"`.
    pub fn as_category(&self) -> Option<String> {
        match self {
            FeatureValue::Str(s) => Some(s.clone()),
            FeatureValue::Int(v) => Some(v.to_string()),
            FeatureValue::Float(v) if !v.is_nan() => Some(v.to_string()),
            _ => None,
        }
    }

    /// Parse a raw CSV field. Integers win over floats, anything else is a string.
    /// NA-token handling is the caller's job.
    pub fn parse(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<i64>() {
            FeatureValue::Int(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            FeatureValue::Float(v)
        } else {
            FeatureValue::Str(raw.to_string())
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Str(s) => write!(f, "{:?}", s),
            FeatureValue::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Str(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Str(v)
    }
}

impl<T: Into<FeatureValue>> From<Option<T>> for FeatureValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FeatureValue::Null)
    }
}
