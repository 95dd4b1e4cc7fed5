//! Records as read from a data source.
//!
//! A [`Record`] is one spreadsheet row: an ordered mapping from the source's
//! native column name to a scalar [`Value`]. Column order follows the source
//! header so that verdicts and custom-input forms list fields the way the
//! reviewer sees them in the original file.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker shown in place of an absent or empty value.
pub const MISSING_MARKER: &str = "—";

/// Which of the two reconciled datasets a record or column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Source A (قسطاس).
    A,
    /// Source B (الديوان).
    B,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }

    /// Name reviewers know the source by.
    pub fn domain_name(self) -> &'static str {
        match self {
            Side::A => "قسطاس",
            Side::B => "الديوان",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value.
///
/// Serialises untagged so persisted verdicts read as plain JSON scalars
/// (`null`, numbers, strings).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    #[default]
    Empty,
}

impl Value {
    /// True for empty cells, NaN, and whitespace-only text.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Float(f) => f.is_nan(),
            Value::Text(s) => s.trim().is_empty(),
            Value::Int(_) => false,
        }
    }

    /// Trimmed display form, or `None` when the value is missing.
    pub fn render(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }

    /// Ordering used when sorting rows by a key column.
    ///
    /// Numbers sort before text, missing values sort last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                _ if v.is_missing() => 2,
                Value::Int(_) | Value::Float(_) => 0,
                _ => 1,
            }
        }
        match (rank(self), rank(other)) {
            (0, 0) => self.as_f64().total_cmp(&other.as_f64()),
            (1, 1) => self.to_string().cmp(&other.to_string()),
            (a, b) => a.cmp(&b),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if x.is_nan() => Ok(()),
            // Integral floats keep their ".0" so "5.0" stays distinct from "5".
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{x:.1}")
            }
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        if x.is_nan() { Value::Empty } else { Value::Float(x) }
    }
}

/// One row from a data source, keyed by native column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

static EMPTY: Value = Value::Empty;

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its original position if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Field value, with absent fields reading as [`Value::Empty`].
    pub fn value(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&EMPTY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All fields as owned values, in column order.
    pub fn to_fields(&self) -> IndexMap<String, Value> {
        self.fields.clone()
    }

    /// All fields rendered as text, missing values as empty strings.
    pub fn to_text_fields(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.render().unwrap_or_default()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
