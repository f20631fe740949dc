//! Core dataset types for SmartGrid

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::filter_types::NullPosition;

/// A cell value that can represent any column type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Array of values (multi-select, date ranges)
    Array(Vec<Value>),
    /// Nested sub-rows
    Rows(Vec<Row>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, blank strings and empty collections are empty
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.iter().all(Value::is_empty),
            Value::Rows(rows) => rows.is_empty(),
            _ => false,
        }
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to get as a date. Strings are parsed as ISO dates or date-times.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            Value::String(s) => parse_date(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Nested sub-rows, if this value holds any
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            Value::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_rows_mut(&mut self) -> Option<&mut Vec<Row>> {
        match self {
            Value::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Display text lowered for case-insensitive matching
    pub fn search_text(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// Compare two values, placing nulls according to `nulls`
    pub fn compare(&self, other: &Value, nulls: NullPosition) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => match nulls {
                NullPosition::First => Ordering::Less,
                NullPosition::Last => Ordering::Greater,
            },
            (false, true) => match nulls {
                NullPosition::First => Ordering::Greater,
                NullPosition::Last => Ordering::Less,
            },
            (false, false) => compare_non_null_values(self, other),
        }
    }
}

/// Parse `YYYY-MM-DD`, or the date part of an ISO date-time
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Compare two non-null values
fn compare_non_null_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),

        // Case-insensitive first so "apple" and "Banana" order naturally
        (Value::String(a), Value::String(b)) => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),

        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
        (Value::Date(a), Value::DateTime(b)) => a.cmp(&b.date()),
        (Value::DateTime(a), Value::Date(b)) => a.date().cmp(b),

        (Value::Array(a), Value::Array(b)) => match a.len().cmp(&b.len()) {
            Ordering::Equal => {
                for (va, vb) in a.iter().zip(b.iter()) {
                    let cmp = va.compare(vb, NullPosition::Last);
                    if cmp != Ordering::Equal {
                        return cmp;
                    }
                }
                Ordering::Equal
            }
            other => other,
        },

        (Value::Rows(a), Value::Rows(b)) => a.len().cmp(&b.len()),

        // Cross-type numeric comparison (promote to f64)
        (a, b) if a.as_f64().is_some() && b.as_f64().is_some() => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),

        // Date stored as string against a real date
        (a, b) if a.as_date().is_some() && b.as_date().is_some() => a.as_date().cmp(&b.as_date()),

        // Fallback: compare string representations
        _ => a.search_text().cmp(&b.search_text()),
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
            Value::Rows(rows) => write!(f, "[{} rows]", rows.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Vec<Row>> for Value {
    fn from(v: Vec<Row>) -> Self {
        Value::Rows(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

static NULL_VALUE: Value = Value::Null;

/// A dataset row: field name to value, in insertion order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Value for `key`, or `Value::Null` when the field is absent
    pub fn value(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL_VALUE)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Nested sub-rows stored under `key`
    pub fn nested(&self, key: &str) -> Option<&[Row]> {
        self.0.get(key).and_then(Value::as_rows)
    }

    pub fn nested_mut(&mut self, key: &str) -> Option<&mut Vec<Row>> {
        self.0.get_mut(key).and_then(Value::as_rows_mut)
    }

    /// True when `key` holds a non-empty array of sub-rows
    pub fn has_nested(&self, key: &str) -> bool {
        self.nested(key).is_some_and(|rows| !rows.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

/// Stable row identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fallback identity for a row whose key is missing
    pub fn positional(index: usize) -> Self {
        Self(format!("#{}", index))
    }

    pub fn is_positional(&self) -> bool {
        self.0.starts_with('#')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Primary-key accessor used to derive a `RowId`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKey {
    Field(String),
    /// Composite key, parts joined with `|`
    Fields(Vec<String>),
}

impl Default for RowKey {
    fn default() -> Self {
        RowKey::Field("id".to_string())
    }
}

impl RowKey {
    pub fn field(key: impl Into<String>) -> Self {
        RowKey::Field(key.into())
    }

    /// Identity of `row`, or `None` if any key part is missing
    pub fn resolve(&self, row: &Row) -> Option<RowId> {
        match self {
            RowKey::Field(key) => {
                let value = row.value(key);
                (!value.is_empty()).then(|| RowId(value.to_string()))
            }
            RowKey::Fields(keys) => {
                let mut parts = Vec::with_capacity(keys.len());
                for key in keys {
                    let value = row.value(key);
                    if value.is_empty() {
                        return None;
                    }
                    parts.push(value.to_string());
                }
                (!parts.is_empty()).then(|| RowId(parts.join("|")))
            }
        }
    }

    /// Like `resolve`, falling back to a positional id
    pub fn resolve_or_position(&self, row: &Row, index: usize) -> RowId {
        self.resolve(row).unwrap_or_else(|| {
            tracing::warn!(key = ?self, index, "row is missing its key, using positional id");
            RowId::positional(index)
        })
    }
}
