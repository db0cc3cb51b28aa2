//! Row projection.
//!
//! A report declares its columns as `(path, label, accessor)` triples; the
//! projector runs every accessor against every record and produces
//! [`Row`]s whose cells follow column order.

use std::fmt;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Number, Value as JsonValue};

use crate::error::{ReportError, ReportResult};

/// A scalar cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// A number taken verbatim from a JSON document.
    Number(Number),
    Text(String),
    Date(NaiveDate),
}

impl Value {
    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Renders the cell as it appears in exported files; `Null` is empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<&JsonValue> for Value {
    fn from(v: &JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Number(n.clone()),
            },
            JsonValue::String(s) => Value::Text(s.clone()),
            nested => Value::Text(nested.to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Number(n) => n.serialize(serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        }
    }
}

/// One output row: labelled cells in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing an existing one with the same label in place.
    pub fn insert(&mut self, label: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| k == label) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((label.to_string(), value)),
        }
    }

    pub fn with(mut self, label: &str, value: impl Into<Value>) -> Self {
        self.insert(label, value);
        self
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.cells.iter().find(|(k, _)| k == label).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Build a row from a JSON object, keeping its key order.
    pub fn from_json(value: &JsonValue) -> ReportResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ReportError::InvalidRows(format!("expected an object, got {value}")))?;
        let mut row = Row::new();
        for (key, cell) in object {
            row.insert(key, Value::from(cell));
        }
        Ok(row)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (k, v) in &self.cells {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A report column bound to a typed accessor over the record type `R`.
pub struct Column<R> {
    /// Field path this column reads, for display and documentation.
    pub path: &'static str,
    pub label: &'static str,
    extract: fn(&R) -> Value,
}

impl<R> Column<R> {
    pub fn new(path: &'static str, label: &'static str, extract: fn(&R) -> Value) -> Self {
        Self {
            path,
            label,
            extract,
        }
    }

    pub fn value(&self, record: &R) -> Value {
        (self.extract)(record)
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("path", &self.path)
            .field("label", &self.label)
            .finish()
    }
}

/// Lazily project `records` through `columns`, one row per record, in order.
pub fn project_rows<'a, R, I>(records: I, columns: &'a [Column<R>]) -> impl Iterator<Item = Row> + 'a
where
    I: IntoIterator<Item = R>,
    I::IntoIter: 'a,
    R: 'a,
{
    records.into_iter().map(move |record| {
        let mut row = Row::new();
        for column in columns {
            row.insert(column.label, column.value(&record));
        }
        row
    })
}
