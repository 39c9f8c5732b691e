//! Output side: the per-column writer surface and record sinks.

use crate::schema::{Column, Schema};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::fmt;

/// One output value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Long(i) => JsonValue::from(*i),
            Value::Double(f) => JsonValue::from(*f),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Timestamp(ts) => JsonValue::String(format_timestamp(ts)),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for Value {
    /// Null renders as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Long(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::Timestamp(ts) => f.write_str(&format_timestamp(ts)),
        }
    }
}

/// Typed setters, one call per column per record.
pub trait RowWriter {
    fn set_null(&mut self, column: &Column);
    fn set_boolean(&mut self, column: &Column, value: bool);
    fn set_long(&mut self, column: &Column, value: i64);
    fn set_double(&mut self, column: &Column, value: f64);
    fn set_string(&mut self, column: &Column, value: &str);
    fn set_timestamp(&mut self, column: &Column, value: DateTime<Utc>);
}

/// Staging area for one record. Nothing reaches a [`RecordSink`] until the
/// whole row has been written and [`RowBuffer::take`] is called.
#[derive(Debug, Clone)]
pub struct RowBuffer {
    values: Vec<Value>,
}

impl RowBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            values: vec![Value::Null; width],
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Hand out the staged record and reset to all-null.
    pub fn take(&mut self) -> Vec<Value> {
        let width = self.values.len();
        std::mem::replace(&mut self.values, vec![Value::Null; width])
    }

    fn put(&mut self, column: &Column, value: Value) {
        if let Some(slot) = self.values.get_mut(column.index) {
            *slot = value;
        }
    }
}

impl RowWriter for RowBuffer {
    fn set_null(&mut self, column: &Column) {
        self.put(column, Value::Null);
    }

    fn set_boolean(&mut self, column: &Column, value: bool) {
        self.put(column, Value::Boolean(value));
    }

    fn set_long(&mut self, column: &Column, value: i64) {
        self.put(column, Value::Long(value));
    }

    fn set_double(&mut self, column: &Column, value: f64) {
        self.put(column, Value::Double(value));
    }

    fn set_string(&mut self, column: &Column, value: &str) {
        self.put(column, Value::String(value.to_string()));
    }

    fn set_timestamp(&mut self, column: &Column, value: DateTime<Utc>) {
        self.put(column, Value::Timestamp(value));
    }
}

/// Receiver of committed records.
pub trait RecordSink {
    fn add_record(&mut self, values: Vec<Value>);
}

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    schema: Schema,
    records: Vec<Vec<Value>>,
}

impl RecordBatch {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Vec<Value>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of column `name` in record `row`.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let column = self.schema.column(name)?;
        self.records.get(row)?.get(column.index)
    }

    /// All values of column `name`, in record order.
    pub fn column_values(&self, name: &str) -> Vec<&Value> {
        match self.schema.column(name) {
            Some(column) => self
                .records
                .iter()
                .filter_map(|r| r.get(column.index))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl RecordSink for RecordBatch {
    fn add_record(&mut self, values: Vec<Value>) {
        self.records.push(values);
    }
}

impl RecordSink for Vec<Vec<Value>> {
    fn add_record(&mut self, values: Vec<Value>) {
        self.push(values);
    }
}
