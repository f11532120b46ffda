/// Statement results
///
/// A [`ResultSet`] is fully materialized, so it can be iterated any number of
/// times.

use bytes::Bytes;
use cassmock_core::{EngineRows, Value};
use std::sync::Arc;
use uuid::Uuid;

/// Column name reported for the liveness probe row
pub const LIVENESS_COLUMN: &str = "alive";

/// Single result row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value at a column position
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of a named column (case-insensitive)
    pub fn get_by_name(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }

    pub fn get_text(&self, column: &str) -> Option<&str> {
        self.get_by_name(column).and_then(Value::as_text)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get_by_name(column).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get_by_name(column).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get_by_name(column).and_then(Value::as_bool)
    }

    /// UUIDs are stored as text; parse them back
    pub fn get_uuid(&self, column: &str) -> Option<Uuid> {
        self.get_by_name(column).and_then(Value::as_uuid)
    }

    pub fn get_blob(&self, column: &str) -> Option<Bytes> {
        match self.get_by_name(column) {
            Some(Value::Blob(b)) => Some(b.clone()),
            _ => None,
        }
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows returned by a statement
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
        }
    }
}

impl ResultSet {
    /// Result of a statement that produces no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-row answer to a driver liveness probe
    pub fn liveness() -> Self {
        Self::from(EngineRows {
            columns: vec![LIVENESS_COLUMN.to_string()],
            rows: vec![vec![Value::Boolean(true)]],
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// First row, if any
    pub fn one(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn current_rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl From<EngineRows> for ResultSet {
    fn from(result: EngineRows) -> Self {
        let columns: Arc<[String]> = Arc::from(result.columns);
        let rows = result
            .rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self { columns, rows }
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
