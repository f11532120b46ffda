use bytes::Bytes;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

/// Column value exchanged with the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null
    Null,
    /// 64-bit integer (int, bigint, counter, timestamp, boolean once stored)
    Integer(i64),
    /// Floating point
    Double(f64),
    /// Text
    Text(String),
    /// Boolean (stored by the engine as 1/0)
    Boolean(bool),
    /// Binary
    Blob(Bytes),
    /// UUID; coerced to its canonical text form before it reaches the engine
    Uuid(Uuid),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Booleans come back from the engine as integers, so 0/1 count too
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Integer(0) => Some(false),
            Value::Integer(1) => Some(true),
            _ => None,
        }
    }

    /// Parse a text value as a UUID
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            Value::Text(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    /// Replace a UUID with its lowercase hyphenated text form
    pub fn coerce_uuid(self) -> Self {
        match self {
            Value::Uuid(u) => Value::Text(u.hyphenated().to_string()),
            other => other,
        }
    }

    /// Build a value from an engine cell
    pub fn from_sql_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Double(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(Bytes::copy_from_slice(b)),
        }
    }

    /// Render as a CQL literal, used when binding prepared statements
    pub fn to_cql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Double(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::Blob(b) => format!("0x{}", hex(b)),
            Value::Uuid(u) => format!("'{}'", u.hyphenated()),
        }
    }

    /// Convert to a plain JSON value for display
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Blob(b) => serde_json::Value::String(format!("0x{}", hex(b))),
            Value::Uuid(u) => serde_json::Value::String(u.hyphenated().to_string()),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Blob(b) => write!(f, "0x{}", hex(b)),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::Double(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Boolean(b) => ToSqlOutput::Owned(SqliteValue::Integer(*b as i64)),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Uuid(u) => ToSqlOutput::Owned(SqliteValue::Text(u.hyphenated().to_string())),
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Blob(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(Bytes::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parameter payload for a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Parameters {
    /// Ordered values for `?` / `%s` placeholders
    Positional(Vec<Value>),
    /// Values keyed by name for `:name` / `%(name)s` placeholders
    Named(BTreeMap<String, Value>),
}

impl Parameters {
    /// Build positional parameters
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Parameters::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Start an empty named mapping
    pub fn named() -> Self {
        Parameters::Named(BTreeMap::new())
    }

    /// Add a value. Named mappings insert under `key`; positional
    /// parameters append in call order and ignore the key.
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        match &mut self {
            Parameters::Positional(values) => values.push(value.into()),
            Parameters::Named(map) => {
                map.insert(key.into(), value.into());
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        match self {
            Parameters::Positional(values) => values.len(),
            Parameters::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named value, falling back to a case-insensitive match
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        match self {
            Parameters::Named(map) => map.get(name).or_else(|| {
                map.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            }),
            Parameters::Positional(_) => None,
        }
    }

    /// Replace every UUID value with its canonical text form
    pub fn coerce_uuids(self) -> Self {
        match self {
            Parameters::Positional(values) => {
                Parameters::Positional(values.into_iter().map(Value::coerce_uuid).collect())
            }
            Parameters::Named(map) => Parameters::Named(
                map.into_iter().map(|(k, v)| (k, v.coerce_uuid())).collect(),
            ),
        }
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(values: Vec<Value>) -> Self {
        Parameters::Positional(values)
    }
}

impl From<BTreeMap<String, Value>> for Parameters {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Parameters::Named(map)
    }
}

impl From<HashMap<String, Value>> for Parameters {
    fn from(map: HashMap<String, Value>) -> Self {
        Parameters::Named(map.into_iter().collect())
    }
}
