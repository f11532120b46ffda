/// Schema registry: per-table key structure recorded from CREATE TABLE and
/// CREATE INDEX, consulted when validating SELECT filters.
///
/// Table and column names are case-insensitive, as unquoted CQL identifiers
/// are. The registry keeps the spelling used at creation time for display.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Column declared in CREATE TABLE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    /// Declared CQL type, as written (e.g. `uuid`, `map<text, int>`)
    pub cql_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, cql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cql_type: cql_type.into(),
        }
    }
}

/// Key structure of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Bare table name (keyspace stripped)
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Never empty
    pub partition_keys: Vec<String>,
    pub clustering_key: Option<String>,
    pub secondary_index: Option<String>,
}

impl TableSchema {
    /// Create a schema, enforcing a non-empty, duplicate-free primary key
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        partition_keys: Vec<String>,
        clustering_key: Option<String>,
    ) -> Result<Self> {
        let name = name.into();
        validate_identifier(&name)?;

        if partition_keys.is_empty() {
            return Err(Error::Schema(format!(
                "primary key not present for table {}",
                name
            )));
        }

        let mut seen: Vec<&str> = Vec::new();
        for key in partition_keys.iter().chain(clustering_key.iter()) {
            if seen.iter().any(|s| s.eq_ignore_ascii_case(key)) {
                return Err(Error::Schema(format!(
                    "duplicate primary key column {} in table {}",
                    key, name
                )));
            }
            seen.push(key);
        }

        Ok(Self {
            name,
            columns,
            partition_keys,
            clustering_key,
            secondary_index: None,
        })
    }

    /// Partition keys followed by the clustering key
    pub fn key_columns(&self) -> impl Iterator<Item = &str> {
        self.partition_keys
            .iter()
            .chain(self.clustering_key.iter())
            .map(String::as_str)
    }

    pub fn is_key_column(&self, column: &str) -> bool {
        self.key_columns().any(|k| k.eq_ignore_ascii_case(column))
    }

    pub fn is_indexed_column(&self, column: &str) -> bool {
        self.secondary_index
            .as_deref()
            .map_or(false, |idx| idx.eq_ignore_ascii_case(column))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{1,48}$").expect("valid identifier regex"))
}

/// Table and keyspace names follow the emulated database's naming rule:
/// 1-48 alphanumeric or underscore characters.
pub fn validate_identifier(name: &str) -> Result<()> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(Error::Schema(format!("invalid table or keyspace name: {:?}", name)))
    }
}

/// Mapping from bare table name to its key structure.
///
/// Grows only through DDL; tables are never removed.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, TableSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_uppercase()
    }

    /// Register (or replace) a table's schema
    pub fn register(&mut self, schema: TableSchema) {
        tracing::debug!(
            table = %schema.name,
            partition_keys = ?schema.partition_keys,
            clustering_key = ?schema.clustering_key,
            "registered table schema"
        );
        self.tables.insert(Self::key(&schema.name), schema);
    }

    /// Look up a table, failing with NotFound if it was never registered
    pub fn get(&self, table: &str) -> Result<&TableSchema> {
        self.lookup(table)
            .ok_or_else(|| Error::NotFound(format!("table {}", table)))
    }

    pub fn lookup(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(&Self::key(table))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(&Self::key(table))
    }

    /// Record the secondary index column of a registered table
    pub fn set_secondary_index(&mut self, table: &str, column: impl Into<String>) -> Result<()> {
        let schema = self
            .tables
            .get_mut(&Self::key(table))
            .ok_or_else(|| Error::NotFound(format!("table {}", table)))?;
        let column = column.into();
        tracing::debug!(table = %schema.name, column = %column, "registered secondary index");
        schema.secondary_index = Some(column);
        Ok(())
    }

    /// Registered tables, sorted by name
    pub fn tables(&self) -> Vec<&TableSchema> {
        let mut tables: Vec<&TableSchema> = self.tables.values().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
