/// Typed CQL statement tree
///
/// Only the statement shapes client code commonly sends are modeled in
/// detail; everything else is carried as a token stream.

use crate::cql::lexer::Token;
use crate::schema::{ColumnDef, TableSchema};
use crate::Result;

/// Top-level CQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum CqlStatement {
    Select(SelectStatement),
    Insert(InsertStatement),
    CreateTable(CreateTableStatement),
    CreateIndex(CreateIndexStatement),
    /// TRUNCATE [TABLE] t
    Truncate(TableRef),
    /// USE keyspace
    Use(String),
    /// CREATE / ALTER / DROP KEYSPACE
    Keyspace(KeyspaceStatement),
    /// Anything else, with keyspace qualifiers already collapsed
    Other(Vec<Token>),
}

impl CqlStatement {
    /// Statement kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            CqlStatement::Select(_) => "SELECT",
            CqlStatement::Insert(_) => "INSERT",
            CqlStatement::CreateTable(_) => "CREATE TABLE",
            CqlStatement::CreateIndex(_) => "CREATE INDEX",
            CqlStatement::Truncate(_) => "TRUNCATE",
            CqlStatement::Use(_) => "USE",
            CqlStatement::Keyspace(_) => "KEYSPACE",
            CqlStatement::Other(_) => "OTHER",
        }
    }

    /// Statements answered by the session without an engine round trip
    pub fn is_session_local(&self) -> bool {
        matches!(self, CqlStatement::Use(_) | CqlStatement::Keyspace(_))
    }
}

/// Possibly keyspace-qualified table reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub keyspace: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            keyspace: None,
            name: name.into(),
        }
    }

    pub fn qualified(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: Some(keyspace.into()),
            name: name.into(),
        }
    }
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Tokens between SELECT and FROM
    pub projection: Vec<Token>,
    /// FROM targets; more than one is an implicit join
    pub tables: Vec<TableRef>,
    /// Tokens after WHERE up to the trailing clauses (None = no WHERE)
    pub where_tokens: Option<Vec<Token>>,
    /// Flattened predicates of the WHERE clause
    pub predicates: Vec<Predicate>,
    /// ORDER BY / LIMIT / PER PARTITION LIMIT tokens
    pub tail: Vec<Token>,
    pub allow_filtering: bool,
}

impl SelectStatement {
    pub fn has_where(&self) -> bool {
        self.where_tokens.is_some()
    }
}

/// Single relation in a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: CompareOp,
    /// Right-hand side tokens (empty for IS [NOT] NULL)
    pub operand: Vec<Token>,
}

/// Relation operators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// =
    Equal,
    /// != or <>
    NotEqual,
    /// <
    LessThan,
    /// <=
    LessThanOrEqual,
    /// >
    GreaterThan,
    /// >=
    GreaterThanOrEqual,
    /// IN (...)
    In,
    /// CONTAINS
    Contains,
    /// CONTAINS KEY
    ContainsKey,
    /// LIKE
    Like,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: TableRef,
    pub columns: Vec<String>,
    /// One token group per column
    pub values: Vec<Vec<Token>>,
    /// IF NOT EXISTS: keep the existing row instead of replacing it
    pub if_not_exists: bool,
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub table: TableRef,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub partition_keys: Vec<String>,
    pub clustering_key: Option<String>,
}

impl CreateTableStatement {
    /// Registry entry for this table (no secondary index yet)
    pub fn to_schema(&self) -> Result<TableSchema> {
        TableSchema::new(
            self.table.name.clone(),
            self.columns.clone(),
            self.partition_keys.clone(),
            self.clustering_key.clone(),
        )
    }

    /// Partition keys followed by the clustering key
    pub fn primary_key(&self) -> Vec<&str> {
        self.partition_keys
            .iter()
            .chain(self.clustering_key.iter())
            .map(String::as_str)
            .collect()
    }
}

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    pub name: Option<String>,
    pub if_not_exists: bool,
    pub table: TableRef,
    pub column: String,
}

impl CreateIndexStatement {
    /// Explicit name, or `<table>_<column>_idx` for anonymous indexes
    pub fn index_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{}_idx", self.table.name, self.column))
    }
}

/// Keyspace DDL, acknowledged without touching the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceStatement {
    /// CREATE, ALTER or DROP
    pub action: String,
    pub name: String,
}
