/// CQL to SQLite statement rewriting
///
/// The rewriter parses a CQL statement, coerces its parameters and renders
/// the SQLite text the embedded engine will run. Validation against the
/// schema registry happens later, in the session.

use crate::config::SessionConfig;
use crate::cql::ast::*;
use crate::cql::lexer::{render_tokens, Token};
use crate::cql::parser::CqlParser;
use crate::types::Parameters;
use crate::{Error, Result};

/// Statement ready for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStatement {
    pub statement: CqlStatement,
    pub sql: String,
    /// Parameters with UUIDs already coerced to text
    pub params: Option<Parameters>,
}

/// Outcome of translating one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// Driver health check; answered without the engine
    LivenessProbe,
    /// Handled by the session itself (USE, keyspace DDL)
    Local(CqlStatement),
    Engine(EngineStatement),
}

/// Statement rewriter
#[derive(Debug, Clone, Default)]
pub struct StatementRewriter {
    config: SessionConfig,
}

impl StatementRewriter {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Translate a statement into its engine form
    pub fn translate(&self, text: &str, params: Option<Parameters>) -> Result<Translation> {
        if self.config.is_liveness_probe(text) {
            tracing::debug!(statement = %text, "liveness probe");
            return Ok(Translation::LivenessProbe);
        }

        if text.trim().is_empty() {
            return Err(Error::Syntax("statement cannot be empty".into()));
        }
        if text.chars().count() > self.config.max_statement_length {
            return Err(Error::Syntax(format!(
                "statement exceeds maximum length of {} characters",
                self.config.max_statement_length
            )));
        }

        let statement = CqlParser::parse(text)?;
        let sql = match render_statement(&statement) {
            Some(sql) => sql,
            None => return Ok(Translation::Local(statement)),
        };
        let params = params.map(Parameters::coerce_uuids);

        tracing::debug!(kind = statement.kind(), sql = %sql, "rewrote statement");

        Ok(Translation::Engine(EngineStatement {
            statement,
            sql,
            params,
        }))
    }

    /// Text and parameters to send to the engine, or `None` when the
    /// statement never reaches it
    pub fn rewrite(
        &self,
        text: &str,
        params: Option<Parameters>,
    ) -> Result<Option<(String, Option<Parameters>)>> {
        match self.translate(text, params)? {
            Translation::Engine(stmt) => Ok(Some((stmt.sql, stmt.params))),
            Translation::LivenessProbe | Translation::Local(_) => Ok(None),
        }
    }
}

/// SQLite text for a statement; `None` for statements the engine never sees
pub fn render_statement(statement: &CqlStatement) -> Option<String> {
    let sql = match statement {
        CqlStatement::Select(select) => render_select(select),
        CqlStatement::Insert(insert) => render_insert(insert),
        CqlStatement::CreateTable(create) => render_create_table(create),
        CqlStatement::CreateIndex(index) => render_create_index(index),
        CqlStatement::Truncate(table) => format!("DELETE FROM {}", quote_ident(&table.name)),
        CqlStatement::Other(tokens) => render_tokens(tokens),
        CqlStatement::Use(_) | CqlStatement::Keyspace(_) => return None,
    };
    Some(sql)
}

fn render_select(select: &SelectStatement) -> String {
    let tables: Vec<String> = select.tables.iter().map(|t| quote_ident(&t.name)).collect();
    let mut sql = format!(
        "SELECT {} FROM {}",
        render_tokens(&select.projection),
        tables.join(", ")
    );
    if let Some(tokens) = &select.where_tokens {
        sql.push_str(" WHERE ");
        sql.push_str(&render_tokens(tokens));
    }
    if !select.tail.is_empty() {
        sql.push(' ');
        sql.push_str(&render_tokens(&select.tail));
    }
    sql
}

fn render_insert(insert: &InsertStatement) -> String {
    let verb = if insert.if_not_exists {
        "INSERT OR IGNORE"
    } else {
        "INSERT OR REPLACE"
    };
    let columns: Vec<String> = insert.columns.iter().map(|c| quote_ident(c)).collect();
    let values: Vec<String> = insert.values.iter().map(|v| render_value(v)).collect();
    format!(
        "{} INTO {} ({}) VALUES ({})",
        verb,
        quote_ident(&insert.table.name),
        columns.join(", "),
        values.join(", ")
    )
}

/// Collection literals have no engine form and are stored as their CQL text
fn render_value(tokens: &[Token]) -> String {
    match tokens {
        [Token::LeftBrace | Token::LeftBracket, ..] => {
            Token::StringLit(render_tokens(tokens)).to_string()
        }
        [single] => match single.boolean_literal() {
            Some(b) => (b as u8).to_string(),
            None => single.to_string(),
        },
        _ => render_tokens(tokens),
    }
}

fn render_create_table(create: &CreateTableStatement) -> String {
    let mut defs: Vec<String> = create
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), sqlite_affinity(&c.cql_type)))
        .collect();
    let key: Vec<String> = create.primary_key().into_iter().map(quote_ident).collect();
    defs.push(format!("PRIMARY KEY ({})", key.join(", ")));

    format!(
        "CREATE TABLE {}{} ({})",
        if create.if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(&create.table.name),
        defs.join(", ")
    )
}

fn render_create_index(index: &CreateIndexStatement) -> String {
    format!(
        "CREATE INDEX {}{} ON {} ({})",
        if index.if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(&index.index_name()),
        quote_ident(&index.table.name),
        quote_ident(&index.column)
    )
}

/// Plain identifiers pass through; anything else is double-quoted
fn quote_ident(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        Token::QuotedIdent(name.to_string()).to_string()
    }
}

/// SQLite column affinity for a CQL type
pub fn sqlite_affinity(cql_type: &str) -> &'static str {
    let base = cql_type.trim().to_ascii_lowercase();
    if base.contains('<') {
        return "TEXT";
    }
    match base.as_str() {
        "text" | "varchar" | "ascii" | "uuid" | "timeuuid" | "inet" | "date" | "time"
        | "duration" => "TEXT",
        "int" | "bigint" | "smallint" | "tinyint" | "varint" | "counter" | "boolean"
        | "timestamp" => "INTEGER",
        "float" | "double" | "decimal" => "REAL",
        "blob" => "BLOB",
        _ => "TEXT",
    }
}
