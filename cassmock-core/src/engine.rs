/// Embedded relational engine
///
/// The session talks to the engine through [`Engine`]; [`SqliteEngine`] is the
/// in-memory SQLite implementation created fresh for every connection.

use crate::types::{Parameters, Value};
use crate::{Error, Result};
use rusqlite::Connection;

/// Rows produced by one engine call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl EngineRows {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Minimal engine contract: run one statement, optionally with parameters
pub trait Engine: Send {
    fn execute(&mut self, sql: &str, params: Option<&Parameters>) -> Result<EngineRows>;
}

/// In-memory SQLite engine
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        tracing::debug!("opened in-memory engine");
        Ok(Self { conn })
    }
}

impl Engine for SqliteEngine {
    fn execute(&mut self, sql: &str, params: Option<&Parameters>) -> Result<EngineRows> {
        let mut stmt = self.conn.prepare(sql)?;
        let expected = stmt.parameter_count();

        match params {
            None if expected > 0 => {
                return Err(Error::InvalidArgument(format!(
                    "statement expects {} parameter(s), none supplied",
                    expected
                )));
            }
            None => {}
            Some(Parameters::Positional(values)) => {
                if values.len() != expected {
                    return Err(Error::InvalidArgument(format!(
                        "statement expects {} parameter(s), got {}",
                        expected,
                        values.len()
                    )));
                }
                for (i, value) in values.iter().enumerate() {
                    stmt.raw_bind_parameter(i + 1, value)?;
                }
            }
            Some(named @ Parameters::Named(_)) => {
                for i in 1..=expected {
                    let name = stmt
                        .parameter_name(i)
                        .map(|n| n.trim_start_matches([':', '@', '$']).to_string())
                        .ok_or_else(|| {
                            Error::InvalidArgument(
                                "positional placeholder in statement bound with named parameters"
                                    .into(),
                            )
                        })?;
                    let value = named.get_named(&name).ok_or_else(|| {
                        Error::InvalidArgument(format!("missing value for parameter :{}", name))
                    })?;
                    stmt.raw_bind_parameter(i, value)?;
                }
            }
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from_sql_ref(row.get_ref(i)?));
            }
            rows.push(values);
        }

        Ok(EngineRows { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SqliteEngine {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .execute("CREATE TABLE t (id INTEGER, name TEXT, PRIMARY KEY (id))", None)
            .unwrap();
        engine
    }

    #[test]
    fn test_positional_roundtrip() {
        let mut engine = engine();
        engine
            .execute(
                "INSERT OR REPLACE INTO t (id, name) VALUES (?, ?)",
                Some(&Parameters::positional(vec![Value::from(1), Value::from("a")])),
            )
            .unwrap();

        let rows = engine.execute("SELECT id, name FROM t", None).unwrap();
        assert_eq!(rows.columns, vec!["id", "name"]);
        assert_eq!(rows.rows, vec![vec![Value::Integer(1), Value::text("a")]]);
    }

    #[test]
    fn test_named_binding_is_case_tolerant() {
        let mut engine = engine();
        engine
            .execute(
                "INSERT OR REPLACE INTO t (id, name) VALUES (:id, :name)",
                Some(&Parameters::named().bind("ID", 2).bind("name", "b")),
            )
            .unwrap();
        let rows = engine
            .execute("SELECT name FROM t WHERE id = :id", Some(&Parameters::named().bind("id", 2)))
            .unwrap();
        assert_eq!(rows.rows, vec![vec![Value::text("b")]]);
    }

    #[test]
    fn test_binding_mismatches() {
        let mut engine = engine();
        assert!(matches!(
            engine.execute("SELECT * FROM t WHERE id = ?", None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.execute(
                "SELECT * FROM t WHERE id = ?",
                Some(&Parameters::positional(vec![1, 2]))
            ),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.execute("SELECT * FROM t WHERE id = :id", Some(&Parameters::named())),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_engine_errors_propagate() {
        let mut engine = engine();
        let err = engine.execute("SELECT * FROM missing", None).unwrap_err();
        assert!(matches!(err, Error::Engine(_)));
        assert_eq!(err.code(), "ENGINE_ERROR");
    }
}
