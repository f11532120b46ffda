/// Session: executes CQL against one private engine and schema registry
///
/// Each statement is translated, validated against the registry, run on the
/// engine, and only then reflected in the registry (for CREATE TABLE and
/// CREATE INDEX).

use crate::{PreparedStatement, ResponseFuture, ResultSet, Statement};
use cassmock_core::cql::{
    CqlStatement, EngineStatement, QueryValidator, StatementRewriter, Translation,
};
use cassmock_core::{Engine, Error, Parameters, Result, SchemaRegistry, SessionConfig, TableSchema};
use parking_lot::Mutex;

struct SessionState {
    engine: Box<dyn Engine>,
    registry: SchemaRegistry,
    keyspace: Option<String>,
}

/// Connected session
pub struct Session {
    state: Mutex<SessionState>,
    rewriter: StatementRewriter,
}

impl Session {
    pub(crate) fn new(engine: Box<dyn Engine>, config: &SessionConfig, keyspace: Option<String>) -> Self {
        Self {
            state: Mutex::new(SessionState {
                engine,
                registry: SchemaRegistry::new(),
                keyspace,
            }),
            rewriter: StatementRewriter::new(config),
        }
    }

    /// Execute a statement without parameters
    pub fn execute(&self, statement: impl Into<Statement>) -> Result<ResultSet> {
        self.run(statement.into(), None)
    }

    /// Execute a statement with positional or named parameters
    pub fn execute_with(
        &self,
        statement: impl Into<Statement>,
        params: impl Into<Parameters>,
    ) -> Result<ResultSet> {
        self.run(statement.into(), Some(params.into()))
    }

    /// Execute eagerly and wrap the rows in an already-resolved future
    pub fn execute_async(&self, statement: impl Into<Statement>) -> Result<ResponseFuture> {
        self.execute(statement).map(ResponseFuture::resolved)
    }

    pub fn execute_async_with(
        &self,
        statement: impl Into<Statement>,
        params: impl Into<Parameters>,
    ) -> Result<ResponseFuture> {
        self.execute_with(statement, params).map(ResponseFuture::resolved)
    }

    /// Capture a statement template for later binding
    pub fn prepare(&self, text: &str) -> Result<PreparedStatement> {
        PreparedStatement::new(text)
    }

    /// Keyspace selected at connect time or by `USE`
    pub fn keyspace(&self) -> Option<String> {
        self.state.lock().keyspace.clone()
    }

    /// Registered key structure of a table
    pub fn schema(&self, table: &str) -> Result<TableSchema> {
        self.state.lock().registry.get(table).cloned()
    }

    /// Names of all registered tables, sorted
    pub fn tables(&self) -> Vec<String> {
        self.state
            .lock()
            .registry
            .tables()
            .into_iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn run(&self, statement: Statement, params: Option<Parameters>) -> Result<ResultSet> {
        let (text, params) = match statement {
            Statement::Simple(text) => (text, params),
            Statement::Prepared(prepared) => match params {
                Some(params) => (prepared.bind(params)?.into_text(), None),
                None => (prepared.text().to_string(), None),
            },
            Statement::Bound(bound) => {
                if params.is_some() {
                    return Err(Error::InvalidArgument(
                        "bound statement already carries its values".into(),
                    ));
                }
                (bound.into_text(), None)
            }
        };

        self.execute_text(&text, params).map_err(|err| {
            tracing::warn!(error = %err, code = err.code(), statement = %text, "statement rejected");
            err
        })
    }

    fn execute_text(&self, text: &str, params: Option<Parameters>) -> Result<ResultSet> {
        match self.rewriter.translate(text, params)? {
            Translation::LivenessProbe => Ok(ResultSet::liveness()),
            Translation::Local(statement) => {
                self.apply_local(statement);
                Ok(ResultSet::empty())
            }
            Translation::Engine(statement) => self.execute_engine(statement),
        }
    }

    fn apply_local(&self, statement: CqlStatement) {
        match statement {
            CqlStatement::Use(keyspace) => {
                tracing::info!(keyspace = %keyspace, "switched keyspace");
                self.state.lock().keyspace = Some(keyspace);
            }
            CqlStatement::Keyspace(ks) => {
                tracing::debug!(action = %ks.action, keyspace = %ks.name, "keyspace statement acknowledged");
            }
            other => {
                tracing::debug!(kind = other.kind(), "nothing to apply locally");
            }
        }
    }

    fn execute_engine(&self, statement: EngineStatement) -> Result<ResultSet> {
        let mut state = self.state.lock();
        let state = &mut *state;

        match &statement.statement {
            CqlStatement::Select(select) => {
                QueryValidator::validate_select(select, &state.registry, self.rewriter.config())?;
            }
            CqlStatement::Insert(insert) => {
                QueryValidator::validate_insert(insert, &state.registry)?;
            }
            CqlStatement::CreateIndex(index) => {
                state.registry.get(&index.table.name)?;
            }
            _ => {}
        }

        let rows = state.engine.execute(&statement.sql, statement.params.as_ref())?;

        match statement.statement {
            CqlStatement::CreateTable(create) => {
                if !(create.if_not_exists && state.registry.contains(&create.table.name)) {
                    state.registry.register(create.to_schema()?);
                }
            }
            CqlStatement::CreateIndex(index) => {
                state.registry.set_secondary_index(&index.table.name, index.column)?;
            }
            _ => {}
        }

        Ok(ResultSet::from(rows))
    }
}
