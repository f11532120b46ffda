/// Test utilities for cassmock
///
/// `TestSession` wraps a fresh in-memory session with the fixtures the
/// integration tests share.

use cassmock_api::{Cluster, Parameters, ResultSet, Session, Value};
use cassmock_core::SessionConfig;
use uuid::Uuid;

/// Users table keyed by a single uuid partition key
pub const USERS_DDL: &str =
    "CREATE TABLE app.users (id uuid, name text, email text, age int, active boolean, PRIMARY KEY (id))";

/// Events table with a composite partition key and a clustering column
pub const EVENTS_DDL: &str =
    "CREATE TABLE app.events (tenant text, day int, ts timestamp, kind text, payload text, PRIMARY KEY (tenant, day, (ts)))";

/// Orders table with a secondary index on `status`
pub const ORDERS_DDL: &str =
    "CREATE TABLE app.orders (id int PRIMARY KEY, status text, total double)";
pub const ORDERS_INDEX_DDL: &str = "CREATE INDEX ON app.orders (status)";

/// Session wrapper that owns its own cluster and engine
pub struct TestSession {
    pub session: Session,
}

impl TestSession {
    /// Fresh session with no tables
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let cluster = Cluster::builder()
            .config(config)
            .build()
            .expect("Failed to build cluster");
        let session = cluster.connect(Some("app")).expect("Failed to connect");
        Self { session }
    }

    /// Fresh session with users, events and orders created
    pub fn with_fixtures() -> Self {
        let test = Self::new();
        for ddl in [USERS_DDL, EVENTS_DDL, ORDERS_DDL, ORDERS_INDEX_DDL] {
            test.exec(ddl);
        }
        test
    }

    /// Execute a statement that must succeed
    pub fn exec(&self, cql: &str) -> ResultSet {
        self.session
            .execute(cql)
            .unwrap_or_else(|e| panic!("statement failed: {}\n  {}", e, cql))
    }

    /// Execute a parameterized statement that must succeed
    pub fn exec_with(&self, cql: &str, params: impl Into<Parameters>) -> ResultSet {
        self.session
            .execute_with(cql, params)
            .unwrap_or_else(|e| panic!("statement failed: {}\n  {}", e, cql))
    }

    /// Insert a user and return its id
    pub fn insert_user(&self, name: &str, age: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.exec_with(
            "INSERT INTO app.users (id, name, email, age, active) VALUES (?, ?, ?, ?, ?)",
            Parameters::positional(vec![
                Value::from(id),
                Value::from(name),
                Value::from(format!("{}@example.com", name.to_lowercase())),
                Value::from(age),
                Value::from(true),
            ]),
        );
        id
    }

    /// Number of rows currently in a table
    pub fn count(&self, table: &str) -> i64 {
        self.exec(&format!("SELECT count(*) AS n FROM {}", table))
            .one()
            .and_then(|row| row.get_i64("n"))
            .unwrap_or(0)
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}
