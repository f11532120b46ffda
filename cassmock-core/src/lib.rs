pub mod error;
pub mod config;
pub mod types;
pub mod schema; // table key structure registry
pub mod cql; // lexer, parser, rewriter, validator
pub mod engine; // embedded SQLite engine

pub use error::{Error, ErrorCategory, Result};
pub use config::SessionConfig;
pub use types::{Parameters, Value};
pub use schema::{ColumnDef, SchemaRegistry, TableSchema};
pub use engine::{Engine, EngineRows, SqliteEngine};
