/// CQL dialect support
///
/// Statements flow lexer -> parser -> translator, with the validator applied
/// to SELECT and INSERT by the session.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod translator;
pub mod validator;

pub use ast::*;
pub use lexer::{split_statements, Lexer, Placeholder, Token};
pub use parser::CqlParser;
pub use translator::{sqlite_affinity, EngineStatement, StatementRewriter, Translation};
pub use validator::QueryValidator;
