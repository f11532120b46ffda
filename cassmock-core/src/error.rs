use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error category as seen by driver-style client code.
///
/// A real driver surfaces request-validation failures as an "invalid request"
/// exception and everything else as a generic driver failure. Client code that
/// only distinguishes those two cases can match on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    DriverException,
}

impl Error {
    /// Returns a stable error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Error::Schema(_) => "SCHEMA_ERROR",
            Error::InvalidQuery(_) => "INVALID_QUERY",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Syntax(_) => "SYNTAX_ERROR",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Engine(_) => "ENGINE_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Map this error onto the driver's exception categories.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedOperation(_)
            | Error::InvalidQuery(_)
            | Error::Syntax(_)
            | Error::InvalidArgument(_) => ErrorCategory::InvalidRequest,
            Error::Schema(_) | Error::NotFound(_) | Error::Engine(_) | Error::Internal(_) => {
                ErrorCategory::DriverException
            }
        }
    }

    /// Returns true if this error is potentially retryable.
    ///
    /// Only a busy or locked engine is transient; every rejection produced by
    /// translation or validation will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Engine(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Adds context to an error by wrapping it in an Internal error.
    ///
    /// # Examples
    ///
    /// ```
    /// use cassmock_core::Error;
    ///
    /// let err = Error::NotFound("table users".into()).with_context("CREATE INDEX");
    /// assert_eq!(err.to_string(), "Internal error: CREATE INDEX: Not found: table users");
    /// ```
    pub fn with_context(self, context: &str) -> Error {
        Error::Internal(format!("{}: {}", context, self))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
