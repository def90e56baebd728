//! Error types for qr-db

use thiserror::Error;

/// Storage adapter errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Transaction control failed (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),

    /// Operation on a closed connection (D005)
    #[error("[D005] Database connection is closed")]
    ConnectionClosed,

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error carries no structured catalog variant; match the
        // "missing relation" message shapes only, never "already exists".
        let msg = err.to_string();
        let names_relation = msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table"));
        let is_missing = msg.contains("does not exist") || msg.contains("not found");
        if names_relation && is_missing {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
