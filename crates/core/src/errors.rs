//! Core error types for Snippetbox.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, r2d2) are converted to these types by the storage layer.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for snippet operations.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Operation cancelled: {0}")]
    Cancelled(#[from] Cancellation),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

impl Error {
    /// True when a read found no live record.
    ///
    /// Unknown and expired ids both land here.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Database(DatabaseError::NotFound(_)))
    }

    /// True when the caller's context was cancelled or ran past its deadline.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

/// Database-agnostic error type for storage operations.
///
/// Every variant except `NotFound` is an opaque store failure: it carries the
/// underlying cause for logging, nothing callers should branch on.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create the connection pool or check a connection out of it.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to prepare, execute or decode.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Why an operation stopped before the backend answered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    #[error("the request was cancelled by the caller")]
    Cancelled,

    #[error("the request deadline elapsed")]
    DeadlineExceeded,
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
