//! Common error types for altdir

use thiserror::Error;

/// Common result type for altdir operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the altdir crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input record or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the store rejected a write because a unique index already
    /// holds the value (slug or case-insensitive name).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// True when the store itself is unreachable or unusable.
    ///
    /// This is the only class of error that aborts a batch. Constraint
    /// violations and decode problems are scoped to a single record. A store
    /// file that can no longer be read or written (SQLITE_IOERR, SQLITE_CORRUPT,
    /// SQLITE_FULL, SQLITE_CANTOPEN, SQLITE_NOTADB) counts as lost.
    pub fn is_connectivity_loss(&self) -> bool {
        match self {
            Error::Database(
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Protocol(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed,
            ) => true,
            Error::Database(sqlx::Error::Database(_)) => {
                matches!(self.sqlite_primary_code(), Some(10 | 11 | 13 | 14 | 26))
            }
            _ => false,
        }
    }

    /// True for SQLite write contention (SQLITE_BUSY / SQLITE_LOCKED)
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                matches!(self.sqlite_primary_code(), Some(5 | 6))
                    || db_err.message().contains("database is locked")
            }
            _ => false,
        }
    }

    /// Primary SQLite result code of a database error
    ///
    /// Extended result codes carry the primary code in the low byte.
    fn sqlite_primary_code(&self) -> Option<i32> {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff),
            _ => None,
        }
    }
}
