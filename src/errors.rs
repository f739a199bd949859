//! Unified error type for the order manager.
//!
//! Not-found updates and deletes are not errors. They are reported through
//! [`crate::core::MutationOutcome::NotFound`] as a warning, not as a failure.

use sea_orm::DbErr;
use thiserror::Error;

/// Every failure the store, the analytics and the shell can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The order database could not be opened, or no pooled connection became free.
    #[error("Could not reach the order database: {message}")]
    Connection {
        /// Driver message
        message: String,
    },

    /// A statement against the order table failed.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// A user-supplied numeric field did not parse; nothing was written.
    #[error("{operation} rejected: {field} must be a non-negative number, got {value:?}")]
    Validation {
        /// Operation that was rejected
        operation: &'static str,
        /// Offending field
        field: &'static str,
        /// Raw input as typed
        value: String,
    },

    /// An analysis could not be produced from the current data.
    #[error("{analysis} failed: {message}")]
    Analytics {
        /// Name of the analysis
        analysis: &'static str,
        /// What went wrong
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal line editor error
    #[error("Input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    /// Formatting error while rendering a table
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(_) => Self::Connection {
                message: err.to_string(),
            },
            other => Self::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ConnAcquireErr;

    #[test]
    fn test_pool_exhaustion_is_a_connection_error() {
        let err = Error::from(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_statement_failure_is_a_database_error() {
        let err = Error::from(DbErr::Custom("no such table: taquizas".to_string()));
        assert!(matches!(err, Error::Database(DbErr::Custom(_))));
    }
}
