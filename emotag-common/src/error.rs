//! Common error types for emotag

use thiserror::Error;

/// Common result type for emotag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across emotag services
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

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Init lock released while not held. Indicates a caller bug
    /// (double-release); never swallowed.
    #[error("Lock protocol violation: {0}")]
    LockProtocol(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
