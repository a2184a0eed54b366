//! Error types for HNTLDR.

use thiserror::Error;

/// Common error type for HNTLDR.
#[derive(Error, Debug)]
pub enum HntldrError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant. Duplicate ranking
    /// snapshots never surface here; they are ignored at insert time.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The story API was unreachable or answered with something unusable.
    #[error("upstream fetch error: {0}")]
    Upstream(String),

    /// A hosted text generation or text-to-speech call failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Audio storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Mail delivery error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for HntldrError {
    fn from(e: sqlx::Error) -> Self {
        HntldrError::Database(e.to_string())
    }
}

/// Result type alias for HNTLDR operations.
pub type Result<T> = std::result::Result<T, HntldrError>;
