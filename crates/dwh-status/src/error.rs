use thiserror::Error;

/// Errors raised by the status store.
#[derive(Debug, Error)]
pub enum StatusError {
    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A tracked name was empty or whitespace only.
    #[error("invalid tracked name: {0:?}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, StatusError>;
