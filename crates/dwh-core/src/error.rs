use thiserror::Error;

#[derive(Debug, Error)]
pub enum DwhError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DwhError {
    /// Short error code string attached to log lines.
    pub fn code(&self) -> &'static str {
        match self {
            DwhError::Config(_) => "CONFIG_ERROR",
            DwhError::Database(_) => "DATABASE_ERROR",
            DwhError::Io(_) => "IO_ERROR",
            DwhError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DwhError>;
