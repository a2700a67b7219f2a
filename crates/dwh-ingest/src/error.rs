use thiserror::Error;

/// Everything that can stop an ingest.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The requested file does not exist under the base directory.
    #[error("File not found.")]
    NotFound { path: String },

    /// The file is not well-formed CSV, or a cell cannot be converted.
    #[error("{0}")]
    Parse(String),

    /// A SQLite operation failed; the batch in progress was rolled back.
    #[error("{0}")]
    Persistence(#[from] rusqlite::Error),
}

impl IngestError {
    /// Short kind string for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::NotFound { .. } => "NOT_FOUND",
            IngestError::Parse(_) => "PARSE_ERROR",
            IngestError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
