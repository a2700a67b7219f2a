use thiserror::Error;

/// Errors a maintenance run can end with.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The task body reported a failure.
    #[error("task failed: {0}")]
    Task(String),

    /// The task body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// Writing the outcome to the status store failed.
    #[error("status store error: {0}")]
    Status(#[from] dwh_status::StatusError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
