use solver_persist::PersistError;
use thiserror::Error;

/// Failures surfaced to callers of the orchestrator
///
/// Model-call failures never appear here; the subject router absorbs them.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Thread not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Another attempt with the same turn id is still running
    #[error("Turn in progress: {0}")]
    Conflict(String),

    #[error("Store failure: {0}")]
    Upstream(#[source] PersistError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PersistError> for SolverError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(id) => SolverError::NotFound(id),
            PersistError::DuplicateTurn(turn_id) => SolverError::Conflict(turn_id),
            PersistError::Internal(msg) => SolverError::Unknown(msg),
            other => SolverError::Upstream(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
