use connectors::error::ClientError;
use engine_processing::error::{ReaderError, WriterError};
use planner::error::PlanError;
use thiserror::Error;

/// Exit code for a failure after validation succeeded.
pub const EXIT_RUNTIME_ERROR: i32 = 2;

/// Exit code when the run was stopped by SIGINT or SIGTERM.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Top‐level errors for the migration engine.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A remote client could not be constructed.
    #[error("Failed to initialize {component} client: {source}")]
    Initialization {
        component: &'static str,
        #[source]
        source: ClientError,
    },

    /// The resume point could not be established.
    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Reader failed: {0}")]
    Reader(#[from] ReaderError),

    #[error("Writer failed: {0}")]
    Writer(#[from] WriterError),

    /// An error occurred while joining a task.
    /// This usually indicates that the task was cancelled or panicked.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Migration interrupted by shutdown request")]
    Interrupted,
}

impl MigrationError {
    pub fn exit_code(&self) -> i32 {
        match self {
            MigrationError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_RUNTIME_ERROR,
        }
    }
}
