use engine_core::error::ProgressError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Unable to establish resume point: {0}")]
    ResumeLookup(#[from] ProgressError),

    #[error("Progress is enabled for job '{0}' but no progress source was provided")]
    MissingProgressSource(String),
}
