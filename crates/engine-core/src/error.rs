use connectors::error::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Failed to query progress metric '{metric}' for job '{job}': {source}")]
    Lookup {
        metric: String,
        job: String,
        #[source]
        source: ClientError,
    },

    #[error("Expected at most one progress series for job '{job}', received {count}")]
    AmbiguousSeries { job: String, count: usize },

    #[error("Progress series for job '{job}' holds an unusable value: {value}")]
    InvalidValue { job: String, value: f64 },
}
