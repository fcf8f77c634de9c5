use connectors::error::ClientError;
use engine_core::retry::RetryError;
use model::{core::time_range::TimeRange, records::slab::SlabStateError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Fetch failed for range {range}: {source}")]
    Fetch {
        range: TimeRange,
        #[source]
        source: ClientError,
    },

    #[error("Retry attempts exhausted fetching range {range}: {source}")]
    RetriesExhausted {
        range: TimeRange,
        #[source]
        source: ClientError,
    },

    #[error("Reader cancelled")]
    Cancelled,

    #[error("The writer stopped accepting slabs")]
    HandoffClosed,

    #[error(transparent)]
    State(#[from] SlabStateError),

    #[error("Fetch task failed: {0}")]
    Task(String),
}

impl ReaderError {
    pub(crate) fn from_retry(range: TimeRange, err: RetryError<ClientError>) -> Self {
        match err {
            RetryError::Cancelled | RetryError::Fatal(ClientError::Cancelled) => {
                ReaderError::Cancelled
            }
            RetryError::Fatal(source) => ReaderError::Fetch { range, source },
            RetryError::AttemptsExceeded(source) => ReaderError::RetriesExhausted { range, source },
        }
    }
}

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Push failed for range {range}: {source}")]
    Push {
        range: TimeRange,
        #[source]
        source: ClientError,
    },

    #[error("Retry attempts exhausted pushing range {range}: {source}")]
    RetriesExhausted {
        range: TimeRange,
        #[source]
        source: ClientError,
    },

    #[error("Failed to push checkpoint {boundary}: {source}")]
    Checkpoint {
        boundary: i64,
        #[source]
        source: ClientError,
    },

    #[error("Slab {found} received out of order, expected it to start at {expected}")]
    OutOfOrder { expected: i64, found: TimeRange },

    #[error("Writer cancelled")]
    Cancelled,

    #[error(transparent)]
    State(#[from] SlabStateError),

    #[error("Push task failed: {0}")]
    Task(String),
}

impl WriterError {
    pub(crate) fn from_retry(range: TimeRange, err: RetryError<ClientError>) -> Self {
        match err {
            RetryError::Cancelled | RetryError::Fatal(ClientError::Cancelled) => {
                WriterError::Cancelled
            }
            RetryError::Fatal(source) => WriterError::Push { range, source },
            RetryError::AttemptsExceeded(source) => WriterError::RetriesExhausted { range, source },
        }
    }

    pub(crate) fn from_checkpoint_retry(boundary: i64, err: RetryError<ClientError>) -> Self {
        match err {
            RetryError::Cancelled | RetryError::Fatal(ClientError::Cancelled) => {
                WriterError::Cancelled
            }
            RetryError::Fatal(source) | RetryError::AttemptsExceeded(source) => {
                WriterError::Checkpoint { boundary, source }
            }
        }
    }
}
