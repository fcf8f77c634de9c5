use crate::core::time_range::TimeRange;
use serde::{Deserialize, Serialize};

/// Rightmost time boundary that has been fully written for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub job_name: String,
    pub last_committed_max_timestamp: i64,
}

impl Checkpoint {
    pub fn new(job_name: impl Into<String>, last_committed_max_timestamp: i64) -> Self {
        Self {
            job_name: job_name.into(),
            last_committed_max_timestamp,
        }
    }

    /// Decodes the value stored on the progress series (seconds) back into
    /// a millisecond boundary. Returns `None` for non-finite or negative values.
    pub fn from_progress_value(job_name: impl Into<String>, value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let millis = (value * 1000.0).round();
        if millis > i64::MAX as f64 {
            return None;
        }
        Some(Self::new(job_name, millis as i64))
    }

    /// Value written on the progress series: the boundary in seconds.
    pub fn progress_value(&self) -> f64 {
        self.last_committed_max_timestamp as f64 / 1000.0
    }

    /// Where a run over `range` continues from given this checkpoint.
    pub fn resume_point(&self, range: &TimeRange) -> i64 {
        range.start.max(self.last_committed_max_timestamp)
    }
}
