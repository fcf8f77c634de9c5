use crate::core::time_range::TimeRange;
use serde::{Deserialize, Serialize};

/// Immutable description of one migration run, built from validated settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationJob {
    /// Value of the `job` label on the progress series.
    pub name: String,
    pub range: TimeRange,
    pub slab_size_limit_bytes: u64,
    pub concurrent_pulls: usize,
    pub concurrent_push: usize,
    pub progress_enabled: bool,
    pub progress_metric_name: String,
}
