use engine_core::retry::RetryPolicy;
use model::execution::job::MigrationJob;

/// Identifies the series a writer advances after each committed slab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointTarget {
    pub metric_name: String,
    pub job_name: String,
}

/// Configuration for the slab writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Shards pushed concurrently per slab
    pub concurrent_push: usize,

    /// Retry policy applied to every shard push and checkpoint push
    pub retry: RetryPolicy,

    /// Where to checkpoint, `None` when progress tracking is disabled
    pub checkpoint: Option<CheckpointTarget>,

    /// Start of the first slab the writer expects
    pub expected_start: Option<i64>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            concurrent_push: 1,
            retry: RetryPolicy::default(),
            checkpoint: None,
            expected_start: None,
        }
    }
}

impl WriterConfig {
    pub fn from_job(job: &MigrationJob) -> Self {
        Self {
            concurrent_push: job.concurrent_push.max(1),
            checkpoint: job.progress_enabled.then(|| CheckpointTarget {
                metric_name: job.progress_metric_name.clone(),
                job_name: job.name.clone(),
            }),
            ..Default::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_expected_start(mut self, start: i64) -> Self {
        self.expected_start = Some(start);
        self
    }
}
