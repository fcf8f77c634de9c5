use engine_core::retry::RetryPolicy;
use model::{core::matcher::Matcher, execution::job::MigrationJob};

/// Configuration for the slab reader.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Sub-fetches issued per slab
    pub concurrent_pulls: usize,

    /// Series selected from the source store
    pub selector: Vec<Matcher>,

    /// Retry policy applied to every sub-fetch
    pub retry: RetryPolicy,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            concurrent_pulls: 1,
            selector: Matcher::all_series(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ReaderConfig {
    pub fn from_job(job: &MigrationJob) -> Self {
        Self {
            concurrent_pulls: job.concurrent_pulls.max(1),
            ..Default::default()
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_selector(mut self, selector: Vec<Matcher>) -> Self {
        self.selector = selector;
        self
    }
}
