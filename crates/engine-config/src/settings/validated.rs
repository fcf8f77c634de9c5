use super::EndpointSettings;
use model::execution::job::MigrationJob;

/// Immutable, validated configuration used throughout the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSettings {
    pub job: MigrationJob,
    pub reader: EndpointSettings,
    pub writer: EndpointSettings,
    /// Present only when progress tracking is enabled.
    pub progress: Option<EndpointSettings>,
    /// Attempts per sub-fetch and sub-push, including the first.
    pub max_retries: usize,
    pub initial_slab_width_ms: i64,
}

impl ValidatedSettings {
    pub fn job(&self) -> &MigrationJob {
        &self.job
    }

    pub fn progress_enabled(&self) -> bool {
        self.job.progress_enabled
    }
}
