pub mod engine;
pub mod integration;
pub mod utils;

/// `job` label of the progress series in every scenario.
pub const JOB_NAME: &str = "j";

/// Progress metric name used in every scenario.
pub const PROGRESS_METRIC: &str = "m";
