use connectors::http::config::HttpClientConfig;
use serde::Serialize;

pub mod byte_size;
pub mod validated;
pub mod validator;

pub const DEFAULT_MIGRATION_NAME: &str = "prom-migrator";
pub const DEFAULT_PROGRESS_METRIC_NAME: &str = "prom_migrator_progress";
pub const DEFAULT_MAX_READ_SIZE: &str = "500MB";
pub const DEFAULT_MAX_RETRIES: usize = 5;
pub const DEFAULT_INITIAL_SLAB_WIDTH_MS: i64 = 5 * 60 * 1000;

/// A remote storage endpoint together with its client options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSettings {
    pub url: String,
    pub client: HttpClientConfig,
}

impl EndpointSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: HttpClientConfig::default(),
        }
    }

    pub(crate) fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Unchecked migration settings as supplied by the user, timestamps already
/// in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSettings {
    pub name: String,
    pub mint_ms: i64,
    pub maxt_ms: i64,
    pub max_read_size: String,
    pub concurrent_pulls: usize,
    pub concurrent_push: usize,
    pub read: EndpointSettings,
    pub write: EndpointSettings,
    pub progress_enabled: bool,
    pub progress_metric_name: String,
    pub progress: EndpointSettings,
    pub max_retries: usize,
    pub initial_slab_width_ms: i64,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_MIGRATION_NAME.to_string(),
            mint_ms: 0,
            maxt_ms: 0,
            max_read_size: DEFAULT_MAX_READ_SIZE.to_string(),
            concurrent_pulls: 1,
            concurrent_push: 1,
            read: EndpointSettings::default(),
            write: EndpointSettings::default(),
            progress_enabled: true,
            progress_metric_name: DEFAULT_PROGRESS_METRIC_NAME.to_string(),
            progress: EndpointSettings::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_slab_width_ms: DEFAULT_INITIAL_SLAB_WIDTH_MS,
        }
    }
}

/// Loggable view of the settings with credentials left out.
#[derive(Debug, Serialize)]
pub struct SettingsSummary<'a> {
    pub name: &'a str,
    pub mint_ms: i64,
    pub maxt_ms: i64,
    pub max_read_size: &'a str,
    pub concurrent_pulls: usize,
    pub concurrent_push: usize,
    pub read_url: &'a str,
    pub write_url: &'a str,
    pub progress_enabled: bool,
    pub progress_metric_name: &'a str,
}

impl MigrationSettings {
    pub fn summary(&self) -> SettingsSummary<'_> {
        SettingsSummary {
            name: &self.name,
            mint_ms: self.mint_ms,
            maxt_ms: self.maxt_ms,
            max_read_size: &self.max_read_size,
            concurrent_pulls: self.concurrent_pulls,
            concurrent_push: self.concurrent_push,
            read_url: &self.read.url,
            write_url: &self.write.url,
            progress_enabled: self.progress_enabled,
            progress_metric_name: &self.progress_metric_name,
        }
    }
}
