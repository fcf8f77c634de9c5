use crate::{
    error::ConfigError,
    settings::{
        EndpointSettings, MigrationSettings,
        byte_size::{ByteSizeError, parse_byte_size},
        validated::ValidatedSettings,
    },
};
use lazy_static::lazy_static;
use model::{core::time_range::TimeRange, execution::job::MigrationJob};
use regex::Regex;
use tracing::{info, warn};

pub const METRIC_NAME_PATTERN: &str = "^[a-zA-Z_:][a-zA-Z0-9_:]*$";

lazy_static! {
    static ref METRIC_NAME_RE: Regex = Regex::new(METRIC_NAME_PATTERN).expect("metric name pattern compiles");
}

/// Checks raw settings in a fixed order and reports the first problem found.
pub struct SettingsValidator<'a> {
    settings: &'a MigrationSettings,
}

impl<'a> SettingsValidator<'a> {
    pub fn new(settings: &'a MigrationSettings) -> Self {
        Self { settings }
    }

    pub fn validate(&self) -> Result<ValidatedSettings, ConfigError> {
        info!(settings = ?self.settings.summary(), "Validating settings");

        let range = self.validate_range()?;
        self.validate_metric_name()?;
        self.validate_urls()?;
        self.validate_concurrency()?;
        self.validate_clients()?;

        let slab_size_limit_bytes = parse_byte_size(&self.settings.max_read_size)?;
        if slab_size_limit_bytes == 0 {
            return Err(ByteSizeError::OutOfRange(self.settings.max_read_size.clone()).into());
        }

        if self.settings.max_retries == 0 {
            return Err(ConfigError::InvalidRetries);
        }
        if self.settings.initial_slab_width_ms <= 0 {
            return Err(ConfigError::InvalidSlabWidth);
        }

        let s = self.settings;
        let job = MigrationJob {
            name: s.name.clone(),
            range,
            slab_size_limit_bytes,
            concurrent_pulls: s.concurrent_pulls,
            concurrent_push: s.concurrent_push,
            progress_enabled: s.progress_enabled,
            progress_metric_name: s.progress_metric_name.clone(),
        };

        if !s.progress_enabled {
            warn!("Progress tracking disabled; an interrupted migration cannot be resumed");
        }

        info!(
            job = %job.name,
            range = %job.range,
            slab_size_limit_bytes,
            concurrent_pulls = job.concurrent_pulls,
            concurrent_push = job.concurrent_push,
            "Settings validation completed successfully"
        );

        Ok(ValidatedSettings {
            job,
            reader: s.read.clone(),
            writer: s.write.clone(),
            progress: s.progress_enabled.then(|| s.progress.clone()),
            max_retries: s.max_retries,
            initial_slab_width_ms: s.initial_slab_width_ms,
        })
    }

    /// Checks only what a progress lookup needs: the metric name and the
    /// progress endpoint.
    pub fn validate_progress_source(&self) -> Result<EndpointSettings, ConfigError> {
        self.validate_metric_name()?;
        let progress = &self.settings.progress;
        if !progress.has_url() {
            return Err(ConfigError::MissingProgressUrl);
        }
        progress
            .client
            .validate()
            .map_err(|source| ConfigError::ClientConfig {
                component: "progress-metric storage",
                source,
            })?;
        Ok(progress.clone())
    }

    fn validate_range(&self) -> Result<TimeRange, ConfigError> {
        let (mint, maxt) = (self.settings.mint_ms, self.settings.maxt_ms);
        if mint == 0 {
            return Err(ConfigError::MissingMint);
        }
        if mint < 0 {
            return Err(ConfigError::InvalidMint(mint));
        }
        if maxt < 0 {
            return Err(ConfigError::InvalidMaxt(maxt));
        }
        if mint > maxt {
            return Err(ConfigError::MintAfterMaxt);
        }
        TimeRange::new(mint, maxt).map_err(|_| ConfigError::EmptyRange { mint, maxt })
    }

    fn validate_metric_name(&self) -> Result<(), ConfigError> {
        let name = &self.settings.progress_metric_name;
        if !METRIC_NAME_RE.is_match(name) {
            return Err(ConfigError::InvalidMetricName {
                pattern: METRIC_NAME_PATTERN,
                name: name.clone(),
            });
        }
        Ok(())
    }

    fn validate_urls(&self) -> Result<(), ConfigError> {
        let s = self.settings;
        match (s.read.has_url(), s.write.has_url()) {
            (false, false) => return Err(ConfigError::MissingUrls),
            (false, true) => return Err(ConfigError::MissingReadUrl),
            (true, false) => return Err(ConfigError::MissingWriteUrl),
            (true, true) => {}
        }
        if s.progress_enabled && !s.progress.has_url() {
            return Err(ConfigError::MissingProgressUrl);
        }
        Ok(())
    }

    fn validate_concurrency(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("concurrent-pulls", self.settings.concurrent_pulls),
            ("concurrent-push", self.settings.concurrent_push),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidConcurrency { name, value });
            }
        }
        Ok(())
    }

    fn validate_clients(&self) -> Result<(), ConfigError> {
        let endpoints: [(&'static str, &EndpointSettings); 3] = [
            ("reader", &self.settings.read),
            ("writer", &self.settings.write),
            ("progress-metric storage", &self.settings.progress),
        ];
        for (component, endpoint) in endpoints {
            endpoint
                .client
                .validate()
                .map_err(|source| ConfigError::ClientConfig { component, source })?;
        }
        Ok(())
    }
}

impl MigrationSettings {
    pub fn validate(&self) -> Result<ValidatedSettings, ConfigError> {
        SettingsValidator::new(self).validate()
    }

    pub fn validate_progress_source(&self) -> Result<EndpointSettings, ConfigError> {
        SettingsValidator::new(self).validate_progress_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{error::ClientConfigError, http::config::Auth};

    const READ: &str = "http://localhost:9090/api/v1/read";
    const WRITE: &str = "http://localhost:9201/write";

    fn base() -> MigrationSettings {
        MigrationSettings {
            mint_ms: 1_000_000,
            maxt_ms: 1_001_000,
            read: EndpointSettings::new(READ),
            write: EndpointSettings::new(WRITE),
            progress_enabled: false,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_settings() {
        let validated = base().validate().unwrap();
        assert_eq!(validated.job.name, "prom-migrator");
        assert_eq!(validated.job.range, TimeRange::new(1_000_000, 1_001_000).unwrap());
        assert_eq!(validated.job.slab_size_limit_bytes, 500 * 1024 * 1024);
        assert_eq!(validated.job.progress_metric_name, "prom_migrator_progress");
        assert_eq!(validated.progress, None);
        assert_eq!(validated.max_retries, 5);
    }

    #[test]
    fn accepts_custom_metric_name() {
        let settings = MigrationSettings {
            progress_metric_name: "progress_migration_up".into(),
            ..base()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_metric_names() {
        for name in ["_progress_migration-_up", "0_progress_migration_up", ""] {
            let settings = MigrationSettings {
                progress_metric_name: name.into(),
                ..base()
            };
            let err = settings.validate().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidMetricName { .. }), "{name}");
            assert!(err.to_string().contains(METRIC_NAME_PATTERN));
        }
    }

    #[test]
    fn time_range_checks_run_first() {
        let no_mint = MigrationSettings::default();
        assert_eq!(no_mint.validate(), Err(ConfigError::MissingMint));
        assert_eq!(
            no_mint.validate().unwrap_err().to_string(),
            "mint should be provided for the migration to begin"
        );

        let negative = MigrationSettings {
            mint_ms: -1_000,
            ..base()
        };
        assert_eq!(negative.validate(), Err(ConfigError::InvalidMint(-1_000)));

        let bad_maxt = MigrationSettings {
            maxt_ms: -1_000,
            ..base()
        };
        assert_eq!(bad_maxt.validate(), Err(ConfigError::InvalidMaxt(-1_000)));

        let inverted = MigrationSettings {
            mint_ms: 1_000_000_001_000,
            maxt_ms: 1_000_000_000_000,
            ..base()
        };
        assert_eq!(inverted.validate(), Err(ConfigError::MintAfterMaxt));

        let empty = MigrationSettings {
            mint_ms: 5_000,
            maxt_ms: 5_000,
            ..base()
        };
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::EmptyRange { .. })
        ));
    }

    #[test]
    fn missing_urls_are_reported_precisely() {
        let none = MigrationSettings {
            read: EndpointSettings::new("  "),
            write: EndpointSettings::new(" "),
            ..base()
        };
        assert_eq!(none.validate(), Err(ConfigError::MissingUrls));

        let no_read = MigrationSettings {
            read: EndpointSettings::default(),
            ..base()
        };
        assert_eq!(no_read.validate(), Err(ConfigError::MissingReadUrl));

        let no_write = MigrationSettings {
            write: EndpointSettings::default(),
            ..base()
        };
        assert_eq!(no_write.validate(), Err(ConfigError::MissingWriteUrl));
    }

    #[test]
    fn progress_requires_its_own_url() {
        let settings = MigrationSettings {
            progress_enabled: true,
            ..base()
        };
        assert_eq!(settings.validate(), Err(ConfigError::MissingProgressUrl));

        let settings = MigrationSettings {
            progress_enabled: true,
            progress: EndpointSettings::new("http://localhost:9201/read"),
            ..base()
        };
        let validated = settings.validate().unwrap();
        assert!(validated.progress_enabled());
        assert_eq!(
            validated.progress.map(|p| p.url),
            Some("http://localhost:9201/read".to_string())
        );
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let settings = MigrationSettings {
            concurrent_push: 0,
            ..base()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidConcurrency {
                name: "concurrent-push",
                value: 0
            })
        );
    }

    #[test]
    fn client_options_are_checked_per_component() {
        let mut settings = base();
        settings.write.client.auth = Auth {
            username: Some("u".into()),
            bearer_token: Some("t".into()),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::ClientConfig {
                component: "writer",
                source: ClientConfigError::BasicAndBearer
            }
        );
        assert!(err.to_string().starts_with("writer auth validation"));
    }

    #[test]
    fn max_read_size_must_parse() {
        let settings = MigrationSettings {
            max_read_size: "lots".into(),
            ..base()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ByteSize(ByteSizeError::InvalidNumber(_)))
        ));

        let settings = MigrationSettings {
            max_read_size: "250MB".into(),
            ..base()
        };
        assert_eq!(
            settings.validate().unwrap().job.slab_size_limit_bytes,
            250 * 1024 * 1024
        );
    }

    #[test]
    fn progress_source_ignores_migration_fields() {
        let settings = MigrationSettings {
            progress: EndpointSettings::new(READ),
            ..Default::default()
        };
        assert_eq!(
            settings.validate_progress_source().map(|e| e.url),
            Ok(READ.to_string())
        );

        let missing = MigrationSettings::default();
        assert_eq!(
            missing.validate_progress_source(),
            Err(ConfigError::MissingProgressUrl)
        );
    }
}
