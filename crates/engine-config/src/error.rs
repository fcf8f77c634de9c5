use crate::settings::byte_size::ByteSizeError;
use connectors::error::ClientConfigError;
use thiserror::Error;

/// Pre-flight configuration problems. Nothing has been read or written when
/// one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("mint should be provided for the migration to begin")]
    MissingMint,

    #[error("invalid mint: {0}")]
    InvalidMint(i64),

    #[error("invalid maxt: {0}")]
    InvalidMaxt(i64),

    #[error(
        "invalid input: minimum timestamp value (mint) cannot be greater than the maximum timestamp value (maxt)"
    )]
    MintAfterMaxt,

    #[error("invalid input: time range [{mint}, {maxt}) is empty")]
    EmptyRange { mint: i64, maxt: i64 },

    #[error("invalid metric-name regex match: prom metric must match {pattern}: received: {name}")]
    InvalidMetricName { pattern: &'static str, name: String },

    #[error(
        "remote read storage url and remote write storage url must be specified. Without these, data migration cannot begin"
    )]
    MissingUrls,

    #[error(
        "remote read storage url needs to be specified. Without read storage url, data migration cannot begin"
    )]
    MissingReadUrl,

    #[error(
        "remote write storage url needs to be specified. Without write storage url, data migration cannot begin"
    )]
    MissingWriteUrl,

    #[error(
        "invalid input: read url for remote-write storage should be provided when progress metric is enabled. To disable progress metric, use -progress-enabled=false"
    )]
    MissingProgressUrl,

    #[error("invalid input: {name} must be at least 1, received {value}")]
    InvalidConcurrency { name: &'static str, value: usize },

    #[error("invalid input: max-retries must be at least 1")]
    InvalidRetries,

    #[error("invalid input: initial-slab-width must be greater than zero")]
    InvalidSlabWidth,

    #[error("{component} auth validation: {source}")]
    ClientConfig {
        component: &'static str,
        #[source]
        source: ClientConfigError,
    },

    #[error("parsing byte-size: {0}")]
    ByteSize(#[from] ByteSizeError),
}
