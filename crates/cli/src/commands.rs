use chrono::Utc;
use clap::{ArgAction, Args, Subcommand};
use connectors::http::config::{Auth, HttpClientConfig, TlsConfig};
use engine_config::settings::{
    DEFAULT_INITIAL_SLAB_WIDTH_MS, DEFAULT_MAX_READ_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_MIGRATION_NAME, DEFAULT_PROGRESS_METRIC_NAME, EndpointSettings, MigrationSettings,
};
use std::{path::PathBuf, time::Duration};

const DEFAULT_TIMEOUT_SECS: u64 = 5 * 60;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy samples from the read endpoint to the write endpoint
    Migrate(MigrateArgs),

    /// Show the last committed checkpoint of a migration
    Progress(ProgressArgs),
}

#[derive(Args)]
pub struct MigrateArgs {
    #[arg(long, default_value = DEFAULT_MIGRATION_NAME, help = "Name for the current migration")]
    pub migration_name: String,

    #[arg(
        long,
        default_value_t = 0,
        help = "Minimum timestamp (in seconds) for carrying out data migration (inclusive)"
    )]
    pub mint: i64,

    #[arg(
        long,
        help = "Maximum timestamp (in seconds) for carrying out data migration (exclusive). Defaults to now"
    )]
    pub maxt: Option<i64>,

    #[arg(
        long,
        default_value = DEFAULT_MAX_READ_SIZE,
        help = "Maximum size of data fetched in a single read, e.g. 500MB or 1GB"
    )]
    pub max_read_size: String,

    #[arg(long, default_value_t = 1, help = "Concurrent pulls per slab")]
    pub concurrent_pulls: usize,

    #[arg(long, default_value_t = 1, help = "Concurrent pushes per slab")]
    pub concurrent_push: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_RETRIES,
        help = "Attempts per fetch or push, including the first"
    )]
    pub max_retries: usize,

    #[arg(
        long,
        default_value_t = DEFAULT_INITIAL_SLAB_WIDTH_MS / 1000,
        help = "Duration (in seconds) of the first slab before size feedback applies"
    )]
    pub initial_slab_width: i64,

    #[command(flatten)]
    pub read: ReadEndpointArgs,

    #[command(flatten)]
    pub write: WriteEndpointArgs,

    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Track progress so that an interrupted migration can resume"
    )]
    pub progress_enabled: bool,

    #[command(flatten)]
    pub progress: ProgressEndpointArgs,
}

#[derive(Args)]
pub struct ProgressArgs {
    #[arg(long, default_value = DEFAULT_MIGRATION_NAME, help = "Name of the migration to inspect")]
    pub migration_name: String,

    #[command(flatten)]
    pub progress: ProgressEndpointArgs,

    #[arg(
        long,
        help = "If set, prints the progress information as JSON instead of a table"
    )]
    pub json: bool,
}

#[derive(Args)]
pub struct ReadEndpointArgs {
    #[arg(long, default_value = "", help = "URL of the remote-read storage")]
    pub read_url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "Read request timeout (in seconds)")]
    pub reader_timeout: u64,

    #[arg(long)]
    pub read_auth_username: Option<String>,
    #[arg(long)]
    pub read_auth_password: Option<String>,
    #[arg(long)]
    pub read_auth_password_file: Option<PathBuf>,
    #[arg(long)]
    pub read_auth_bearer_token: Option<String>,
    #[arg(long)]
    pub read_auth_bearer_token_file: Option<PathBuf>,

    #[arg(long)]
    pub reader_tls_ca_file: Option<PathBuf>,
    #[arg(long)]
    pub reader_tls_cert_file: Option<PathBuf>,
    #[arg(long)]
    pub reader_tls_key_file: Option<PathBuf>,
    #[arg(long)]
    pub reader_tls_insecure_skip_verify: bool,
}

#[derive(Args)]
pub struct WriteEndpointArgs {
    #[arg(long, default_value = "", help = "URL of the remote-write storage")]
    pub write_url: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, help = "Write request timeout (in seconds)")]
    pub writer_timeout: u64,

    #[arg(long)]
    pub write_auth_username: Option<String>,
    #[arg(long)]
    pub write_auth_password: Option<String>,
    #[arg(long)]
    pub write_auth_password_file: Option<PathBuf>,
    #[arg(long)]
    pub write_auth_bearer_token: Option<String>,
    #[arg(long)]
    pub write_auth_bearer_token_file: Option<PathBuf>,

    #[arg(long)]
    pub writer_tls_ca_file: Option<PathBuf>,
    #[arg(long)]
    pub writer_tls_cert_file: Option<PathBuf>,
    #[arg(long)]
    pub writer_tls_key_file: Option<PathBuf>,
    #[arg(long)]
    pub writer_tls_insecure_skip_verify: bool,
}

#[derive(Args)]
pub struct ProgressEndpointArgs {
    #[arg(
        long,
        default_value = DEFAULT_PROGRESS_METRIC_NAME,
        help = "Metric name of the progress series"
    )]
    pub progress_metric_name: String,

    #[arg(
        long,
        default_value = "",
        help = "Remote-read URL of the storage holding the progress series"
    )]
    pub progress_metric_url: String,

    #[arg(long)]
    pub progress_metric_auth_username: Option<String>,
    #[arg(long)]
    pub progress_metric_auth_password: Option<String>,
    #[arg(long)]
    pub progress_metric_auth_password_file: Option<PathBuf>,
    #[arg(long)]
    pub progress_metric_auth_bearer_token: Option<String>,
    #[arg(long)]
    pub progress_metric_auth_bearer_token_file: Option<PathBuf>,

    #[arg(long)]
    pub progress_metric_tls_ca_file: Option<PathBuf>,
    #[arg(long)]
    pub progress_metric_tls_cert_file: Option<PathBuf>,
    #[arg(long)]
    pub progress_metric_tls_key_file: Option<PathBuf>,
    #[arg(long)]
    pub progress_metric_tls_insecure_skip_verify: bool,
}

impl ReadEndpointArgs {
    fn endpoint(&self) -> EndpointSettings {
        EndpointSettings {
            url: self.read_url.clone(),
            client: HttpClientConfig {
                auth: Auth {
                    username: self.read_auth_username.clone(),
                    password: self.read_auth_password.clone(),
                    password_file: self.read_auth_password_file.clone(),
                    bearer_token: self.read_auth_bearer_token.clone(),
                    bearer_token_file: self.read_auth_bearer_token_file.clone(),
                },
                tls: TlsConfig {
                    ca_file: self.reader_tls_ca_file.clone(),
                    cert_file: self.reader_tls_cert_file.clone(),
                    key_file: self.reader_tls_key_file.clone(),
                    insecure_skip_verify: self.reader_tls_insecure_skip_verify,
                },
                timeout: Duration::from_secs(self.reader_timeout),
            },
        }
    }
}

impl WriteEndpointArgs {
    fn endpoint(&self) -> EndpointSettings {
        EndpointSettings {
            url: self.write_url.clone(),
            client: HttpClientConfig {
                auth: Auth {
                    username: self.write_auth_username.clone(),
                    password: self.write_auth_password.clone(),
                    password_file: self.write_auth_password_file.clone(),
                    bearer_token: self.write_auth_bearer_token.clone(),
                    bearer_token_file: self.write_auth_bearer_token_file.clone(),
                },
                tls: TlsConfig {
                    ca_file: self.writer_tls_ca_file.clone(),
                    cert_file: self.writer_tls_cert_file.clone(),
                    key_file: self.writer_tls_key_file.clone(),
                    insecure_skip_verify: self.writer_tls_insecure_skip_verify,
                },
                timeout: Duration::from_secs(self.writer_timeout),
            },
        }
    }
}

impl ProgressEndpointArgs {
    /// The progress series is read back with the reader's timeout.
    fn endpoint(&self, timeout: Duration) -> EndpointSettings {
        EndpointSettings {
            url: self.progress_metric_url.clone(),
            client: HttpClientConfig {
                auth: Auth {
                    username: self.progress_metric_auth_username.clone(),
                    password: self.progress_metric_auth_password.clone(),
                    password_file: self.progress_metric_auth_password_file.clone(),
                    bearer_token: self.progress_metric_auth_bearer_token.clone(),
                    bearer_token_file: self.progress_metric_auth_bearer_token_file.clone(),
                },
                tls: TlsConfig {
                    ca_file: self.progress_metric_tls_ca_file.clone(),
                    cert_file: self.progress_metric_tls_cert_file.clone(),
                    key_file: self.progress_metric_tls_key_file.clone(),
                    insecure_skip_verify: self.progress_metric_tls_insecure_skip_verify,
                },
                timeout,
            },
        }
    }
}

fn secs_to_millis(secs: i64) -> i64 {
    secs.saturating_mul(1000)
}

impl MigrateArgs {
    pub fn settings(&self) -> MigrationSettings {
        let maxt = self.maxt.unwrap_or_else(|| Utc::now().timestamp());
        MigrationSettings {
            name: self.migration_name.clone(),
            mint_ms: secs_to_millis(self.mint),
            maxt_ms: secs_to_millis(maxt),
            max_read_size: self.max_read_size.clone(),
            concurrent_pulls: self.concurrent_pulls,
            concurrent_push: self.concurrent_push,
            read: self.read.endpoint(),
            write: self.write.endpoint(),
            progress_enabled: self.progress_enabled,
            progress_metric_name: self.progress.progress_metric_name.clone(),
            progress: self
                .progress
                .endpoint(Duration::from_secs(self.read.reader_timeout)),
            max_retries: self.max_retries,
            initial_slab_width_ms: secs_to_millis(self.initial_slab_width),
        }
    }
}

impl ProgressArgs {
    pub fn settings(&self) -> MigrationSettings {
        MigrationSettings {
            name: self.migration_name.clone(),
            progress_metric_name: self.progress.progress_metric_name.clone(),
            progress: self
                .progress
                .endpoint(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            ..Default::default()
        }
    }
}
