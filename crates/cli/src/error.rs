use crate::shutdown::ExitCode;
use engine_config::error::ConfigError;
use engine_core::error::ProgressError;
use engine_runtime::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("Failed to run the migration: {0}")]
    Runner(#[from] MigrationError),

    #[error("Failed to load progress: {0}")]
    Progress(#[from] ProgressError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::LogFilter(_) => ExitCode::GeneralError.as_i32(),
            CliError::Runner(err) => err.exit_code(),
            CliError::Progress(_) | CliError::JsonSerialize(_) => ExitCode::RuntimeError.as_i32(),
        }
    }
}
