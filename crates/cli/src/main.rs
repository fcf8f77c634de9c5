use crate::{
    commands::{Commands, MigrateArgs, ProgressArgs},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_core::progress::{ProgressTracker, now_millis};
use engine_runtime::execution::{
    executor::{self, RunOptions, RunOutcome},
    factory,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "ts-migrator",
    version = "0.1.0",
    about = "Time-series data migration between remote-read and remote-write storages"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level, overridden by RUST_LOG"
    )]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(&cli.log_level) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let result = match cli.command {
        Commands::Migrate(args) => migrate(&args, &shutdown).await,
        Commands::Progress(args) => show_progress(&args).await,
    };

    let code = match result {
        Ok(()) => ExitCode::Success.as_i32(),
        Err(err) => {
            if shutdown.is_shutdown_requested() {
                warn!("Migration stopped by shutdown request; committed progress is kept");
            }
            error!(error = %err, "Exiting with failure");
            err.exit_code()
        }
    };
    std::process::exit(code);
}

fn init_tracing(log_level: &str) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn migrate(args: &MigrateArgs, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    let settings = args.settings().validate()?;
    let endpoints = factory::create_endpoints(&settings)?;
    let options = RunOptions::from_settings(&settings);

    match executor::run(settings.job(), endpoints, options, shutdown.cancel_token()).await? {
        RunOutcome::AlreadyComplete { resume_start } => {
            info!(
                job = %settings.job().name,
                resume_start,
                "Nothing to migrate, progress already covers the requested range"
            );
        }
        RunOutcome::Completed(summary) => output::print_summary(&summary)?,
    }
    Ok(())
}

async fn show_progress(args: &ProgressArgs) -> Result<(), CliError> {
    let settings = args.settings();
    let endpoint = settings.validate_progress_source()?;
    let reader = factory::create_progress_reader(&endpoint)?;

    let tracker = ProgressTracker::new(reader, &settings.progress_metric_name, &settings.name);
    let status = tracker.status(now_millis()).await?;
    output::print_progress(&status, args.json)
}
