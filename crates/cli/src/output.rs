use crate::error::CliError;
use engine_core::progress::ProgressStatus;
use engine_runtime::execution::executor::RunSummary;

pub fn print_progress(status: &ProgressStatus, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!(
        "Progress for migration '{}' (metric '{}'):",
        status.job, status.metric
    );
    println!("-----------------------------");
    let committed = status
        .last_committed_max_timestamp
        .map(|ts| ts.to_string())
        .unwrap_or_else(|| "none".to_string());
    println!("{:<16} {}", "Committed up to", committed);
    let committed_at = status
        .last_committed_at
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "n/a".to_string());
    println!("{:<16} {}", "Committed at", committed_at);
    Ok(())
}

pub fn print_summary(summary: &RunSummary) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
