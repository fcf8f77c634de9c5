use crate::{
    coordinator::{PipelineCoordinator, PipelineSummary},
    error::MigrationError,
};
use connectors::remote::{RemoteReader, RemoteWriter};
use engine_config::settings::validated::ValidatedSettings;
use engine_core::{
    metrics::{Metrics, MetricsSnapshot},
    progress::ProgressTracker,
    retry::RetryPolicy,
};
use engine_processing::{
    consumer::{SlabWriter, components::pusher::SlabPusher, config::WriterConfig},
    handoff::slab_channel,
    producer::{SlabReader, components::fetcher::SlabFetcher, config::ReaderConfig},
};
use model::{core::matcher::Matcher, execution::job::MigrationJob};
use planner::{
    plan::{InitOutcome, Planner},
    sizing::PlannerOptions,
};
use serde::Serialize;
use std::{sync::Arc, time::{Duration, Instant}};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Remote clients a run talks to.
#[derive(Clone)]
pub struct Endpoints {
    pub reader: Arc<dyn RemoteReader>,
    pub writer: Arc<dyn RemoteWriter>,
    /// Source of the progress series, required when progress is enabled.
    pub progress: Option<Arc<dyn RemoteReader>>,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub planner: PlannerOptions,
    pub read_retry: RetryPolicy,
    pub write_retry: RetryPolicy,
    pub selector: Vec<Matcher>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            planner: PlannerOptions::default(),
            read_retry: RetryPolicy::default(),
            write_retry: RetryPolicy::default(),
            selector: Matcher::all_series(),
        }
    }
}

impl RunOptions {
    pub fn from_settings(settings: &ValidatedSettings) -> Self {
        let retry = RetryPolicy::new(
            settings.max_retries,
            Duration::from_millis(500),
            Duration::from_secs(10),
        );
        Self {
            planner: PlannerOptions::default().with_initial_width(settings.initial_slab_width_ms),
            read_retry: retry.clone(),
            write_retry: retry,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job: String,
    pub resume_start: i64,
    pub end: i64,
    pub pipeline: PipelineSummary,
    pub metrics: MetricsSnapshot,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The checkpoint already covers the whole range; nothing was moved.
    AlreadyComplete { resume_start: i64 },
    Completed(RunSummary),
}

/// Establishes the resume point and migrates whatever is left of the job.
pub async fn run(
    job: &MigrationJob,
    endpoints: Endpoints,
    options: RunOptions,
    shutdown: CancellationToken,
) -> Result<RunOutcome, MigrationError> {
    let started = Instant::now();
    info!(job = %job.name, range = %job.range, "Starting migration");

    let tracker = endpoints
        .progress
        .clone()
        .map(|reader| ProgressTracker::new(reader, &job.progress_metric_name, &job.name));

    let outcome = tokio::select! {
        biased;
        _ = shutdown.cancelled() => return Err(MigrationError::Interrupted),
        outcome = Planner::init(job, tracker.as_ref(), options.planner) => outcome?,
    };

    let planner = match outcome {
        InitOutcome::Proceed(planner) => planner,
        InitOutcome::AlreadyComplete { resume_start } => {
            info!(job = %job.name, resume_start, "Migration already complete");
            return Ok(RunOutcome::AlreadyComplete { resume_start });
        }
    };
    let resume_start = planner.resume_start();

    let coordinator = PipelineCoordinator::new(&shutdown);
    let cancel = coordinator.token();
    let metrics = Metrics::new();
    let (tx, rx) = slab_channel();

    let reader_config = ReaderConfig::from_job(job)
        .with_retry(options.read_retry)
        .with_selector(options.selector);
    let fetcher = SlabFetcher::new(
        endpoints.reader,
        reader_config,
        cancel.clone(),
        metrics.clone(),
    );
    let reader = SlabReader::new(planner, fetcher, tx, cancel.clone(), metrics.clone());

    let writer_config = WriterConfig::from_job(job)
        .with_retry(options.write_retry)
        .with_expected_start(resume_start);
    let pusher = SlabPusher::new(
        endpoints.writer,
        writer_config.concurrent_push,
        writer_config.retry,
        cancel.clone(),
        metrics.clone(),
    );
    let writer = SlabWriter::new(
        rx,
        pusher,
        writer_config.checkpoint,
        writer_config.expected_start,
        cancel,
        metrics.clone(),
    );

    let pipeline = coordinator.run(reader, writer).await?;

    let summary = RunSummary {
        job: job.name.clone(),
        resume_start,
        end: job.range.end,
        pipeline,
        metrics: metrics.snapshot(),
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        job = %summary.job,
        slabs = summary.metrics.slabs_written,
        series = summary.metrics.series_written,
        samples = summary.metrics.samples_written,
        bytes = summary.metrics.bytes_written,
        read_retries = summary.metrics.read_retries,
        write_retries = summary.metrics.write_retries,
        checkpoints = summary.metrics.checkpoints,
        elapsed_ms = summary.elapsed_ms,
        "Migration successfully carried out"
    );

    Ok(RunOutcome::Completed(summary))
}
