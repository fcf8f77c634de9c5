#![allow(dead_code)]

use crate::{JOB_NAME, PROGRESS_METRIC};
use async_trait::async_trait;
use connectors::{
    error::ClientError,
    memory::MemoryStore,
    remote::{RemoteReader, RemoteWriter},
};
use engine_core::{
    progress::{ProgressTracker, now_millis},
    retry::RetryPolicy,
};
use engine_runtime::{
    error::MigrationError,
    execution::executor::{Endpoints, RunOptions, RunOutcome, RunSummary, run},
};
use model::{
    core::{labels::Labels, time_range::TimeRange},
    execution::job::MigrationJob,
    records::series::{Sample, Series, SeriesSet},
};
use planner::sizing::PlannerOptions;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

/// Job over `[start, end)` with progress tracking on and no size pressure.
pub fn job(start: i64, end: i64) -> MigrationJob {
    MigrationJob {
        name: JOB_NAME.into(),
        range: TimeRange::new(start, end).expect("non-empty test range"),
        slab_size_limit_bytes: u64::MAX,
        concurrent_pulls: 1,
        concurrent_push: 1,
        progress_enabled: true,
        progress_metric_name: PROGRESS_METRIC.into(),
    }
}

/// Run options with a fixed slab width and zero-delay retries.
pub fn fixed_width(width_ms: i64) -> RunOptions {
    RunOptions {
        planner: PlannerOptions {
            initial_width_ms: width_ms,
            min_width_ms: width_ms,
            max_width_ms: width_ms,
        },
        read_retry: RetryPolicy::immediate(3),
        write_retry: RetryPolicy::immediate(3),
        ..Default::default()
    }
}

/// Run options with default slab sizing and zero-delay retries.
pub fn default_sizing() -> RunOptions {
    RunOptions {
        read_retry: RetryPolicy::immediate(3),
        write_retry: RetryPolicy::immediate(3),
        ..Default::default()
    }
}

/// `count` series named `series_<i>`, each with one sample every `step`
/// milliseconds in `[start, end)`.
pub fn generate(count: usize, start: i64, end: i64, step: i64) -> SeriesSet {
    SeriesSet::from_series((0..count).map(|i| {
        let name = format!("series_{i}");
        Series::new(
            Labels::from_pairs([("__name__", name.as_str()), ("instance", "localhost:9090")]),
            (start..end)
                .step_by(step as usize)
                .map(|ts| Sample::new(ts, (ts as f64) * (i as f64 + 1.0)))
                .collect(),
        )
    }))
}

pub async fn source_store(count: usize, end: i64, step: i64) -> MemoryStore {
    MemoryStore::with_data(generate(count, 0, end, step)).await
}

fn is_progress_series(series: &Series) -> bool {
    series.labels.metric_name() == Some(PROGRESS_METRIC)
}

fn has_data(payload: &SeriesSet) -> bool {
    payload.series().iter().any(|s| !is_progress_series(s))
}

/// Everything in `store` except the progress series.
pub async fn data_only(store: &MemoryStore) -> SeriesSet {
    SeriesSet::from_series(
        store
            .snapshot()
            .await
            .into_series()
            .into_iter()
            .filter(|s| !is_progress_series(s)),
    )
}

/// The progress series as stored, if any.
pub async fn progress_series(store: &MemoryStore) -> Option<Series> {
    store
        .snapshot()
        .await
        .into_series()
        .into_iter()
        .find(is_progress_series)
}

/// Expected content of the destination after `range` has been migrated.
pub async fn restricted(source: &MemoryStore, range: TimeRange) -> SeriesSet {
    let mut set = source.snapshot().await;
    set.retain_range(&range);
    set
}

pub async fn committed(store: &MemoryStore) -> Option<i64> {
    ProgressTracker::new(Arc::new(store.clone()), PROGRESS_METRIC, JOB_NAME)
        .fetch_last(now_millis())
        .await
        .expect("progress lookup")
        .map(|cp| cp.last_committed_max_timestamp)
}

/// Runs a migration where the progress series is read back from `progress`.
pub async fn migrate(
    job: &MigrationJob,
    source: Arc<dyn RemoteReader>,
    writer: Arc<dyn RemoteWriter>,
    progress: &MemoryStore,
    options: RunOptions,
    shutdown: CancellationToken,
) -> Result<RunOutcome, MigrationError> {
    let endpoints = Endpoints {
        reader: source,
        writer,
        progress: job
            .progress_enabled
            .then(|| Arc::new(progress.clone()) as Arc<dyn RemoteReader>),
    };
    run(job, endpoints, options, shutdown).await
}

pub fn completed(outcome: RunOutcome) -> RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::AlreadyComplete { resume_start } => {
            panic!("expected a migration, job was already complete at {resume_start}")
        }
    }
}

/// Rejects every data write touching timestamps at or after `fail_from`
/// with a server error. Progress writes pass through.
pub struct FailingWriter {
    pub inner: MemoryStore,
    pub fail_from: i64,
    pub rejected: AtomicUsize,
}

impl FailingWriter {
    pub fn new(inner: MemoryStore, fail_from: i64) -> Self {
        Self {
            inner,
            fail_from,
            rejected: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteWriter for FailingWriter {
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError> {
        let touches_failure = payload
            .series()
            .iter()
            .filter(|s| !is_progress_series(s))
            .flat_map(|s| s.samples.iter())
            .any(|sample| sample.timestamp >= self.fail_from);
        if touches_failure {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(ClientError::Status {
                status: 500,
                body: "remote storage unavailable".into(),
            });
        }
        self.inner.write_batch(payload).await
    }
}

/// Fails the first `failures` data writes with a transient error, then
/// delegates to the inner store.
pub struct FlakyWriter {
    pub inner: MemoryStore,
    pub failures_left: AtomicUsize,
}

#[async_trait]
impl RemoteWriter for FlakyWriter {
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError> {
        if has_data(payload)
            && self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(ClientError::Status {
                status: 503,
                body: "try again later".into(),
            });
        }
        self.inner.write_batch(payload).await
    }
}

/// Holds every data write until a permit is released. Each write consumes
/// one permit; progress writes are never held.
pub struct GatedWriter {
    pub inner: MemoryStore,
    pub gate: Arc<Semaphore>,
    pub waiting: Arc<Notify>,
}

impl GatedWriter {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            waiting: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl RemoteWriter for GatedWriter {
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError> {
        if has_data(payload) {
            self.waiting.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| ClientError::Transport("gate closed".into()))?;
            permit.forget();
        }
        self.inner.write_batch(payload).await
    }
}

/// Counts reads and tracks how many ran at the same time.
pub struct CountingReader {
    pub inner: MemoryStore,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl CountingReader {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RemoteReader for CountingReader {
    async fn read_range(
        &self,
        range: TimeRange,
        selector: &[model::core::matcher::Matcher],
    ) -> Result<SeriesSet, ClientError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let result = self.inner.read_range(range, selector).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
