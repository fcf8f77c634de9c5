use crate::error::ProgressError;
use chrono::{DateTime, Utc};
use connectors::remote::RemoteReader;
use model::{
    core::{
        labels::{JOB_LABEL, Labels, METRIC_NAME_LABEL},
        matcher::Matcher,
        time_range::TimeRange,
    },
    execution::checkpoint::Checkpoint,
    records::series::{Sample, Series, SeriesSet},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Reads and encodes the progress series of a single job.
///
/// The progress series is identified by `{__name__=<metric>, job=<job>}`.
/// Each sample carries the wall-clock time it was written as its timestamp
/// and the committed boundary, in seconds, as its value.
#[derive(Clone)]
pub struct ProgressTracker {
    reader: Arc<dyn RemoteReader>,
    metric_name: String,
    job_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressStatus {
    pub job: String,
    pub metric: String,
    pub last_committed_max_timestamp: Option<i64>,
    pub last_committed_at: Option<DateTime<Utc>>,
}

impl ProgressTracker {
    pub fn new(
        reader: Arc<dyn RemoteReader>,
        metric_name: impl Into<String>,
        job_name: impl Into<String>,
    ) -> Self {
        ProgressTracker {
            reader,
            metric_name: metric_name.into(),
            job_name: job_name.into(),
        }
    }

    fn selector(&self) -> Vec<Matcher> {
        vec![
            Matcher::equal(METRIC_NAME_LABEL, &self.metric_name),
            Matcher::equal(JOB_LABEL, &self.job_name),
        ]
    }

    /// Returns the most recent checkpoint, or `None` if the job never
    /// committed a slab.
    pub async fn fetch_last(&self, now_ms: i64) -> Result<Option<Checkpoint>, ProgressError> {
        Ok(self
            .latest_sample(now_ms)
            .await?
            .map(|(checkpoint, _)| checkpoint))
    }

    pub async fn status(&self, now_ms: i64) -> Result<ProgressStatus, ProgressError> {
        let latest = self.latest_sample(now_ms).await?;
        Ok(ProgressStatus {
            job: self.job_name.clone(),
            metric: self.metric_name.clone(),
            last_committed_max_timestamp: latest
                .as_ref()
                .map(|(cp, _)| cp.last_committed_max_timestamp),
            last_committed_at: latest.and_then(|(_, ts)| DateTime::from_timestamp_millis(ts)),
        })
    }

    async fn latest_sample(
        &self,
        now_ms: i64,
    ) -> Result<Option<(Checkpoint, i64)>, ProgressError> {
        let range = TimeRange::new(0, now_ms.saturating_add(1).max(1)).map_err(|e| {
            ProgressError::Lookup {
                metric: self.metric_name.clone(),
                job: self.job_name.clone(),
                source: connectors::error::ClientError::InvalidRequest(e.to_string()),
            }
        })?;

        let found = self
            .reader
            .read_range(range, &self.selector())
            .await
            .map_err(|source| ProgressError::Lookup {
                metric: self.metric_name.clone(),
                job: self.job_name.clone(),
                source,
            })?;

        if found.len() > 1 {
            return Err(ProgressError::AmbiguousSeries {
                job: self.job_name.clone(),
                count: found.len(),
            });
        }

        let Some(sample) = found
            .series()
            .first()
            .and_then(|s| s.samples.iter().max_by_key(|sample| sample.timestamp))
        else {
            debug!(job = %self.job_name, "No progress recorded");
            return Ok(None);
        };

        let checkpoint = Checkpoint::from_progress_value(&self.job_name, sample.value).ok_or(
            ProgressError::InvalidValue {
                job: self.job_name.clone(),
                value: sample.value,
            },
        )?;

        debug!(
            job = %self.job_name,
            boundary = checkpoint.last_committed_max_timestamp,
            "Found progress checkpoint"
        );
        Ok(Some((checkpoint, sample.timestamp)))
    }
}

/// Encodes a checkpoint as the single-sample payload the writer pushes.
/// This is the only place the progress series is built.
pub fn checkpoint_payload(metric_name: &str, checkpoint: &Checkpoint, now_ms: i64) -> SeriesSet {
    let labels = Labels::from_pairs([
        (METRIC_NAME_LABEL, metric_name),
        (JOB_LABEL, checkpoint.job_name.as_str()),
    ]);
    SeriesSet::from_series([Series::new(
        labels,
        vec![Sample::new(now_ms, checkpoint.progress_value())],
    )])
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
