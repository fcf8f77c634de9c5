use crate::{
    consumer::{components::pusher::SlabPusher, config::CheckpointTarget},
    error::WriterError,
    handoff::SlabReceiver,
};
use engine_core::{
    metrics::Metrics,
    progress::{checkpoint_payload, now_millis},
};
use model::{
    core::time_range::TimeRange,
    execution::checkpoint::Checkpoint,
    records::slab::Slab,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub mod config;

pub mod components {
    pub mod pusher;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriterSummary {
    pub slabs: u64,
    pub series: u64,
    pub samples: u64,
    pub bytes: u64,
    pub checkpoints: u64,
    /// End of the last committed slab
    pub last_committed: Option<i64>,
}

/// Commits slabs in the order they arrive and checkpoints each one after
/// all of its data has been acknowledged.
pub struct SlabWriter {
    rx: SlabReceiver,
    pusher: SlabPusher,
    checkpoint: Option<CheckpointTarget>,
    next_start: Option<i64>,
    cancel: CancellationToken,
    metrics: Metrics,
    summary: WriterSummary,
}

impl SlabWriter {
    pub fn new(
        rx: SlabReceiver,
        pusher: SlabPusher,
        checkpoint: Option<CheckpointTarget>,
        expected_start: Option<i64>,
        cancel: CancellationToken,
        metrics: Metrics,
    ) -> Self {
        Self {
            rx,
            pusher,
            checkpoint,
            next_start: expected_start,
            cancel,
            metrics,
            summary: WriterSummary::default(),
        }
    }

    pub fn spawn(self) -> JoinHandle<Result<WriterSummary, WriterError>> {
        tokio::spawn(self.run())
    }

    /// Consumes slabs until the reader closes the handoff. Closing is the
    /// only normal way to finish; cancellation ends the run with an error.
    pub async fn run(mut self) -> Result<WriterSummary, WriterError> {
        info!(checkpointing = self.checkpoint.is_some(), "Writer started");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(WriterError::Cancelled),
                slab = self.rx.recv() => slab,
            };

            let Some(mut slab) = next else {
                break;
            };

            if let Err(err) = self.commit(&mut slab).await {
                if !slab.state().is_terminal() {
                    slab.fail()?;
                }
                error!(slab = slab.index(), range = %slab.range(), error = %err, "Slab commit failed");
                return Err(err);
            }
        }

        info!(
            slabs = self.summary.slabs,
            last_committed = ?self.summary.last_committed,
            "Writer finished, all slabs committed"
        );
        Ok(self.summary)
    }

    async fn commit(&mut self, slab: &mut Slab) -> Result<(), WriterError> {
        let range = slab.range();
        if let Some(expected) = self.next_start
            && range.start != expected
        {
            return Err(WriterError::OutOfOrder {
                expected,
                found: range,
            });
        }

        slab.begin_write()?;
        let payload = slab.take_payload();
        let series = payload.len() as u64;
        let samples = payload.sample_count() as u64;
        let bytes = payload.size_bytes() as u64;

        debug!(slab = slab.index(), range = %range, series, samples, "Pushing slab");
        self.pusher.push(range, payload).await?;
        slab.complete_write()?;

        self.metrics.record_write(series, samples, bytes);
        self.summary.slabs += 1;
        self.summary.series += series;
        self.summary.samples += samples;
        self.summary.bytes += bytes;
        self.next_start = Some(range.end);

        if let Some(target) = self.checkpoint.clone() {
            self.push_checkpoint(target, range).await?;
        }
        self.summary.last_committed = Some(range.end);

        info!(
            slab = slab.index(),
            range = %range,
            series,
            samples,
            bytes,
            "Slab committed"
        );
        Ok(())
    }

    async fn push_checkpoint(
        &mut self,
        target: CheckpointTarget,
        range: TimeRange,
    ) -> Result<(), WriterError> {
        let checkpoint = Checkpoint::new(target.job_name, range.end);
        let payload = checkpoint_payload(&target.metric_name, &checkpoint, now_millis());

        self.pusher.push_checkpoint(range.end, payload).await?;
        self.metrics.increment_checkpoints();
        self.summary.checkpoints += 1;
        debug!(boundary = range.end, "Checkpoint pushed");
        Ok(())
    }
}
