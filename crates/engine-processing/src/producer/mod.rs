use crate::{error::ReaderError, handoff::SlabSender, producer::components::fetcher::SlabFetcher};
use engine_core::metrics::Metrics;
use planner::plan::Planner;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod config;

pub mod components {
    pub mod fetcher;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderSummary {
    pub slabs: u64,
    pub series: u64,
    pub samples: u64,
    pub bytes: u64,
}

/// Drains the planner, fetching each slab and handing it to the writer.
///
/// The handoff slot is reserved before the next slab is planned or fetched,
/// so the reader never holds a fetched slab that has nowhere to go.
pub struct SlabReader {
    planner: Planner,
    fetcher: SlabFetcher,
    tx: SlabSender,
    cancel: CancellationToken,
    metrics: Metrics,
    summary: ReaderSummary,
}

impl SlabReader {
    pub fn new(
        planner: Planner,
        fetcher: SlabFetcher,
        tx: SlabSender,
        cancel: CancellationToken,
        metrics: Metrics,
    ) -> Self {
        Self {
            planner,
            fetcher,
            tx,
            cancel,
            metrics,
            summary: ReaderSummary::default(),
        }
    }

    /// Runs the reader on its own task. The handoff is closed when the task
    /// ends, whatever the outcome.
    pub fn spawn(self) -> JoinHandle<Result<ReaderSummary, ReaderError>> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> Result<ReaderSummary, ReaderError> {
        info!(
            start = self.planner.resume_start(),
            end = self.planner.end(),
            "Reader started"
        );

        loop {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ReaderError::Cancelled),
                permit = self.tx.reserve() => permit.map_err(|_| ReaderError::HandoffClosed)?,
            };

            let Some(mut slab) = self.planner.next_slab() else {
                break;
            };

            slab.begin_read()?;
            let range = slab.range();
            debug!(slab = slab.index(), range = %range, "Fetching slab");

            let payload = match self.fetcher.fetch(range).await {
                Ok(payload) => payload,
                Err(err) => {
                    slab.fail()?;
                    return Err(err);
                }
            };

            let bytes = payload.size_bytes() as u64;
            if bytes > slab.size_limit_bytes() {
                warn!(
                    slab = slab.index(),
                    bytes,
                    limit = slab.size_limit_bytes(),
                    "Slab payload exceeds size limit, shrinking next slab"
                );
            }
            self.planner.report_size(slab.index(), bytes);

            self.summary.slabs += 1;
            self.summary.series += payload.len() as u64;
            self.summary.samples += payload.sample_count() as u64;
            self.summary.bytes += bytes;
            self.metrics.record_read(bytes);

            debug!(
                slab = slab.index(),
                range = %range,
                series = payload.len(),
                bytes,
                "Slab read"
            );
            slab.complete_read(payload)?;
            permit.send(slab);
        }

        info!(
            slabs = self.summary.slabs,
            bytes = self.summary.bytes,
            "Reader finished, no more slabs"
        );
        Ok(self.summary)
    }
}
