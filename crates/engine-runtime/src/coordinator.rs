use crate::error::MigrationError;
use engine_processing::{
    consumer::{SlabWriter, WriterSummary},
    error::{ReaderError, WriterError},
    producer::{ReaderSummary, SlabReader},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub reader: ReaderSummary,
    pub writer: WriterSummary,
}

/// Runs a reader and a writer to a single outcome.
///
/// The run token is a child of the shutdown token: a fatal error on either
/// side cancels only this run, while an external shutdown cancels both and
/// is reported as an interruption.
pub struct PipelineCoordinator {
    shutdown: CancellationToken,
    cancel: CancellationToken,
}

impl PipelineCoordinator {
    pub fn new(shutdown: &CancellationToken) -> Self {
        Self {
            shutdown: shutdown.clone(),
            cancel: shutdown.child_token(),
        }
    }

    /// Token the reader and writer must observe.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(
        self,
        reader: SlabReader,
        writer: SlabWriter,
    ) -> Result<PipelineSummary, MigrationError> {
        let mut reader_handle = reader.spawn();
        let mut writer_handle = writer.spawn();
        let mut reader_summary: Option<ReaderSummary> = None;

        loop {
            tokio::select! {
                joined = &mut reader_handle, if reader_summary.is_none() => {
                    match joined {
                        Ok(Ok(summary)) => {
                            debug!(slabs = summary.slabs, "Reader drained the planner");
                            reader_summary = Some(summary);
                        }
                        Ok(Err(err)) => {
                            self.cancel.cancel();
                            // A writer that failed first closes the handoff,
                            // so its error is the one to report.
                            if let Ok(Err(writer_err)) = writer_handle.await
                                && (matches!(err, ReaderError::HandoffClosed)
                                    || !matches!(writer_err, WriterError::Cancelled))
                            {
                                error!(error = %writer_err, "Writer failed, cancelling pipeline");
                                return Err(self.writer_failure(writer_err));
                            }
                            error!(error = %err, "Reader failed, cancelling pipeline");
                            return Err(self.reader_failure(err));
                        }
                        Err(err) => {
                            self.cancel.cancel();
                            let _ = writer_handle.await;
                            return Err(err.into());
                        }
                    }
                }
                joined = &mut writer_handle => {
                    let writer_summary = match joined {
                        Ok(Ok(summary)) => summary,
                        Ok(Err(err)) => {
                            error!(error = %err, "Writer failed, cancelling pipeline");
                            self.cancel.cancel();
                            if reader_summary.is_none() {
                                let _ = reader_handle.await;
                            }
                            return Err(self.writer_failure(err));
                        }
                        Err(err) => {
                            self.cancel.cancel();
                            if reader_summary.is_none() {
                                let _ = reader_handle.await;
                            }
                            return Err(err.into());
                        }
                    };

                    // The handoff only closes once the reader task has ended,
                    // so its outcome is already available here.
                    let reader_summary = match reader_summary {
                        Some(summary) => summary,
                        None => match reader_handle.await? {
                            Ok(summary) => summary,
                            Err(err) => return Err(self.reader_failure(err)),
                        },
                    };

                    info!(
                        slabs = writer_summary.slabs,
                        samples = writer_summary.samples,
                        "Pipeline completed"
                    );
                    return Ok(PipelineSummary {
                        reader: reader_summary,
                        writer: writer_summary,
                    });
                }
            }
        }
    }

    fn reader_failure(&self, err: ReaderError) -> MigrationError {
        if matches!(err, ReaderError::Cancelled) && self.shutdown.is_cancelled() {
            return MigrationError::Interrupted;
        }
        MigrationError::Reader(err)
    }

    fn writer_failure(&self, err: WriterError) -> MigrationError {
        if matches!(err, WriterError::Cancelled) && self.shutdown.is_cancelled() {
            return MigrationError::Interrupted;
        }
        MigrationError::Writer(err)
    }
}
