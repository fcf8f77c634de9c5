#[cfg(test)]
mod tests {
    use crate::{
        error::{EXIT_INTERRUPTED, EXIT_RUNTIME_ERROR, MigrationError},
        execution::executor::{Endpoints, RunOptions, RunOutcome, run},
    };
    use async_trait::async_trait;
    use connectors::{
        error::ClientError,
        memory::MemoryStore,
        remote::{RemoteReader, RemoteWriter},
    };
    use engine_core::{
        progress::{ProgressTracker, checkpoint_payload, now_millis},
        retry::RetryPolicy,
    };
    use engine_processing::error::{ReaderError, WriterError};
    use model::{
        core::{labels::Labels, matcher::Matcher, time_range::TimeRange},
        execution::{checkpoint::Checkpoint, job::MigrationJob},
        records::series::{Sample, Series, SeriesSet},
    };
    use planner::sizing::PlannerOptions;
    use std::sync::Arc;
    use tokio::sync::Notify;
    use tokio_util::sync::CancellationToken;

    fn job(progress: bool) -> MigrationJob {
        MigrationJob {
            name: "j".into(),
            range: TimeRange::new(0, 40_000).unwrap(),
            slab_size_limit_bytes: u64::MAX,
            concurrent_pulls: 1,
            concurrent_push: 1,
            progress_enabled: progress,
            progress_metric_name: "m".into(),
        }
    }

    fn options() -> RunOptions {
        RunOptions {
            planner: PlannerOptions {
                initial_width_ms: 10_000,
                min_width_ms: 10_000,
                max_width_ms: 10_000,
            },
            read_retry: RetryPolicy::immediate(2),
            write_retry: RetryPolicy::immediate(2),
            ..Default::default()
        }
    }

    async fn source() -> MemoryStore {
        let series = Series::new(
            Labels::from_pairs([("__name__", "up")]),
            (0..40_000).step_by(500).map(|t| Sample::new(t, 1.0)).collect(),
        );
        MemoryStore::with_data(SeriesSet::from_series([series])).await
    }

    fn endpoints(
        reader: Arc<dyn RemoteReader>,
        writer: Arc<dyn RemoteWriter>,
        progress: Option<Arc<dyn RemoteReader>>,
    ) -> Endpoints {
        Endpoints {
            reader,
            writer,
            progress,
        }
    }

    async fn checkpoint_of(store: &MemoryStore) -> Option<i64> {
        ProgressTracker::new(Arc::new(store.clone()), "m", "j")
            .fetch_last(now_millis())
            .await
            .unwrap()
            .map(|cp| cp.last_committed_max_timestamp)
    }

    #[tokio::test]
    async fn completes_when_writer_drains() {
        let src = source().await;
        let dst = MemoryStore::new();
        let eps = endpoints(
            Arc::new(src.clone()),
            Arc::new(dst.clone()),
            Some(Arc::new(dst.clone())),
        );

        let outcome = run(&job(true), eps, options(), CancellationToken::new())
            .await
            .unwrap();

        let RunOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.pipeline.reader.slabs, 4);
        assert_eq!(summary.pipeline.writer.slabs, 4);
        assert_eq!(summary.pipeline.writer.last_committed, Some(40_000));
        assert_eq!(summary.metrics.samples_written, 80);
        assert_eq!(checkpoint_of(&dst).await, Some(40_000));
    }

    #[tokio::test]
    async fn finished_job_is_a_no_op() {
        let src = source().await;
        let dst = MemoryStore::new();
        dst.insert(&checkpoint_payload("m", &Checkpoint::new("j", 40_000), 1))
            .await;
        let writes_before = dst.write_count();

        let eps = endpoints(
            Arc::new(src.clone()),
            Arc::new(dst.clone()),
            Some(Arc::new(dst.clone())),
        );
        let outcome = run(&job(true), eps, options(), CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            RunOutcome::AlreadyComplete {
                resume_start: 40_000
            }
        ));
        assert_eq!(src.read_count(), 0);
        assert_eq!(dst.write_count(), writes_before);
    }

    struct BrokenReader;

    #[async_trait]
    impl RemoteReader for BrokenReader {
        async fn read_range(
            &self,
            _range: TimeRange,
            _selector: &[Matcher],
        ) -> Result<SeriesSet, ClientError> {
            Err(ClientError::Protocol("not a read response".into()))
        }
    }

    #[tokio::test]
    async fn reader_failure_aborts_run() {
        let dst = MemoryStore::new();
        let eps = endpoints(Arc::new(BrokenReader), Arc::new(dst.clone()), None);

        let err = run(&job(false), eps, options(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, MigrationError::Reader(ReaderError::Fetch { .. })));
        assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);
        assert_eq!(dst.write_count(), 0);
    }

    struct RejectingWriter;

    #[async_trait]
    impl RemoteWriter for RejectingWriter {
        async fn write_batch(&self, _payload: &SeriesSet) -> Result<(), ClientError> {
            Err(ClientError::Status {
                status: 500,
                body: "storage failure".into(),
            })
        }
    }

    #[tokio::test]
    async fn writer_failure_aborts_run() {
        let src = source().await;
        let eps = endpoints(Arc::new(src.clone()), Arc::new(RejectingWriter), None);

        let err = run(&job(false), eps, options(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MigrationError::Writer(WriterError::RetriesExhausted { .. })
        ));
        assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);
        // the reader is stopped after at most two slabs past the failed one
        assert!(src.read_count() <= 3);
    }

    struct InvalidPayloadWriter;

    #[async_trait]
    impl RemoteWriter for InvalidPayloadWriter {
        async fn write_batch(&self, _payload: &SeriesSet) -> Result<(), ClientError> {
            Err(ClientError::Status {
                status: 400,
                body: "out of order sample".into(),
            })
        }
    }

    // The writer's failure closes the handoff, so the reader may finish
    // with a closed handoff in the same tick. The writer's error must win
    // regardless of which task the runtime observes first.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn writer_error_is_reported_over_closed_handoff() {
        let src = source().await;

        for attempt in 0..200 {
            let eps = endpoints(Arc::new(src.clone()), Arc::new(InvalidPayloadWriter), None);
            let err = run(&job(false), eps, options(), CancellationToken::new())
                .await
                .unwrap_err();

            assert!(
                matches!(err, MigrationError::Writer(WriterError::Push { .. })),
                "attempt {attempt}: {err:?}"
            );
            assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);
        }
    }

    /// Blocks every write until the test releases it.
    struct StalledWriter {
        entered: Arc<Notify>,
    }

    #[async_trait]
    impl RemoteWriter for StalledWriter {
        async fn write_batch(&self, _payload: &SeriesSet) -> Result<(), ClientError> {
            self.entered.notify_one();
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_in_flight_push() {
        let src = source().await;
        let dst = MemoryStore::new();
        let entered = Arc::new(Notify::new());
        let writer = StalledWriter {
            entered: entered.clone(),
        };
        let eps = endpoints(
            Arc::new(src.clone()),
            Arc::new(writer),
            Some(Arc::new(dst.clone())),
        );

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            entered.notified().await;
            trigger.cancel();
        });

        let err = run(&job(true), eps, options(), shutdown).await.unwrap_err();
        assert!(matches!(err, MigrationError::Interrupted));
        assert_eq!(err.exit_code(), EXIT_INTERRUPTED);
        assert_eq!(checkpoint_of(&dst).await, None);
    }

    #[tokio::test]
    async fn shutdown_before_start_moves_nothing() {
        let src = source().await;
        let dst = MemoryStore::new();
        let eps = endpoints(Arc::new(src.clone()), Arc::new(dst.clone()), None);

        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = run(&job(false), eps, options(), shutdown).await.unwrap_err();
        assert!(matches!(err, MigrationError::Interrupted));
        assert_eq!(src.read_count(), 0);
        assert_eq!(dst.write_count(), 0);
    }
}
