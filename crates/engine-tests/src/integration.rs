#[cfg(test)]
mod tests {
    use crate::{
        JOB_NAME, PROGRESS_METRIC,
        utils::{
            FailingWriter, FlakyWriter, GatedWriter, committed, completed, data_only,
            default_sizing, fixed_width, job, migrate, progress_series, restricted, source_store,
        },
    };
    use connectors::memory::MemoryStore;
    use engine_processing::error::WriterError;
    use engine_runtime::{
        error::{EXIT_INTERRUPTED, EXIT_RUNTIME_ERROR, MigrationError},
        execution::executor::RunOutcome,
    };
    use model::core::{labels::Labels, time_range::TimeRange};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    // Scenario: a range narrower than the initial slab width.
    // Expected Outcome:
    // - One slab moves all samples.
    // - One checkpoint sample {__name__="m", job="j"} with value 10 (seconds).
    #[traced_test]
    #[tokio::test]
    async fn single_slab_migration_writes_checkpoint() {
        let source = source_store(3, 10_000, 100).await;
        let dest = MemoryStore::new();

        let summary = completed(
            migrate(
                &job(0, 10_000),
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                default_sizing(),
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );

        assert_eq!(summary.pipeline.reader.slabs, 1);
        assert_eq!(summary.pipeline.writer.slabs, 1);
        assert_eq!(summary.metrics.samples_written, 300);
        assert_eq!(data_only(&dest).await, source.snapshot().await);

        let progress = progress_series(&dest).await.expect("progress series");
        assert_eq!(
            progress.labels,
            Labels::from_pairs([("__name__", PROGRESS_METRIC), ("job", JOB_NAME)])
        );
        assert_eq!(progress.samples.len(), 1);
        assert_eq!(progress.samples[0].value, 10.0);
        assert!(logs_contain("Slab committed"));
        assert!(logs_contain("Migration successfully carried out"));
    }

    // Scenario: every push for the only slab is rejected.
    // Expected Outcome:
    // - Exit code 2 and no checkpoint.
    // - A rerun against healthy storage starts again from mint.
    #[tokio::test]
    async fn failed_write_leaves_no_checkpoint() {
        let source = source_store(2, 10_000, 250).await;
        let dest = MemoryStore::new();
        let job = job(0, 10_000);
        let failing = Arc::new(FailingWriter::new(dest.clone(), 0));

        let err = migrate(
            &job,
            Arc::new(source.clone()),
            failing.clone(),
            &dest,
            default_sizing(),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            MigrationError::Writer(WriterError::RetriesExhausted { .. })
        ));
        assert_eq!(err.exit_code(), EXIT_RUNTIME_ERROR);
        assert_eq!(failing.rejected.load(Ordering::SeqCst), 3);
        assert_eq!(committed(&dest).await, None);
        assert_eq!(dest.series_count().await, 0);

        let summary = completed(
            migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                default_sizing(),
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );
        assert_eq!(summary.resume_start, 0);
        assert_eq!(summary.pipeline.reader.slabs, 1);
        assert_eq!(committed(&dest).await, Some(10_000));
        assert_eq!(data_only(&dest).await, source.snapshot().await);
    }

    #[traced_test]
    #[tokio::test]
    async fn transient_write_failures_are_absorbed() {
        let source = source_store(2, 20_000, 500).await;
        let dest = MemoryStore::new();
        let writer = Arc::new(FlakyWriter {
            inner: dest.clone(),
            failures_left: AtomicUsize::new(2),
        });

        let summary = completed(
            migrate(
                &job(0, 20_000),
                Arc::new(source.clone()),
                writer,
                &dest,
                fixed_width(5_000),
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );

        assert_eq!(summary.metrics.write_retries, 2);
        assert_eq!(summary.pipeline.writer.checkpoints, 4);
        assert_eq!(data_only(&dest).await, source.snapshot().await);
        assert!(logs_contain("Transient failure, retrying"));
    }

    // Scenario: shutdown is requested while the second slab is being pushed.
    // Expected Outcome:
    // - Exit code 130, checkpoint at the end of the first slab.
    // - A rerun resumes there and completes the range.
    #[tokio::test]
    async fn interrupted_run_resumes_from_last_commit() {
        let source = source_store(2, 40_000, 100).await;
        let dest = MemoryStore::new();
        let job = job(0, 40_000);
        let gated = GatedWriter::new(dest.clone());
        let (gate, waiting) = (gated.gate.clone(), gated.waiting.clone());

        let shutdown = CancellationToken::new();
        let run = tokio::spawn({
            let (job, source, dest, shutdown) =
                (job.clone(), source.clone(), dest.clone(), shutdown.clone());
            async move {
                migrate(
                    &job,
                    Arc::new(source),
                    Arc::new(gated),
                    &dest,
                    fixed_width(10_000),
                    shutdown,
                )
                .await
            }
        });

        waiting.notified().await;
        gate.add_permits(1);
        waiting.notified().await;
        shutdown.cancel();

        let err = run.await.unwrap().unwrap_err();
        assert!(matches!(err, MigrationError::Interrupted));
        assert_eq!(err.exit_code(), EXIT_INTERRUPTED);
        assert_eq!(committed(&dest).await, Some(10_000));
        assert_eq!(
            data_only(&dest).await,
            restricted(&source, TimeRange::new(0, 10_000).unwrap()).await
        );

        let summary = completed(
            migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                fixed_width(10_000),
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );
        assert_eq!(summary.resume_start, 10_000);
        assert_eq!(summary.pipeline.writer.slabs, 3);
        assert_eq!(committed(&dest).await, Some(40_000));
        assert_eq!(data_only(&dest).await, source.snapshot().await);
    }

    #[tokio::test]
    async fn completed_job_is_not_migrated_again() {
        let source = source_store(1, 10_000, 1_000).await;
        let dest = MemoryStore::new();
        let job = job(0, 10_000);

        for _ in 0..2 {
            migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                default_sizing(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        }

        assert_eq!(source.read_count(), 1);
        let outcome = migrate(
            &job,
            Arc::new(source.clone()),
            Arc::new(dest.clone()),
            &dest,
            default_sizing(),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::AlreadyComplete {
                resume_start: 10_000
            }
        ));
    }

    #[tokio::test]
    async fn progress_disabled_writes_only_data() {
        let source = source_store(2, 10_000, 100).await;
        let dest = MemoryStore::new();
        let mut job = job(0, 10_000);
        job.progress_enabled = false;

        let summary = completed(
            migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                fixed_width(2_500),
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );

        assert_eq!(summary.pipeline.writer.checkpoints, 0);
        assert!(progress_series(&dest).await.is_none());
        assert_eq!(data_only(&dest).await, source.snapshot().await);
    }
}
