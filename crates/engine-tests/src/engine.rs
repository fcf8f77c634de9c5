#[cfg(test)]
mod tests {
    use crate::utils::{
        CountingReader, FailingWriter, GatedWriter, committed, completed, data_only,
        fixed_width, job, migrate, restricted, source_store,
    };
    use connectors::memory::MemoryStore;
    use engine_core::retry::RetryPolicy;
    use engine_runtime::{error::MigrationError, execution::executor::RunOptions};
    use model::{core::time_range::TimeRange, records::series::SeriesSet};
    use planner::sizing::PlannerOptions;
    use std::{
        sync::{Arc, atomic::Ordering},
        time::Duration,
    };
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    const SLAB: i64 = 10_000;
    const END: i64 = 4 * SLAB;

    // A failure while writing slab k leaves the checkpoint at the start of
    // slab k; the next run resumes there and the end state is complete.
    #[tokio::test]
    async fn resumes_after_failure_at_any_slab() {
        for k in 1..4 {
            let source = source_store(3, END, 200).await;
            let dest = MemoryStore::new();
            let job = job(0, END);
            let boundary = k * SLAB;

            let err = migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(FailingWriter::new(dest.clone(), boundary)),
                &dest,
                fixed_width(SLAB),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, MigrationError::Writer(_)), "k = {k}");
            assert_eq!(committed(&dest).await, Some(boundary), "k = {k}");
            assert_eq!(
                data_only(&dest).await,
                restricted(&source, TimeRange::new(0, boundary).unwrap()).await,
                "k = {k}"
            );

            let summary = completed(
                migrate(
                    &job,
                    Arc::new(source.clone()),
                    Arc::new(dest.clone()),
                    &dest,
                    fixed_width(SLAB),
                    CancellationToken::new(),
                )
                .await
                .unwrap(),
            );
            assert_eq!(summary.resume_start, boundary, "k = {k}");
            assert_eq!(summary.pipeline.reader.slabs as i64, 4 - k, "k = {k}");
            assert_eq!(committed(&dest).await, Some(END), "k = {k}");
            assert_eq!(data_only(&dest).await, source.snapshot().await, "k = {k}");
        }
    }

    // Concurrency settings change how a slab is split, never what lands in
    // the destination.
    #[tokio::test]
    async fn concurrency_does_not_change_result() {
        let source = source_store(6, 10_000, 7).await;
        let mut results: Vec<SeriesSet> = Vec::new();

        for (pulls, push) in [(1, 1), (4, 1), (1, 4), (3, 5)] {
            let dest = MemoryStore::new();
            let mut job = job(0, 10_000);
            job.concurrent_pulls = pulls;
            job.concurrent_push = push;
            let reader = Arc::new(CountingReader::new(source.clone()));

            let summary = completed(
                migrate(
                    &job,
                    reader.clone(),
                    Arc::new(dest.clone()),
                    &dest,
                    fixed_width(2_500),
                    CancellationToken::new(),
                )
                .await
                .unwrap(),
            );

            assert_eq!(summary.pipeline.writer.slabs, 4);
            assert!(reader.max_in_flight.load(Ordering::SeqCst) <= pulls);
            assert_eq!(committed(&dest).await, Some(10_000));
            results.push(data_only(&dest).await);
        }

        let expected = source.snapshot().await;
        for result in results {
            assert_eq!(result, expected);
        }
    }

    // While the writer is stuck on a slab the reader holds at most one more.
    #[tokio::test]
    async fn reader_stays_at_most_one_slab_ahead() {
        let source = source_store(2, 5 * SLAB, 500).await;
        let dest = MemoryStore::new();
        let gated = GatedWriter::new(dest.clone());
        let (gate, waiting) = (gated.gate.clone(), gated.waiting.clone());

        let run = tokio::spawn({
            let (source, dest) = (source.clone(), dest.clone());
            async move {
                migrate(
                    &job(0, 5 * SLAB),
                    Arc::new(source),
                    Arc::new(gated),
                    &dest,
                    fixed_width(SLAB),
                    CancellationToken::new(),
                )
                .await
            }
        });

        waiting.notified().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(
            source.read_count() <= 2,
            "reader fetched {} slabs while the first was unwritten",
            source.read_count()
        );

        gate.add_permits(16);
        let summary = completed(run.await.unwrap().unwrap());
        assert_eq!(summary.pipeline.writer.slabs, 5);
        assert_eq!(data_only(&dest).await, source.snapshot().await);
    }

    // Payloads above the size limit shrink later slabs without losing data.
    #[traced_test]
    #[tokio::test]
    async fn oversized_slabs_shrink_and_cover_range() {
        let end = 100_000;
        let source = source_store(3, end, 100).await;
        let dest = MemoryStore::new();
        let mut job = job(0, end);
        job.slab_size_limit_bytes = 4 * 1024;

        let options = RunOptions {
            planner: PlannerOptions {
                initial_width_ms: 20_000,
                min_width_ms: 1_000,
                max_width_ms: end,
            },
            read_retry: RetryPolicy::immediate(1),
            write_retry: RetryPolicy::immediate(1),
            ..Default::default()
        };

        let summary = completed(
            migrate(
                &job,
                Arc::new(source.clone()),
                Arc::new(dest.clone()),
                &dest,
                options,
                CancellationToken::new(),
            )
            .await
            .unwrap(),
        );

        assert!(summary.pipeline.reader.slabs > 5);
        assert_eq!(summary.pipeline.writer.last_committed, Some(end));
        assert_eq!(committed(&dest).await, Some(end));
        assert_eq!(data_only(&dest).await, source.snapshot().await);
        assert!(logs_contain("Slab payload exceeds size limit"));
    }
}
