use crate::{error::WriterError, retry::classify_client_error};
use connectors::{error::ClientError, remote::RemoteWriter};
use engine_core::{
    metrics::Metrics,
    retry::{RetryError, RetryPolicy},
};
use model::{core::time_range::TimeRange, records::series::SeriesSet};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Pushes slab payloads and checkpoint samples to the target store.
#[derive(Clone)]
pub struct SlabPusher {
    client: Arc<dyn RemoteWriter>,
    concurrent_push: usize,
    retry: RetryPolicy,
    cancel: CancellationToken,
    metrics: Metrics,
}

impl SlabPusher {
    pub fn new(
        client: Arc<dyn RemoteWriter>,
        concurrent_push: usize,
        retry: RetryPolicy,
        cancel: CancellationToken,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            concurrent_push: concurrent_push.max(1),
            retry,
            cancel,
            metrics,
        }
    }

    /// Pushes the whole payload. Returns only once every shard has been
    /// acknowledged, or with the first shard failure.
    pub async fn push(&self, range: TimeRange, payload: SeriesSet) -> Result<(), WriterError> {
        if payload.is_empty() {
            debug!(range = %range, "Empty payload, nothing to push");
            return Ok(());
        }

        let mut shards = payload.shard(self.concurrent_push);
        if shards.len() == 1 {
            let shard = Arc::new(shards.remove(0));
            return self
                .push_part(shard)
                .await
                .map_err(|err| WriterError::from_retry(range, err));
        }

        debug!(range = %range, shards = shards.len(), "Pushing slab concurrently");
        let mut tasks = JoinSet::new();
        for shard in shards {
            let pusher = self.clone();
            let shard = Arc::new(shard);
            tasks.spawn(async move { pusher.push_part(shard).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(WriterError::from_retry(range, err));
                }
                Err(err) => {
                    tasks.abort_all();
                    return Err(WriterError::Task(err.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Pushes a checkpoint sample under the same retry budget as data.
    pub async fn push_checkpoint(
        &self,
        boundary: i64,
        sample: SeriesSet,
    ) -> Result<(), WriterError> {
        self.push_part(Arc::new(sample))
            .await
            .map_err(|err| WriterError::from_checkpoint_retry(boundary, err))
    }

    async fn push_part(&self, part: Arc<SeriesSet>) -> Result<(), RetryError<ClientError>> {
        let attempts = AtomicU64::new(0);

        let result = self
            .retry
            .run(
                &self.cancel,
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    let client = Arc::clone(&self.client);
                    let part = Arc::clone(&part);
                    let cancel = self.cancel.clone();
                    async move {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(ClientError::Cancelled),
                            res = client.write_batch(&part) => res,
                        }
                    }
                },
                classify_client_error,
            )
            .await;

        let retries = attempts.load(Ordering::Relaxed).saturating_sub(1);
        if retries > 0 {
            self.metrics.increment_write_retries(retries);
        }
        result
    }
}
