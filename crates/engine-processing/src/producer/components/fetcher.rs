use crate::{error::ReaderError, producer::config::ReaderConfig, retry::classify_client_error};
use connectors::{error::ClientError, remote::RemoteReader};
use engine_core::{metrics::Metrics, retry::RetryPolicy};
use model::{
    core::{matcher::Matcher, time_range::TimeRange},
    records::series::SeriesSet,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fetches the payload of one slab, optionally split into concurrent
/// sub-range fetches.
#[derive(Clone)]
pub struct SlabFetcher {
    client: Arc<dyn RemoteReader>,
    selector: Arc<[Matcher]>,
    concurrent_pulls: usize,
    retry: RetryPolicy,
    cancel: CancellationToken,
    metrics: Metrics,
}

impl SlabFetcher {
    pub fn new(
        client: Arc<dyn RemoteReader>,
        config: ReaderConfig,
        cancel: CancellationToken,
        metrics: Metrics,
    ) -> Self {
        Self {
            client,
            selector: config.selector.into(),
            concurrent_pulls: config.concurrent_pulls.max(1),
            retry: config.retry,
            cancel,
            metrics,
        }
    }

    /// Returns every sample of the selected series inside `range`.
    ///
    /// With more than one pull the range is split into contiguous sub-ranges
    /// fetched concurrently; the merged result does not depend on the order
    /// they complete in.
    pub async fn fetch(&self, range: TimeRange) -> Result<SeriesSet, ReaderError> {
        if self.concurrent_pulls <= 1 {
            return self.fetch_part(range).await;
        }

        let parts = range.split(self.concurrent_pulls);
        debug!(range = %range, parts = parts.len(), "Fetching slab concurrently");

        let mut tasks = JoinSet::new();
        for part in parts {
            let fetcher = self.clone();
            tasks.spawn(async move { fetcher.fetch_part(part).await });
        }

        let mut results = Vec::with_capacity(self.concurrent_pulls);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(partial)) => results.push(partial),
                Ok(Err(err)) => {
                    tasks.abort_all();
                    return Err(err);
                }
                Err(err) => {
                    tasks.abort_all();
                    return Err(ReaderError::Task(err.to_string()));
                }
            }
        }

        Ok(SeriesSet::merge(results))
    }

    async fn fetch_part(&self, range: TimeRange) -> Result<SeriesSet, ReaderError> {
        let attempts = AtomicU64::new(0);

        let result = self
            .retry
            .run(
                &self.cancel,
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    let client = Arc::clone(&self.client);
                    let selector = Arc::clone(&self.selector);
                    let cancel = self.cancel.clone();
                    async move {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(ClientError::Cancelled),
                            res = client.read_range(range, &selector) => res,
                        }
                    }
                },
                classify_client_error,
            )
            .await;

        let retries = attempts.load(Ordering::Relaxed).saturating_sub(1);
        if retries > 0 {
            self.metrics.increment_read_retries(retries);
        }

        result.map_err(|err| ReaderError::from_retry(range, err))
    }
}
