use crate::error::ClientError;
use async_trait::async_trait;
use model::{
    core::{matcher::Matcher, time_range::TimeRange},
    records::series::SeriesSet,
};

/// Read side of a time-series store.
#[async_trait]
pub trait RemoteReader: Send + Sync {
    /// Returns every sample in `range` (half-open) of the series matching
    /// all of `selector`.
    async fn read_range(
        &self,
        range: TimeRange,
        selector: &[Matcher],
    ) -> Result<SeriesSet, ClientError>;
}

/// Write side of a time-series store.
#[async_trait]
pub trait RemoteWriter: Send + Sync {
    /// Pushes the whole payload. `Ok` means the store acknowledged all of it.
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError>;
}
