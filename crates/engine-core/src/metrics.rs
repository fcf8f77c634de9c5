use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    slabs_read: AtomicU64,
    slabs_written: AtomicU64,
    series_written: AtomicU64,
    samples_written: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    read_retries: AtomicU64,
    write_retries: AtomicU64,
    checkpoints: AtomicU64,
}

/// Run-wide counters shared by the reader and the writer.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub slabs_read: u64,
    pub slabs_written: u64,
    pub series_written: u64,
    pub samples_written: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub read_retries: u64,
    pub write_retries: u64,
    pub checkpoints: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn record_read(&self, bytes: u64) {
        self.inner.slabs_read.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_write(&self, series: u64, samples: u64, bytes: u64) {
        self.inner.slabs_written.fetch_add(1, Ordering::Relaxed);
        self.inner
            .series_written
            .fetch_add(series, Ordering::Relaxed);
        self.inner
            .samples_written
            .fetch_add(samples, Ordering::Relaxed);
        self.inner.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_read_retries(&self, count: u64) {
        self.inner.read_retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_write_retries(&self, count: u64) {
        self.inner.write_retries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_checkpoints(&self) {
        self.inner.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            slabs_read: self.inner.slabs_read.load(Ordering::Relaxed),
            slabs_written: self.inner.slabs_written.load(Ordering::Relaxed),
            series_written: self.inner.series_written.load(Ordering::Relaxed),
            samples_written: self.inner.samples_written.load(Ordering::Relaxed),
            bytes_read: self.inner.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.inner.bytes_written.load(Ordering::Relaxed),
            read_retries: self.inner.read_retries.load(Ordering::Relaxed),
            write_retries: self.inner.write_retries.load(Ordering::Relaxed),
            checkpoints: self.inner.checkpoints.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
