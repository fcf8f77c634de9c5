use crate::{
    error::ClientError,
    remote::{RemoteReader, RemoteWriter},
};
use async_trait::async_trait;
use model::{
    core::{
        labels::Labels,
        matcher::{MatchOp, Matcher},
        time_range::TimeRange,
    },
    records::series::{Sample, Series, SeriesSet},
};
use regex::Regex;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Mutex;

type Points = BTreeMap<i64, f64>;

/// In-process time-series store implementing both client capabilities.
///
/// Writing a point that already exists overwrites it, so replaying a slab
/// is idempotent. Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<Labels, Points>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_data(set: SeriesSet) -> Self {
        let store = Self::new();
        store.insert(&set).await;
        store
    }

    pub async fn insert(&self, set: &SeriesSet) {
        let mut data = self.data.lock().await;
        for series in set.series() {
            let points = data.entry(series.labels.clone()).or_default();
            for sample in &series.samples {
                points.insert(sample.timestamp, sample.value);
            }
        }
    }

    /// Everything currently stored.
    pub async fn snapshot(&self) -> SeriesSet {
        let data = self.data.lock().await;
        SeriesSet::from_series(data.iter().map(|(labels, points)| to_series(labels, points)))
    }

    pub async fn series_count(&self) -> usize {
        self.data.lock().await.len()
    }

    /// Number of `read_range` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write_batch` calls accepted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteReader for MemoryStore {
    async fn read_range(
        &self,
        range: TimeRange,
        selector: &[Matcher],
    ) -> Result<SeriesSet, ClientError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let compiled = selector
            .iter()
            .map(CompiledMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let data = self.data.lock().await;
        let series = data
            .iter()
            .filter(|(labels, _)| compiled.iter().all(|m| m.matches(labels)))
            .map(|(labels, points)| Series {
                labels: labels.clone(),
                samples: points
                    .range(range.start..range.end)
                    .map(|(&timestamp, &value)| Sample { timestamp, value })
                    .collect(),
            })
            .filter(|s| !s.samples.is_empty());

        Ok(SeriesSet::from_series(series))
    }
}

#[async_trait]
impl RemoteWriter for MemoryStore {
    async fn write_batch(&self, payload: &SeriesSet) -> Result<(), ClientError> {
        self.insert(payload).await;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn to_series(labels: &Labels, points: &Points) -> Series {
    Series {
        labels: labels.clone(),
        samples: points
            .iter()
            .map(|(&timestamp, &value)| Sample { timestamp, value })
            .collect(),
    }
}

enum Pattern {
    Literal(String),
    Regex(Regex),
}

struct CompiledMatcher {
    name: String,
    pattern: Pattern,
    negate: bool,
}

impl CompiledMatcher {
    fn compile(matcher: &Matcher) -> Result<Self, ClientError> {
        let regex = |value: &str| {
            Regex::new(&format!("^(?:{value})$"))
                .map(Pattern::Regex)
                .map_err(|e| ClientError::InvalidRequest(format!("matcher {matcher}: {e}")))
        };
        let (pattern, negate) = match matcher.op {
            MatchOp::Equal => (Pattern::Literal(matcher.value.clone()), false),
            MatchOp::NotEqual => (Pattern::Literal(matcher.value.clone()), true),
            MatchOp::Regex => (regex(&matcher.value)?, false),
            MatchOp::NotRegex => (regex(&matcher.value)?, true),
        };
        Ok(Self {
            name: matcher.name.clone(),
            pattern,
            negate,
        })
    }

    /// Absent labels match as the empty string.
    fn matches(&self, labels: &Labels) -> bool {
        let value = labels.get(&self.name).unwrap_or("");
        let hit = match &self.pattern {
            Pattern::Literal(expected) => value == expected,
            Pattern::Regex(re) => re.is_match(value),
        };
        hit != self.negate
    }
}
