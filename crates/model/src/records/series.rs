use crate::core::{labels::Labels, time_range::TimeRange};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, btree_map::Entry};

/// Approximate in-memory footprint of one sample (timestamp + value).
pub const SAMPLE_SIZE_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub labels: Labels,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(labels: Labels, samples: Vec<Sample>) -> Self {
        Self { labels, samples }
    }

    pub fn size_bytes(&self) -> usize {
        self.labels.size_bytes() + self.samples.len() * SAMPLE_SIZE_BYTES
    }
}

/// Payload of a slab: a canonical set of series.
///
/// Canonical means series are sorted by label set with one entry per label
/// set, and each series' samples are sorted by timestamp with one sample per
/// timestamp. Because every constructor canonicalizes, two sets holding the
/// same points compare equal no matter how they were assembled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Vec<Series>")]
pub struct SeriesSet {
    series: Vec<Series>,
}

impl Serialize for SeriesSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.series.serialize(serializer)
    }
}

impl From<Vec<Series>> for SeriesSet {
    fn from(series: Vec<Series>) -> Self {
        Self::from_series(series)
    }
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_series(series: impl IntoIterator<Item = Series>) -> Self {
        let mut acc = Accumulator::default();
        for s in series {
            acc.add(s);
        }
        acc.finish()
    }

    /// Merges partial results into one set. The result depends only on the
    /// points contained in `parts`, never on the order the parts arrive in.
    pub fn merge(parts: impl IntoIterator<Item = SeriesSet>) -> Self {
        let mut acc = Accumulator::default();
        for part in parts {
            for s in part.series {
                acc.add(s);
            }
        }
        acc.finish()
    }

    /// Partitions the set into at most `shards` non-empty sets by series
    /// fingerprint. Every series lands in exactly one shard.
    pub fn shard(self, shards: usize) -> Vec<SeriesSet> {
        let shards = shards.max(1);
        if shards == 1 {
            return vec![self];
        }

        let mut buckets: Vec<Vec<Series>> = (0..shards).map(|_| Vec::new()).collect();
        for s in self.series {
            let idx = (s.labels.fingerprint() % shards as u64) as usize;
            buckets[idx].push(s);
        }

        buckets
            .into_iter()
            .filter(|b| !b.is_empty())
            // Buckets preserve the canonical order of the parent set.
            .map(|series| SeriesSet { series })
            .collect()
    }

    /// Keeps only samples inside `range`, dropping series left empty.
    pub fn retain_range(&mut self, range: &TimeRange) {
        for s in &mut self.series {
            s.samples.retain(|sample| range.contains(sample.timestamp));
        }
        self.series.retain(|s| !s.samples.is_empty());
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn into_series(self) -> Vec<Series> {
        self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.samples.len()).sum()
    }

    pub fn size_bytes(&self) -> usize {
        self.series.iter().map(Series::size_bytes).sum()
    }
}

#[derive(Default)]
struct Accumulator {
    series: BTreeMap<Labels, BTreeMap<i64, f64>>,
}

impl Accumulator {
    fn add(&mut self, series: Series) {
        let points = self.series.entry(series.labels).or_default();
        for sample in series.samples {
            match points.entry(sample.timestamp) {
                Entry::Vacant(slot) => {
                    slot.insert(sample.value);
                }
                // Conflicting duplicates resolve to the greater value so the
                // outcome is independent of arrival order.
                Entry::Occupied(mut slot) => {
                    if sample.value.total_cmp(slot.get()).is_gt() {
                        slot.insert(sample.value);
                    }
                }
            }
        }
    }

    fn finish(self) -> SeriesSet {
        let series = self
            .series
            .into_iter()
            .map(|(labels, points)| Series {
                labels,
                samples: points
                    .into_iter()
                    .map(|(timestamp, value)| Sample { timestamp, value })
                    .collect(),
            })
            .collect();
        SeriesSet { series }
    }
}
