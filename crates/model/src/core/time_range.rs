use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid time range: start {start} must be before end {end}")]
pub struct TimeRangeError {
    pub start: i64,
    pub end: i64,
}

/// Half-open interval `[start, end)` in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Result<Self, TimeRangeError> {
        if start >= end {
            return Err(TimeRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Splits the range into at most `parts` contiguous sub-ranges that cover
    /// it exactly. Never produces empty sub-ranges, so a range shorter than
    /// `parts` milliseconds yields fewer pieces.
    pub fn split(&self, parts: usize) -> Vec<TimeRange> {
        let span = self.end as i128 - self.start as i128;
        let n = (parts.max(1) as i128).min(span);
        let base = span / n;
        let rem = span % n;

        let mut out = Vec::with_capacity(n as usize);
        let mut cursor = self.start as i128;
        for i in 0..n {
            let len = base + if i < rem { 1 } else { 0 };
            out.push(TimeRange {
                start: cursor as i64,
                end: (cursor + len) as i64,
            });
            cursor += len;
        }
        out
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
