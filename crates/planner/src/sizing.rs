use serde::{Deserialize, Serialize};

pub const DEFAULT_INITIAL_WIDTH_MS: i64 = 5 * 60 * 1000;
pub const DEFAULT_MIN_WIDTH_MS: i64 = 1000;
pub const DEFAULT_MAX_WIDTH_MS: i64 = 24 * 60 * 60 * 1000;

/// Fraction of the size limit the controller aims for.
const TARGET_FILL: f64 = 0.9;

/// Upper bound on how much a single observation may widen the next slab.
const MAX_GROWTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOptions {
    pub initial_width_ms: i64,
    pub min_width_ms: i64,
    pub max_width_ms: i64,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            initial_width_ms: DEFAULT_INITIAL_WIDTH_MS,
            min_width_ms: DEFAULT_MIN_WIDTH_MS,
            max_width_ms: DEFAULT_MAX_WIDTH_MS,
        }
    }
}

impl PlannerOptions {
    pub fn with_initial_width(mut self, width_ms: i64) -> Self {
        self.initial_width_ms = width_ms;
        self
    }

    /// Bounds with `1 <= min <= max`, whatever the caller supplied.
    pub(crate) fn bounds(&self) -> (i64, i64) {
        let min = self.min_width_ms.max(1);
        (min, self.max_width_ms.max(min))
    }

    pub(crate) fn clamp(&self, width_ms: i64) -> i64 {
        let (min, max) = self.bounds();
        width_ms.clamp(min, max)
    }
}

/// Proportional feedback: scale the width so that the next payload lands near
/// `TARGET_FILL * limit`. Growth per step is capped, shrinking is not.
pub fn next_width(
    current_ms: i64,
    limit_bytes: u64,
    observed_bytes: u64,
    options: &PlannerOptions,
) -> i64 {
    if limit_bytes == 0 {
        return options.clamp(current_ms);
    }

    let factor = if observed_bytes == 0 {
        MAX_GROWTH
    } else {
        ((limit_bytes as f64 * TARGET_FILL) / observed_bytes as f64).min(MAX_GROWTH)
    };

    let scaled = (current_ms as f64 * factor).round();
    let scaled = if scaled >= i64::MAX as f64 {
        i64::MAX
    } else {
        scaled as i64
    };
    options.clamp(scaled)
}
