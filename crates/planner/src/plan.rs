use crate::{
    error::PlanError,
    sizing::{PlannerOptions, next_width},
};
use engine_core::progress::{ProgressTracker, now_millis};
use model::{
    core::time_range::TimeRange, execution::job::MigrationJob, records::slab::Slab,
};
use tracing::{debug, info};

/// Result of [`Planner::init`].
#[derive(Debug)]
pub enum InitOutcome {
    /// There is work left; slabs are vended by the planner.
    Proceed(Planner),
    /// The checkpoint already reaches the end of the job range.
    AlreadyComplete { resume_start: i64 },
}

/// Partitions `[resume_start, end)` into consecutive slabs.
///
/// Driven by a single sequential caller. Each emitted slab starts where the
/// previous one ended, so the emitted ranges tile the remaining interval.
#[derive(Debug)]
pub struct Planner {
    resume_start: i64,
    cursor: i64,
    end: i64,
    size_limit_bytes: u64,
    width_ms: i64,
    next_index: u64,
    options: PlannerOptions,
}

impl Planner {
    /// Establishes the resume point and builds a planner over what is left.
    ///
    /// When progress is enabled the tracker must be given; a failed lookup
    /// aborts before any data is moved.
    pub async fn init(
        job: &MigrationJob,
        tracker: Option<&ProgressTracker>,
        options: PlannerOptions,
    ) -> Result<InitOutcome, PlanError> {
        let resume_start = if job.progress_enabled {
            let tracker =
                tracker.ok_or_else(|| PlanError::MissingProgressSource(job.name.clone()))?;
            match tracker.fetch_last(now_millis()).await? {
                Some(checkpoint) => {
                    info!(
                        job = %job.name,
                        checkpoint = checkpoint.last_committed_max_timestamp,
                        "Resuming from checkpoint"
                    );
                    checkpoint.resume_point(&job.range)
                }
                None => job.range.start,
            }
        } else {
            job.range.start
        };

        Ok(Self::from_resume_point(job, resume_start, options))
    }

    pub fn from_resume_point(
        job: &MigrationJob,
        resume_start: i64,
        options: PlannerOptions,
    ) -> InitOutcome {
        let resume_start = resume_start.max(job.range.start);
        if resume_start >= job.range.end {
            info!(
                job = %job.name,
                resume_start,
                end = job.range.end,
                "Nothing left to migrate"
            );
            return InitOutcome::AlreadyComplete { resume_start };
        }

        let remaining = job.range.end - resume_start;
        let width_ms = options.clamp(options.initial_width_ms).min(remaining);

        debug!(
            job = %job.name,
            resume_start,
            end = job.range.end,
            width_ms,
            "Planner initialized"
        );

        InitOutcome::Proceed(Planner {
            resume_start,
            cursor: resume_start,
            end: job.range.end,
            size_limit_bytes: job.slab_size_limit_bytes,
            width_ms,
            next_index: 0,
            options,
        })
    }

    /// The next slab in time order, or `None` once the range is exhausted.
    pub fn next_slab(&mut self) -> Option<Slab> {
        if self.cursor >= self.end {
            return None;
        }

        let start = self.cursor;
        let end = start.saturating_add(self.width_ms).min(self.end);
        let slab = Slab::new(
            self.next_index,
            TimeRange { start, end },
            self.size_limit_bytes,
        );

        self.cursor = end;
        self.next_index += 1;
        Some(slab)
    }

    /// Feeds back the observed payload size of an emitted slab. Only the most
    /// recently emitted slab influences the next width.
    pub fn report_size(&mut self, index: u64, observed_bytes: u64) {
        if index + 1 != self.next_index {
            debug!(
                slab = index,
                latest = self.next_index.saturating_sub(1),
                "Ignoring size report for stale slab"
            );
            return;
        }

        let previous = self.width_ms;
        self.width_ms = next_width(
            previous,
            self.size_limit_bytes,
            observed_bytes,
            &self.options,
        );
        debug!(
            slab = index,
            bytes = observed_bytes,
            limit = self.size_limit_bytes,
            previous_ms = previous,
            next_ms = self.width_ms,
            "Adjusted slab width"
        );
    }

    pub fn resume_start(&self) -> i64 {
        self.resume_start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    #[cfg(test)]
    fn width_ms(&self) -> i64 {
        self.width_ms
    }

    #[cfg(test)]
    fn is_exhausted(&self) -> bool {
        self.cursor >= self.end
    }
}
