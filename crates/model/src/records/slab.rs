use crate::{core::time_range::TimeRange, records::series::SeriesSet};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Lifecycle of a slab. Moves strictly forward; `Failed` is reachable from
/// any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlabState {
    Pending,
    Reading,
    Read,
    Writing,
    Written,
    Failed,
}

impl SlabState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlabState::Pending => "pending",
            SlabState::Reading => "reading",
            SlabState::Read => "read",
            SlabState::Writing => "writing",
            SlabState::Written => "written",
            SlabState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SlabState::Written | SlabState::Failed)
    }

    fn can_transition_to(self, next: SlabState) -> bool {
        use SlabState::*;
        match (self, next) {
            (Pending, Reading) | (Reading, Read) | (Read, Writing) | (Writing, Written) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for SlabState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlabStateError {
    #[error("Slab {index} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        index: u64,
        from: SlabState,
        to: SlabState,
    },
}

/// Unit of migration work: a time range plus the data fetched for it.
///
/// Deliberately not `Clone`: a slab is owned by exactly one stage at a time
/// and is moved from planner to reader to writer.
#[derive(Debug)]
pub struct Slab {
    index: u64,
    range: TimeRange,
    size_limit_bytes: u64,
    payload: SeriesSet,
    state: SlabState,
}

impl Slab {
    pub fn new(index: u64, range: TimeRange, size_limit_bytes: u64) -> Self {
        Self {
            index,
            range,
            size_limit_bytes,
            payload: SeriesSet::default(),
            state: SlabState::Pending,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn size_limit_bytes(&self) -> u64 {
        self.size_limit_bytes
    }

    pub fn state(&self) -> SlabState {
        self.state
    }

    pub fn payload(&self) -> &SeriesSet {
        &self.payload
    }

    /// Moves the payload out, leaving an empty set behind.
    pub fn take_payload(&mut self) -> SeriesSet {
        std::mem::take(&mut self.payload)
    }

    pub fn begin_read(&mut self) -> Result<(), SlabStateError> {
        self.transition(SlabState::Reading)
    }

    pub fn complete_read(&mut self, payload: SeriesSet) -> Result<(), SlabStateError> {
        self.transition(SlabState::Read)?;
        self.payload = payload;
        Ok(())
    }

    pub fn begin_write(&mut self) -> Result<(), SlabStateError> {
        self.transition(SlabState::Writing)
    }

    /// Marks the slab written and releases its payload.
    pub fn complete_write(&mut self) -> Result<(), SlabStateError> {
        self.transition(SlabState::Written)?;
        self.payload = SeriesSet::default();
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), SlabStateError> {
        self.transition(SlabState::Failed)
    }

    fn transition(&mut self, next: SlabState) -> Result<(), SlabStateError> {
        if !self.state.can_transition_to(next) {
            return Err(SlabStateError::InvalidTransition {
                index: self.index,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
