use std::collections::BTreeMap;

use tracing::debug;

use crate::chain::{ChainEvent, JobAddress};

/// Last block at which each known job worked.
///
/// The key set doubles as the active job roster. A value of `0` means the job
/// has been observed but has not worked since. Updates only move forward, so
/// replayed or reordered work events are harmless.
#[derive(Debug, Default, Clone)]
pub struct InactivityTracker {
    last_worked: BTreeMap<JobAddress, u64>,
}

impl InactivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `job`. Returns `false` if it was already tracked.
    pub fn on_job_added(&mut self, job: JobAddress) -> bool {
        if self.is_tracked(&job) {
            return false;
        }
        self.last_worked.insert(job, 0);
        true
    }

    /// Stop tracking `job`. Returns `false` if it was not tracked.
    pub fn on_job_removed(&mut self, job: JobAddress) -> bool {
        self.last_worked.remove(&job).is_some()
    }

    /// Record that `job` worked at `block_number`.
    ///
    /// Ignored for untracked jobs; never moves the stored block backwards.
    /// Returns `true` if the stored value changed.
    pub fn on_worked(&mut self, job: JobAddress, block_number: u64) -> bool {
        match self.last_worked.get_mut(&job) {
            Some(last) if block_number > *last => {
                *last = block_number;
                true
            }
            Some(_) => false,
            None => {
                debug!(%job, block_number, "ignoring work event for untracked job");
                false
            }
        }
    }

    /// Stored block for `job`, or `0` when untracked.
    pub fn last_worked_block(&self, job: &JobAddress) -> u64 {
        self.last_worked.get(job).copied().unwrap_or(0)
    }

    pub fn is_tracked(&self, job: &JobAddress) -> bool {
        self.last_worked.contains_key(job)
    }

    /// Tracked jobs in ascending address order.
    pub fn jobs(&self) -> Vec<JobAddress> {
        self.last_worked.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.last_worked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_worked.is_empty()
    }

    /// Apply a chain notification. Returns `true` if the registry changed.
    pub fn apply(&mut self, event: ChainEvent) -> bool {
        match event {
            ChainEvent::JobAdded(job) => self.on_job_added(job),
            ChainEvent::JobRemoved(job) => self.on_job_removed(job),
            ChainEvent::Worked { job, block_number } => self.on_worked(job, block_number),
        }
    }
}
