use std::collections::BTreeSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::chain::{ChainError, ChainEvent, ChainReader, JobAddress, SequencedEvent};

/// Turns sequencer and job logs into [`ChainEvent`]s.
///
/// Each job is either unknown or watched. `AddJob` starts watching a job's
/// `Work` logs and `RemoveJob` stops it; work from unwatched jobs is dropped.
/// Logs are read by polling `[next_block, head]` in bounded ranges.
#[derive(Debug)]
pub struct SubscriptionManager {
    watched: BTreeSet<JobAddress>,
    next_block: Option<u64>,
    last_head: Option<u64>,
    max_block_range: u64,
}

impl SubscriptionManager {
    pub fn new(max_block_range: u64) -> Self {
        Self {
            watched: BTreeSet::new(),
            next_block: None,
            last_head: None,
            max_block_range: max_block_range.max(1),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.next_block.is_some()
    }

    /// Start watching `jobs` with logs from `from_block` onwards.
    ///
    /// Only the first call has an effect; returns whether it attached.
    pub fn attach(&mut self, jobs: &[JobAddress], from_block: u64) -> bool {
        if self.is_attached() {
            debug!("subscriptions already attached");
            return false;
        }
        self.watched.extend(jobs.iter().copied());
        self.next_block = Some(from_block);
        info!(jobs = jobs.len(), from_block, "subscriptions attached");
        true
    }

    pub fn is_watching(&self, job: &JobAddress) -> bool {
        self.watched.contains(job)
    }

    pub fn next_block(&self) -> Option<u64> {
        self.next_block
    }

    /// Whether the last poll reached the head it observed.
    pub fn is_caught_up(&self) -> bool {
        match (self.next_block, self.last_head) {
            (Some(next), Some(head)) => next > head,
            _ => false,
        }
    }

    /// Read the next block range and return its events in chain order.
    ///
    /// The cursor only advances when every query for the range succeeded.
    pub async fn poll_once<R: ChainReader>(
        &mut self,
        reader: &R,
    ) -> Result<Vec<ChainEvent>, ChainError> {
        let Some(from) = self.next_block else {
            return Ok(Vec::new());
        };

        let head = reader.current_block_number().await?;
        self.last_head = Some(head);
        if from > head {
            return Ok(Vec::new());
        }
        let to = head.min(from.saturating_add(self.max_block_range - 1));

        let roster = reader.roster_logs(from, to).await?;

        // Jobs added inside the range may already have worked in it.
        let mut candidates = self.watched.clone();
        for entry in &roster {
            if let ChainEvent::JobAdded(job) = entry.event {
                candidates.insert(job);
            }
        }
        let candidates: Vec<JobAddress> = candidates.into_iter().collect();
        let work = reader.work_logs(&candidates, from, to).await?;

        let mut sequenced: Vec<SequencedEvent> = roster.into_iter().chain(work).collect();
        sequenced.sort_by_key(SequencedEvent::position);

        let mut events = Vec::with_capacity(sequenced.len());
        for entry in sequenced {
            match entry.event {
                ChainEvent::JobAdded(job) => {
                    if self.watched.insert(job) {
                        info!(%job, block = entry.block_number, "job added to sequencer");
                    }
                    events.push(entry.event);
                }
                ChainEvent::JobRemoved(job) => {
                    if self.watched.remove(&job) {
                        info!(%job, block = entry.block_number, "job removed from sequencer");
                    }
                    events.push(entry.event);
                }
                ChainEvent::Worked { job, block_number } => {
                    if self.is_watching(&job) {
                        debug!(%job, block_number, "job worked");
                        events.push(entry.event);
                    }
                }
            }
        }

        self.next_block = Some(to.saturating_add(1));
        Ok(events)
    }

    /// Poll forever, pushing events into `events`.
    ///
    /// Poll failures are logged and retried on the next tick. Returns when
    /// the receiving side of the queue is dropped.
    pub async fn run<R: ChainReader>(
        &mut self,
        reader: &R,
        events: mpsc::Sender<ChainEvent>,
        poll_interval: Duration,
    ) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // Drain backlogs without waiting a full tick between ranges.
            loop {
                match self.poll_once(reader).await {
                    Ok(batch) => {
                        for event in batch {
                            if events.send(event).await.is_err() {
                                info!("event queue closed, stopping subscriptions");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, next_block = ?self.next_block, "log poll failed");
                        break;
                    }
                }
                if self.is_caught_up() {
                    break;
                }
            }
        }
    }
}
