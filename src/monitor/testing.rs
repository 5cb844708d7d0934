//! In-memory chain and alert sink used by the monitor tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::alert::{AlertError, AlertSink};
use crate::chain::{
    ChainError, ChainEvent, ChainReader, JobAddress, NetworkId, SequencedEvent, Window,
};

#[derive(Default)]
pub struct MockChain {
    head: Mutex<u64>,
    jobs: Mutex<Vec<JobAddress>>,
    networks: Mutex<Vec<(NetworkId, Window)>>,
    workable: Mutex<HashMap<JobAddress, bool>>,
    roster: Mutex<Vec<SequencedEvent>>,
    work: Mutex<Vec<SequencedEvent>>,
    work_queries: Mutex<Vec<Vec<JobAddress>>>,
    network_reads: AtomicUsize,
    fail_head: AtomicBool,
    fail_networks: AtomicBool,
    fail_logs: AtomicBool,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        Self {
            head: Mutex::new(head),
            ..Default::default()
        }
    }

    pub fn with_jobs(self, jobs: Vec<JobAddress>) -> Self {
        *self.jobs.lock().unwrap() = jobs;
        self
    }

    pub fn with_networks(self, networks: Vec<(NetworkId, Window)>) -> Self {
        *self.networks.lock().unwrap() = networks;
        self
    }

    pub fn with_workable(self, job: JobAddress, workable: bool) -> Self {
        self.workable.lock().unwrap().insert(job, workable);
        self
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = head;
    }

    pub fn push_roster(&self, block_number: u64, log_index: u64, event: ChainEvent) {
        self.roster.lock().unwrap().push(SequencedEvent {
            block_number,
            log_index,
            event,
        });
    }

    pub fn push_work(&self, job: JobAddress, block_number: u64, log_index: u64) {
        self.work.lock().unwrap().push(SequencedEvent {
            block_number,
            log_index,
            event: ChainEvent::Worked { job, block_number },
        });
    }

    pub fn fail_head(&self, fail: bool) {
        self.fail_head.store(fail, Ordering::SeqCst);
    }

    pub fn fail_network_reads(&self, fail: bool) {
        self.fail_networks.store(fail, Ordering::SeqCst);
    }

    pub fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    pub fn network_reads(&self) -> usize {
        self.network_reads.load(Ordering::SeqCst)
    }

    /// Address sets passed to each `work_logs` call.
    pub fn work_queries(&self) -> Vec<Vec<JobAddress>> {
        self.work_queries.lock().unwrap().clone()
    }
}

fn in_range(events: &[SequencedEvent], from: u64, to: u64) -> Vec<SequencedEvent> {
    events
        .iter()
        .filter(|e| e.block_number >= from && e.block_number <= to)
        .copied()
        .collect()
}

impl ChainReader for MockChain {
    async fn current_block_number(&self) -> Result<u64, ChainError> {
        if self.fail_head.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("head unavailable".into()));
        }
        Ok(*self.head.lock().unwrap())
    }

    async fn list_jobs(&self) -> Result<Vec<JobAddress>, ChainError> {
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn list_networks_with_windows(&self) -> Result<Vec<(NetworkId, Window)>, ChainError> {
        self.network_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_networks.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("networks unavailable".into()));
        }
        Ok(self.networks.lock().unwrap().clone())
    }

    async fn is_workable(&self, job: JobAddress, _network: NetworkId) -> Result<bool, ChainError> {
        Ok(self
            .workable
            .lock()
            .unwrap()
            .get(&job)
            .copied()
            .unwrap_or(false))
    }

    async fn roster_logs(&self, from: u64, to: u64) -> Result<Vec<SequencedEvent>, ChainError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("logs unavailable".into()));
        }
        Ok(in_range(&self.roster.lock().unwrap(), from, to))
    }

    async fn work_logs(
        &self,
        jobs: &[JobAddress],
        from: u64,
        to: u64,
    ) -> Result<Vec<SequencedEvent>, ChainError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("logs unavailable".into()));
        }
        self.work_queries.lock().unwrap().push(jobs.to_vec());
        Ok(in_range(&self.work.lock().unwrap(), from, to)
            .into_iter()
            .filter(|e| jobs.contains(&e.event.job()))
            .collect())
    }
}

#[derive(Default)]
pub struct MockSink {
    messages: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        sink
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl AlertSink for MockSink {
    async fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AlertError::ApiError {
                status: 500,
                message: "mock failure".into(),
            });
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}
