use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use tracing::{debug, warn};

use super::abi::{IJob, ISequencer, event_topics};
use super::error::ChainError;
use super::types::{ChainEvent, JobAddress, NetworkId, SequencedEvent, Window};

/// Read-only view of the sequencer, its jobs and their logs.
///
/// Every method is a suspension point; callers treat errors as transient.
pub trait ChainReader {
    async fn current_block_number(&self) -> Result<u64, ChainError>;

    /// Jobs registered in the sequencer, in `jobAt` order.
    async fn list_jobs(&self) -> Result<Vec<JobAddress>, ChainError>;

    /// Networks in `networkAt` order, each with its current window.
    async fn list_networks_with_windows(&self) -> Result<Vec<(NetworkId, Window)>, ChainError>;

    async fn is_workable(&self, job: JobAddress, network: NetworkId) -> Result<bool, ChainError>;

    /// `AddJob`/`RemoveJob` logs emitted by the sequencer in `[from, to]`.
    async fn roster_logs(&self, from: u64, to: u64) -> Result<Vec<SequencedEvent>, ChainError>;

    /// `Work` logs emitted by `jobs` in `[from, to]`.
    async fn work_logs(
        &self,
        jobs: &[JobAddress],
        from: u64,
        to: u64,
    ) -> Result<Vec<SequencedEvent>, ChainError>;
}

/// [`ChainReader`] backed by a JSON-RPC node.
pub struct RpcChainReader {
    provider: DynProvider,
    sequencer: Address,
    work_topics: Vec<B256>,
}

impl RpcChainReader {
    /// Connect to `rpc_url` and bind the sequencer at `sequencer`.
    pub async fn connect(
        rpc_url: &str,
        sequencer: Address,
        work_event_signatures: &[String],
    ) -> Result<Self, ChainError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| ChainError::Rpc(format!("failed to connect to {rpc_url}: {e}")))?
            .erased();

        Ok(Self {
            provider,
            sequencer,
            work_topics: event_topics(work_event_signatures),
        })
    }

    pub fn sequencer(&self) -> Address {
        self.sequencer
    }
}

impl ChainReader for RpcChainReader {
    async fn current_block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn list_jobs(&self) -> Result<Vec<JobAddress>, ChainError> {
        let sequencer = ISequencer::new(self.sequencer, &self.provider);

        let count: u64 = sequencer
            .numJobs()
            .call()
            .await
            .map_err(|e| ChainError::contract("numJobs", e))?
            .saturating_to();

        let mut jobs = Vec::new();
        for index in 0..count {
            let job = sequencer
                .jobAt(U256::from(index))
                .call()
                .await
                .map_err(|e| ChainError::contract("jobAt", e))?;
            jobs.push(job);
        }
        Ok(jobs)
    }

    async fn list_networks_with_windows(&self) -> Result<Vec<(NetworkId, Window)>, ChainError> {
        let sequencer = ISequencer::new(self.sequencer, &self.provider);

        let count: u64 = sequencer
            .numNetworks()
            .call()
            .await
            .map_err(|e| ChainError::contract("numNetworks", e))?
            .saturating_to();

        let mut networks = Vec::new();
        for index in 0..count {
            let network = sequencer
                .networkAt(U256::from(index))
                .call()
                .await
                .map_err(|e| ChainError::contract("networkAt", e))?;
            let window = sequencer
                .windows(network)
                .call()
                .await
                .map_err(|e| ChainError::contract("windows", e))?;
            networks.push((
                network,
                Window::new(window.start.saturating_to(), window.length.saturating_to()),
            ));
        }
        Ok(networks)
    }

    async fn is_workable(&self, job: JobAddress, network: NetworkId) -> Result<bool, ChainError> {
        let contract = IJob::new(job, &self.provider);
        let result = contract
            .workable(network)
            .call()
            .await
            .map_err(|e| ChainError::contract("workable", e))?;
        Ok(result._0)
    }

    async fn roster_logs(&self, from: u64, to: u64) -> Result<Vec<SequencedEvent>, ChainError> {
        let filter = Filter::new()
            .address(self.sequencer)
            .event_signature(vec![
                ISequencer::AddJob::SIGNATURE_HASH,
                ISequencer::RemoveJob::SIGNATURE_HASH,
            ])
            .from_block(from)
            .to_block(to);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs.iter().filter(|log| !log.removed) {
            match decode_roster_log(log) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => warn!(
                    error = %e,
                    tx = ?log.transaction_hash,
                    "skipping undecodable sequencer log"
                ),
            }
        }

        debug!(from, to, count = events.len(), "fetched sequencer logs");
        Ok(events)
    }

    async fn work_logs(
        &self,
        jobs: &[JobAddress],
        from: u64,
        to: u64,
    ) -> Result<Vec<SequencedEvent>, ChainError> {
        // An empty address list would match every contract on the chain.
        if jobs.is_empty() || self.work_topics.is_empty() {
            return Ok(Vec::new());
        }

        let filter = Filter::new()
            .address(jobs.to_vec())
            .event_signature(self.work_topics.clone())
            .from_block(from)
            .to_block(to);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs.iter().filter(|log| !log.removed) {
            match decode_work_log(log) {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    error = %e,
                    job = %log.inner.address,
                    tx = ?log.transaction_hash,
                    "skipping undecodable work log"
                ),
            }
        }

        debug!(from, to, jobs = jobs.len(), count = events.len(), "fetched work logs");
        Ok(events)
    }
}

/// `None` for logs that are neither `AddJob` nor `RemoveJob`.
fn decode_roster_log(log: &Log) -> Result<Option<SequencedEvent>, ChainError> {
    let event = match log.topic0() {
        Some(topic) if *topic == ISequencer::AddJob::SIGNATURE_HASH => {
            let decoded = ISequencer::AddJob::decode_log_data(&log.inner.data)
                .map_err(|e| ChainError::Decode(format!("AddJob: {e}")))?;
            ChainEvent::JobAdded(decoded.job)
        }
        Some(topic) if *topic == ISequencer::RemoveJob::SIGNATURE_HASH => {
            let decoded = ISequencer::RemoveJob::decode_log_data(&log.inner.data)
                .map_err(|e| ChainError::Decode(format!("RemoveJob: {e}")))?;
            ChainEvent::JobRemoved(decoded.job)
        }
        _ => return Ok(None),
    };
    sequenced(log, event).map(Some)
}

fn decode_work_log(log: &Log) -> Result<SequencedEvent, ChainError> {
    let block_number = log
        .block_number
        .ok_or_else(|| ChainError::Decode("Work log missing blockNumber".into()))?;
    let event = ChainEvent::Worked {
        job: log.inner.address,
        block_number,
    };
    sequenced(log, event)
}

fn sequenced(log: &Log, event: ChainEvent) -> Result<SequencedEvent, ChainError> {
    let block_number = log
        .block_number
        .ok_or_else(|| ChainError::Decode("log missing blockNumber".into()))?;
    let log_index = log
        .log_index
        .ok_or_else(|| ChainError::Decode("log missing logIndex".into()))?;
    Ok(SequencedEvent {
        block_number,
        log_index,
        event,
    })
}
