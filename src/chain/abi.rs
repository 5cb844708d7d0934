//! Sequencer and job contract bindings
//!
//! Only the read-only surface the monitor needs is declared here.

use alloy::primitives::{B256, keccak256};
use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface ISequencer {
        event AddJob(address indexed job);
        event RemoveJob(address indexed job);

        function numJobs() external view returns (uint256);
        function jobAt(uint256 index) external view returns (address);
        function numNetworks() external view returns (uint256);
        function networkAt(uint256 index) external view returns (bytes32);
        function windows(bytes32 network) external view returns (uint256 start, uint256 length);
    }

    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IJob {
        function workable(bytes32 network) external returns (bool, bytes memory);
    }
}

/// `Work` event shapes emitted by the known job contracts.
pub const DEFAULT_WORK_EVENT_SIGNATURES: &[&str] = &[
    "Work(bytes32)",
    "Work(bytes32,bytes32)",
    "Work(bytes32,bytes32[],bytes32[],uint256)",
];

/// Topic0 hashes for a list of event signatures.
pub fn event_topics<S: AsRef<str>>(signatures: &[S]) -> Vec<B256> {
    signatures
        .iter()
        .map(|sig| keccak256(sig.as_ref().as_bytes()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolEvent;

    #[test]
    fn add_job_topic_matches_signature() {
        assert_eq!(ISequencer::AddJob::SIGNATURE, "AddJob(address)");
        assert_eq!(
            ISequencer::AddJob::SIGNATURE_HASH,
            keccak256("AddJob(address)".as_bytes())
        );
    }

    #[test]
    fn default_work_topics_are_distinct() {
        let topics = event_topics(DEFAULT_WORK_EVENT_SIGNATURES);
        assert_eq!(topics.len(), 3);
        assert_ne!(topics[0], topics[1]);
        assert_ne!(topics[1], topics[2]);
        assert_eq!(topics[0], keccak256(b"Work(bytes32)"));
    }
}
