pub mod abi;
pub mod client;
pub mod error;
pub mod types;

pub use client::{ChainReader, RpcChainReader};
pub use error::ChainError;
pub use types::{ChainEvent, JobAddress, NetworkId, SequencedEvent, Window, network_label};
