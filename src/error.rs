use thiserror::Error;

use crate::alert::AlertError;
use crate::chain::ChainError;

#[derive(Debug, Error)]
pub enum JobwatchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_component_errors() {
        let err: JobwatchError = ChainError::Rpc("timeout".into()).into();
        assert_eq!(err.to_string(), "Chain error: RPC error: timeout");

        let err: JobwatchError = AlertError::ChannelNotFound("7".into()).into();
        assert_eq!(err.to_string(), "Alert error: channel 7 not found");
    }
}
