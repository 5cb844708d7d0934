//! Tipos de erro para o leitor de chain.
//!
//! Define [`ChainError`] com variantes para falhas de RPC, chamadas de
//! contrato e decodificação de logs. Todas são tratadas como transitórias
//! pelo monitor: o ciclo registra o erro e segue para o próximo job.

use thiserror::Error;

/// Erros que podem ocorrer ao ler o estado da chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Falha no transporte JSON-RPC (conexão recusada, timeout, resposta inválida).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Uma chamada `eth_call` a um contrato falhou ou reverteu.
    #[error("contract call {method} failed: {message}")]
    Contract { method: &'static str, message: String },

    /// Um log retornado pelo nó não pôde ser decodificado.
    #[error("failed to decode log: {0}")]
    Decode(String),
}

impl ChainError {
    pub(crate) fn contract(method: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Contract {
            method,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_error_display() {
        let err = ChainError::contract("numJobs", "execution reverted");
        assert_eq!(
            err.to_string(),
            "contract call numJobs failed: execution reverted"
        );
    }

    #[test]
    fn rpc_error_display() {
        let err = ChainError::Rpc("connection refused".into());
        assert_eq!(err.to_string(), "RPC error: connection refused");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChainError>();
    }
}
