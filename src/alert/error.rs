//! Tipos de erro para a entrega de alertas.
//!
//! Define [`AlertError`] com variantes para rate limiting, erros da API do
//! Discord, canal inexistente e erros de rede. Usa `thiserror` para derivar
//! `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao entregar um alerta.
#[derive(Debug, Error)]
pub enum AlertError {
    /// O servidor retornou HTTP 429 (rate limit).
    /// O campo `retry_after_ms` indica quantos milissegundos esperar antes de retentar.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Erro retornado pela API (ex.: 401 token inválido, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// O canal configurado não existe ou o bot não tem acesso a ele.
    #[error("channel {0} not found")]
    ChannelNotFound(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display() {
        let err = AlertError::RateLimited {
            retry_after_ms: 1500,
        };
        assert_eq!(err.to_string(), "rate limited, retry after 1500ms");
    }

    #[test]
    fn channel_not_found_display() {
        let err = AlertError::ChannelNotFound("1234".into());
        assert_eq!(err.to_string(), "channel 1234 not found");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AlertError>();
    }
}
