//! Tipos de erro para os clientes HTTP (catálogo, tarefas e Tower).
//!
//! Define [`ApiError`] com variantes para timeouts, falhas de conexão,
//! respostas de erro e recursos não encontrados. Cada variante é
//! classificada em uma [`ErrorCategory`] para as métricas.

use thiserror::Error;

use crate::metrics::ErrorCategory;

/// Erros que podem ocorrer ao falar com um sistema remoto.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A requisição excedeu o timeout configurado no cliente.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Não foi possível abrir a conexão (DNS, conexão recusada).
    #[error("remote system unreachable: {0}")]
    Unreachable(String),

    /// O servidor respondeu com um status de erro (4xx/5xx).
    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// O recurso pedido não existe (HTTP 404).
    #[error("{resource}(id: {id}) not found")]
    NotFound { resource: &'static str, id: String },

    /// O tipo de job da oferta não corresponde a nenhum endpoint de lançamento.
    #[error("unsupported job type: {0}")]
    UnsupportedJobType(String),

    /// Nenhum endpoint configurado para a fonte.
    #[error("no endpoint configured for Source(id: {0})")]
    UnknownSource(String),

    /// URL base configurada inválida.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// Identificador que não pode compor um caminho de URL.
    #[error("invalid resource id: {0:?}")]
    InvalidId(String),

    /// Corpo da resposta não pôde ser interpretado.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Qualquer outra falha da camada HTTP.
    #[error("network error: {0}")]
    Network(reqwest::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            ApiError::Timeout { url }
        } else if err.is_connect() {
            ApiError::Unreachable(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}

impl ApiError {
    /// Categoria de métrica usada para contabilizar este erro.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Timeout { .. } => ErrorCategory::RemoteSystemTimeout,
            ApiError::Unreachable(_) => ErrorCategory::RemoteSystemUnreachable,
            ApiError::Status { .. } | ApiError::NotFound { .. } => {
                ErrorCategory::RemoteSystemErrorResponse
            }
            ApiError::UnsupportedJobType(_)
            | ApiError::UnknownSource(_)
            | ApiError::InvalidUrl(_)
            | ApiError::InvalidId(_) => ErrorCategory::General,
            ApiError::Decode(_) | ApiError::Network(_) => ErrorCategory::RemoteSystem,
        }
    }

    /// `true` quando o sistema remoto informou que o recurso não existe.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = ApiError::Status {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error (status 500): Internal Server Error");
    }

    #[test]
    fn not_found_display() {
        let err = ApiError::NotFound {
            resource: "ServiceOffering",
            id: "O1".into(),
        };
        assert_eq!(err.to_string(), "ServiceOffering(id: O1) not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn categories() {
        assert_eq!(
            ApiError::Timeout { url: String::new() }.category(),
            ErrorCategory::RemoteSystemTimeout
        );
        assert_eq!(
            ApiError::Unreachable("refused".into()).category(),
            ErrorCategory::RemoteSystemUnreachable
        );
        assert_eq!(
            ApiError::Status {
                status: 502,
                message: String::new()
            }
            .category(),
            ErrorCategory::RemoteSystemErrorResponse
        );
        assert_eq!(
            ApiError::Decode("eof".into()).category(),
            ErrorCategory::RemoteSystem
        );
        assert_eq!(
            ApiError::UnknownSource("9".into()).category(),
            ErrorCategory::General
        );
        assert_eq!(
            ApiError::InvalidId("..".into()).category(),
            ErrorCategory::General
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiError>();
    }
}
