//! Proxy error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Reading candidates failed.
    #[error("{0}")]
    Read(String),

    /// The vote request was malformed or the transaction failed.
    #[error("{0}")]
    Vote(String),

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("failed to encode metrics: {0}")]
    Metrics(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ProxyError::Vote(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            ProxyError::MetricsDisabled => (StatusCode::NOT_FOUND, message).into_response(),
            ProxyError::Read(_)
            | ProxyError::Metrics(_)
            | ProxyError::Bind { .. }
            | ProxyError::Server(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
