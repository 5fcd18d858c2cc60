use alloy_primitives::B256;
use safe_tx::SafeTxError;
use serde_json::Value;
use thiserror::Error;
use typed_data::TypedDataError;

use crate::config::ConfigError;

/// Node and transaction-service client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("json-rpc error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("{endpoint} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        source: Box<ClientError>,
    },

    #[error("service safe tx hash {expected} does not match computed {computed}")]
    SafeTxHashMismatch { expected: B256, computed: B256 },

    #[error("service safe message hash {expected} does not match computed {computed}")]
    SafeMessageHashMismatch { expected: B256, computed: B256 },

    #[error(transparent)]
    TypedData(#[from] TypedDataError),

    #[error(transparent)]
    SafeTx(#[from] SafeTxError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Whether another attempt could succeed: transport failures, HTTP 5xx
    /// and 429. JSON-RPC errors and malformed payloads are final.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http { source, .. } => !source.is_builder() && !source.is_decode(),
            ClientError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub(crate) fn invalid_response(endpoint: &str, reason: impl Into<String>) -> Self {
        ClientError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
