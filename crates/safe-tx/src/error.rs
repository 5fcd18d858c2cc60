use thiserror::Error;
use typed_data::TypedDataError;

/// Safe transaction and signature errors.
#[derive(Debug, Error)]
pub enum SafeTxError {
    #[error("invalid safe version: {0}")]
    InvalidVersion(String),

    #[error("chain id is required to hash transactions for safe {0}")]
    MissingChainId(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error(transparent)]
    TypedData(#[from] TypedDataError),
}
