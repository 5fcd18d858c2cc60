//! Network collaborators for Safe tooling.
//!
//! This crate provides:
//! - The `RpcTransport` contract (single call, batch, raw transaction broadcast)
//! - `HttpTransport`, JSON-RPC 2.0 over HTTP with demultiplexed batches
//! - `TransactionServiceApi`, a client for the Safe transaction service that
//!   re-verifies every transaction and message hash it is handed
//! - Configuration from the environment and exponential-backoff retry

pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod tx_service;

mod retry;

pub use config::{ConfigError, RetryPolicy, RpcConfig, ServiceConfig};
pub use error::ClientError;
pub use http::HttpTransport;
pub use transport::{RpcCall, RpcTransport};
pub use tx_service::{
    Confirmation, Delegate, MessageBody, SafeMessageRecord, ServiceTransaction, TransactionQuery,
    TransactionRecord, TransactionServiceApi,
};
