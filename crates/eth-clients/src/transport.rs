use std::future::Future;

use alloy_primitives::B256;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ClientError;

/// One JSON-RPC method invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcCall {
    pub method: String,
    pub params: Value,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// Request/response access to an Ethereum node.
///
/// `batch_call` returns one result per call, in submission order. A failed
/// sub-call is reported at its index; the outer `Err` is reserved for
/// failures of the exchange as a whole.
pub trait RpcTransport: Send + Sync {
    fn call(&self, call: RpcCall) -> impl Future<Output = Result<Value, ClientError>> + Send;

    fn batch_call(
        &self,
        calls: Vec<RpcCall>,
    ) -> impl Future<Output = Result<Vec<Result<Value, ClientError>>, ClientError>> + Send;

    /// Broadcasts a signed transaction, returning its hash.
    fn send_raw_transaction(
        &self,
        raw_tx: &[u8],
    ) -> impl Future<Output = Result<B256, ClientError>> + Send {
        let call = RpcCall::new(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw_tx))]),
        );
        async move {
            let result = self.call(call).await?;
            parse_hash(&result)
        }
    }
}

fn parse_hash(value: &Value) -> Result<B256, ClientError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ClientError::invalid_response("eth_sendRawTransaction", "expected a hash string"))?;
    let hex_part = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(hex_part)
        .map_err(|e| ClientError::invalid_response("eth_sendRawTransaction", e.to_string()))?;
    if bytes.len() != 32 {
        return Err(ClientError::invalid_response(
            "eth_sendRawTransaction",
            format!("expected 32 bytes, got {}", bytes.len()),
        ));
    }
    Ok(B256::from_slice(&bytes))
}
