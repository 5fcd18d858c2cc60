//! JSON-RPC 2.0 over HTTP.
//!
//! Wraps one `reqwest::Client` (connection pool, per-request timeout) and
//! one node URL. Request ids come from a counter shared by all calls, so a
//! single transport can be used from many tasks at once.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use url::Url;

use crate::config::{RetryPolicy, RpcConfig};
use crate::error::ClientError;
use crate::retry::retry;
use crate::transport::{RpcCall, RpcTransport};

#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    retry: RetryPolicy,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(config: RpcConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: config.url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            url: config.url,
            retry: config.retry,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn request_body(&self, call: &RpcCall) -> (u64, Value) {
        let id = self.next_id();
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": call.method,
            "params": call.params,
        });
        (id, body)
    }

    /// POSTs a JSON body and returns the decoded JSON reply, retrying
    /// transient failures.
    async fn post(&self, body: &Value) -> Result<Value, ClientError> {
        let endpoint = self.url.as_str();
        retry(&self.retry, endpoint, || async {
            let resp = self
                .client
                .post(self.url.clone())
                .json(body)
                .send()
                .await
                .map_err(|e| ClientError::Http {
                    endpoint: endpoint.to_string(),
                    source: e,
                })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ClientError::Status {
                    endpoint: endpoint.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            resp.json::<Value>()
                .await
                .map_err(|e| ClientError::invalid_response(endpoint, e.to_string()))
        })
        .await
    }
}

impl RpcTransport for HttpTransport {
    fn call(&self, call: RpcCall) -> impl Future<Output = Result<Value, ClientError>> + Send {
        async move {
            let (id, body) = self.request_body(&call);
            tracing::debug!(method = %call.method, id, "sending json-rpc request");

            let reply = self.post(&body).await?;
            let endpoint = self.url.as_str();
            match reply_id(&reply) {
                Some(got) if got == id => {}
                // Some nodes answer parse-level errors with a null id.
                None if reply.get("error").is_some() => {}
                other => {
                    return Err(ClientError::invalid_response(
                        endpoint,
                        format!("expected reply id {id}, got {other:?}"),
                    ))
                }
            }
            into_result(endpoint, reply)
        }
    }

    fn batch_call(
        &self,
        calls: Vec<RpcCall>,
    ) -> impl Future<Output = Result<Vec<Result<Value, ClientError>>, ClientError>> + Send {
        async move {
            if calls.is_empty() {
                return Ok(Vec::new());
            }

            let mut positions = HashMap::with_capacity(calls.len());
            let mut bodies = Vec::with_capacity(calls.len());
            for (index, call) in calls.iter().enumerate() {
                let (id, body) = self.request_body(call);
                positions.insert(id, index);
                bodies.push(body);
            }
            tracing::debug!(size = calls.len(), "sending json-rpc batch");

            let reply = self.post(&Value::Array(bodies)).await?;
            demultiplex(self.url.as_str(), reply, &positions)
        }
    }
}

/// Puts batch replies back into submission order.
///
/// Per-entry JSON-RPC errors stay at their index. A reply that is not an
/// array, or whose ids do not match the request one-to-one, fails the
/// whole batch.
fn demultiplex(
    endpoint: &str,
    reply: Value,
    positions: &HashMap<u64, usize>,
) -> Result<Vec<Result<Value, ClientError>>, ClientError> {
    let entries = match reply {
        Value::Array(entries) => entries,
        // Nodes without batch support answer with a single error object.
        other if other.get("error").is_some() => return Err(remote_error(endpoint, &other)),
        other => {
            return Err(ClientError::invalid_response(
                endpoint,
                format!("batch reply is not an array: {other}"),
            ))
        }
    };

    let mut slots: Vec<Option<Result<Value, ClientError>>> =
        std::iter::repeat_with(|| None).take(positions.len()).collect();

    for entry in entries {
        let id = reply_id(&entry)
            .ok_or_else(|| ClientError::invalid_response(endpoint, "batch entry without id"))?;
        let index = *positions
            .get(&id)
            .ok_or_else(|| ClientError::invalid_response(endpoint, format!("unknown id {id}")))?;
        if slots[index].is_some() {
            return Err(ClientError::invalid_response(
                endpoint,
                format!("duplicate id {id}"),
            ));
        }
        slots[index] = Some(into_result(endpoint, entry));
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                ClientError::invalid_response(endpoint, format!("no reply for call {index}"))
            })
        })
        .collect()
}

fn reply_id(reply: &Value) -> Option<u64> {
    match reply.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn into_result(endpoint: &str, mut reply: Value) -> Result<Value, ClientError> {
    if reply.get("error").is_some_and(|e| !e.is_null()) {
        return Err(remote_error(endpoint, &reply));
    }
    match reply.as_object_mut().and_then(|o| o.remove("result")) {
        Some(result) => Ok(result),
        None => Err(ClientError::invalid_response(
            endpoint,
            "reply has neither result nor error",
        )),
    }
}

fn remote_error(endpoint: &str, reply: &Value) -> ClientError {
    let error = &reply["error"];
    match (error.get("code").and_then(Value::as_i64), error.get("message")) {
        (Some(code), Some(message)) => ClientError::Remote {
            code,
            message: message.as_str().unwrap_or_default().to_string(),
            data: error.get("data").cloned(),
        },
        _ => ClientError::invalid_response(endpoint, format!("malformed error object: {error}")),
    }
}
