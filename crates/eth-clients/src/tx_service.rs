//! Client for the Safe transaction service REST API.
//!
//! The service queues multisig transactions and collects owner
//! confirmations off-chain. Every transaction fetched from it is rebuilt
//! locally and its hash recomputed, so a compromised or buggy service cannot
//! get owners to sign something other than what it reports.

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use reqwest::Method;
use safe_tx::messages::{delegate_message, safe_message_hash, totp};
use safe_tx::signing::personal_message_hash;
use safe_tx::{SafeTx, SafeVersion};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use typed_data::address::checksum_address;
use typed_data::{encode_hash, TypedData};
use url::{form_urlencoded, Url};

use crate::config::{RetryPolicy, ServiceConfig};
use crate::error::ClientError;
use crate::retry::retry;

/// Sender reported for proposals that carry no owner signature yet.
const ANONYMOUS_SENDER: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2,
]);

/// A delegate allowed to propose transactions on behalf of an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub safe: Option<Address>,
    pub delegate: Address,
    pub delegator: Address,
    #[serde(default)]
    pub label: String,
}

/// An owner confirmation attached to a queued transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    pub signature: Option<String>,
    pub signature_type: String,
}

/// A multisig transaction as the service stores it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub safe: Address,
    pub to: Address,
    #[serde(deserialize_with = "decimal")]
    pub value: U256,
    pub data: Option<String>,
    pub operation: u8,
    pub gas_token: Option<Address>,
    #[serde(deserialize_with = "decimal")]
    pub safe_tx_gas: U256,
    #[serde(deserialize_with = "decimal")]
    pub base_gas: U256,
    #[serde(deserialize_with = "decimal")]
    pub gas_price: U256,
    pub refund_receiver: Option<Address>,
    #[serde(deserialize_with = "decimal")]
    pub nonce: U256,
    pub safe_tx_hash: B256,
    pub proposer: Option<Address>,
    pub transaction_hash: Option<B256>,
    pub signatures: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmations: Vec<Confirmation>,
    pub origin: Option<String>,
}

/// Filters for listing a Safe's multisig transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Only transactions with this hash. Every returned record is rebuilt
    /// and checked against it.
    pub safe_tx_hash: Option<B256>,
    pub nonce: Option<U256>,
    pub executed: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl TransactionQuery {
    pub fn by_hash(safe_tx_hash: B256) -> Self {
        Self {
            safe_tx_hash: Some(safe_tx_hash),
            ..Self::default()
        }
    }

    fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(hash) = &self.safe_tx_hash {
            query.append_pair("safe_tx_hash", &prefixed_hex(hash.as_slice()));
        }
        if let Some(nonce) = &self.nonce {
            query.append_pair("nonce", &nonce.to_string());
        }
        if let Some(executed) = self.executed {
            query.append_pair("executed", if executed { "true" } else { "false" });
        }
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(offset) = self.offset {
            query.append_pair("offset", &offset.to_string());
        }
        query.finish()
    }
}

/// Content of an off-chain Safe message: plain text, hashed with EIP-191,
/// or EIP-712 typed data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    TypedData(TypedData),
}

impl MessageBody {
    /// The 32-byte hash wrapped by the `SafeMessage` struct.
    pub fn hash(&self) -> Result<B256, ClientError> {
        match self {
            MessageBody::Text(text) => Ok(personal_message_hash(text.as_bytes())),
            MessageBody::TypedData(data) => Ok(encode_hash(data)?),
        }
    }
}

impl<'de> Deserialize<'de> for MessageBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(MessageBody::Text(text)),
            value => TypedData::from_value(value)
                .map(MessageBody::TypedData)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// An off-chain Safe message as the service stores it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMessageRecord {
    pub safe: Address,
    pub message_hash: B256,
    pub message: MessageBody,
    pub proposed_by: Option<Address>,
    pub safe_app_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmations: Vec<Confirmation>,
    pub prepared_signature: Option<String>,
}

/// A verified transaction fetched from the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTransaction {
    pub safe_tx: SafeTx,
    pub proposer: Option<Address>,
    /// Set once the transaction was executed on-chain.
    pub tx_hash: Option<B256>,
}

#[derive(Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct OwnerSafes {
    #[serde(default)]
    safes: Vec<Address>,
}

pub struct TransactionServiceApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    chain_id: u64,
    retry: RetryPolicy,
}

impl std::fmt::Debug for TransactionServiceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionServiceApi")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("chain_id", &self.chain_id)
            .field("retry", &self.retry)
            .finish()
    }
}

impl TransactionServiceApi {
    pub fn new(config: ServiceConfig, chain_id: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: config.base_url.to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
            chain_id,
            retry: config.retry,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Hash a delegator signs to add or remove `delegate`, valid for the
    /// current hour.
    pub fn delegate_message_hash(&self, delegate: Address) -> Result<B256, ClientError> {
        self.delegate_message_hash_at(delegate, totp())
    }

    pub fn delegate_message_hash_at(&self, delegate: Address, totp: u64) -> Result<B256, ClientError> {
        Ok(encode_hash(&delegate_message(delegate, self.chain_id, totp))?)
    }

    pub async fn get_delegates(&self, safe_address: Address) -> Result<Vec<Delegate>, ClientError> {
        let path = format!("/api/v2/delegates/?safe={}", checksum_address(&safe_address));
        let page: Page<Delegate> = self.get_json(&path).await?;
        Ok(page.results)
    }

    /// Safes in which `owner` is one of the owners.
    pub async fn get_safes_for_owner(&self, owner: Address) -> Result<Vec<Address>, ClientError> {
        let path = format!("/api/v1/owners/{}/safes/", checksum_address(&owner));
        let owned: OwnerSafes = self.get_json(&path).await?;
        Ok(owned.safes)
    }

    pub async fn add_delegate(
        &self,
        delegate: Address,
        delegator: Address,
        label: &str,
        signature: &[u8],
        safe_address: Option<Address>,
    ) -> Result<(), ClientError> {
        let mut payload = json!({
            "delegate": checksum_address(&delegate),
            "delegator": checksum_address(&delegator),
            "signature": prefixed_hex(signature),
            "label": label,
        });
        if let Some(safe) = safe_address {
            payload["safe"] = json!(checksum_address(&safe));
        }
        self.send(Method::POST, "/api/v2/delegates/", Some(&payload))
            .await
            .map(drop)
    }

    /// Removes a delegate, for one Safe or globally when `safe_address` is
    /// `None`.
    pub async fn remove_delegate(
        &self,
        delegate: Address,
        delegator: Address,
        signature: &[u8],
        safe_address: Option<Address>,
    ) -> Result<(), ClientError> {
        let mut payload = json!({
            "delegator": checksum_address(&delegator),
            "signature": prefixed_hex(signature),
        });
        if let Some(safe) = safe_address {
            payload["safe"] = json!(checksum_address(&safe));
        }
        let path = format!("/api/v2/delegates/{}/", checksum_address(&delegate));
        self.send(Method::DELETE, &path, Some(&payload))
            .await
            .map(drop)
    }

    /// Fetches a queued or executed transaction and checks that it hashes to
    /// `safe_tx_hash` under the given Safe version.
    pub async fn get_safe_transaction(
        &self,
        safe_tx_hash: &B256,
        version: SafeVersion,
    ) -> Result<ServiceTransaction, ClientError> {
        let path = format!("/api/v1/multisig-transactions/{}/", prefixed_hex(safe_tx_hash.as_slice()));
        let record: TransactionRecord = self.get_json(&path).await?;
        self.verify_record(record, safe_tx_hash, version)
    }

    /// Lists a Safe's multisig transactions. When the query filters by
    /// hash, each returned record must rebuild to that hash.
    pub async fn get_transactions(
        &self,
        safe_address: Address,
        query: &TransactionQuery,
        version: SafeVersion,
    ) -> Result<Vec<TransactionRecord>, ClientError> {
        let mut path = format!(
            "/api/v1/safes/{}/multisig-transactions/",
            checksum_address(&safe_address)
        );
        let query_string = query.query_string();
        if !query_string.is_empty() {
            path.push('?');
            path.push_str(&query_string);
        }

        let page: Page<TransactionRecord> = self.get_json(&path).await?;
        if let Some(safe_tx_hash) = &query.safe_tx_hash {
            for record in &page.results {
                self.verify_record(record.clone(), safe_tx_hash, version)?;
            }
        }
        Ok(page.results)
    }

    fn verify_record(
        &self,
        record: TransactionRecord,
        safe_tx_hash: &B256,
        version: SafeVersion,
    ) -> Result<ServiceTransaction, ClientError> {
        let endpoint = self.base_url.as_str();
        let data = match record.data.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => decode_hex(endpoint, raw)?,
        };

        let safe_tx = SafeTx::new(record.safe, version)
            .with_call(record.to, record.value, data, record.operation)
            .with_gas(record.safe_tx_gas, record.base_gas, record.gas_price)
            .with_refund(
                record.gas_token.unwrap_or(Address::ZERO),
                record.refund_receiver.unwrap_or(Address::ZERO),
            )
            .with_nonce(record.nonce)
            .with_chain_id(self.chain_id)
            .with_signatures(collect_signatures(endpoint, &record)?);

        let computed = safe_tx.safe_tx_hash()?;
        if computed != *safe_tx_hash {
            return Err(ClientError::SafeTxHashMismatch {
                expected: *safe_tx_hash,
                computed,
            });
        }

        Ok(ServiceTransaction {
            safe_tx,
            proposer: record.proposer,
            tx_hash: record.transaction_hash,
        })
    }

    /// Adds owner confirmations to a queued transaction.
    pub async fn post_signatures(&self, safe_tx_hash: &B256, signatures: &[u8]) -> Result<(), ClientError> {
        let path = format!(
            "/api/v1/multisig-transactions/{}/confirmations/",
            prefixed_hex(safe_tx_hash.as_slice())
        );
        let payload = json!({ "signature": prefixed_hex(signatures) });
        self.send(Method::POST, &path, Some(&payload))
            .await
            .map(drop)
    }

    /// Proposes a transaction. The lowest signer is reported as the sender;
    /// `origin` tags the proposing application.
    pub async fn post_transaction(&self, safe_tx: &SafeTx, origin: Option<&str>) -> Result<(), ClientError> {
        let safe_tx_hash = safe_tx.safe_tx_hash()?;
        let sender = safe_tx
            .sorted_signers()?
            .first()
            .copied()
            .unwrap_or(ANONYMOUS_SENDER);

        let payload = json!({
            "to": checksum_address(&safe_tx.to),
            "value": safe_tx.value.to_string(),
            "data": (!safe_tx.data.is_empty()).then(|| prefixed_hex(&safe_tx.data)),
            "operation": safe_tx.operation,
            "gasToken": checksum_address(&safe_tx.gas_token),
            "safeTxGas": safe_tx.safe_tx_gas.to_string(),
            "baseGas": safe_tx.base_gas.to_string(),
            "gasPrice": safe_tx.gas_price.to_string(),
            "refundReceiver": checksum_address(&safe_tx.refund_receiver),
            "nonce": safe_tx.nonce.to_string(),
            "contractTransactionHash": prefixed_hex(safe_tx_hash.as_slice()),
            "sender": checksum_address(&sender),
            "signature": (!safe_tx.signatures.is_empty()).then(|| prefixed_hex(&safe_tx.signatures)),
            "origin": origin,
        });

        let path = format!(
            "/api/v1/safes/{}/multisig-transactions/",
            checksum_address(&safe_tx.safe_address)
        );
        self.send(Method::POST, &path, Some(&payload))
            .await
            .map(drop)
    }

    /// Deletes a queued transaction. `signature` is the proposer's signature
    /// over the `DeleteRequest` message.
    pub async fn delete_transaction(&self, safe_tx_hash: &B256, signature: &[u8]) -> Result<(), ClientError> {
        let hash = prefixed_hex(safe_tx_hash.as_slice());
        let payload = json!({
            "safeTxHash": hash,
            "signature": prefixed_hex(signature),
        });
        let path = format!("/api/v1/multisig-transactions/{hash}/");
        self.send(Method::DELETE, &path, Some(&payload))
            .await
            .map(drop)
    }

    /// Hash owners sign to confirm `message` for `safe_address` on this
    /// chain. The service identifies the message by the same hash.
    pub fn safe_message_hash(&self, safe_address: Address, message: &MessageBody) -> Result<B256, ClientError> {
        Ok(safe_message_hash(safe_address, self.chain_id, message.hash()?.as_slice())?)
    }

    /// Creates an off-chain message for a Safe with the proposer's signature.
    pub async fn post_message(
        &self,
        safe_address: Address,
        message: &MessageBody,
        signature: &[u8],
        safe_app_id: Option<u64>,
    ) -> Result<(), ClientError> {
        let payload = json!({
            "message": message,
            "safeAppId": safe_app_id,
            "signature": prefixed_hex(signature),
        });
        let path = format!("/api/v1/safes/{}/messages/", checksum_address(&safe_address));
        self.send(Method::POST, &path, Some(&payload))
            .await
            .map(drop)
    }

    /// Fetches a message and checks that its content hashes to
    /// `message_hash`.
    pub async fn get_message(&self, message_hash: &B256) -> Result<SafeMessageRecord, ClientError> {
        let path = format!("/api/v1/messages/{}/", prefixed_hex(message_hash.as_slice()));
        let record: SafeMessageRecord = self.get_json(&path).await?;
        self.verify_message(&record, message_hash)?;
        Ok(record)
    }

    /// Messages of a Safe, each checked against its reported hash.
    pub async fn get_messages(&self, safe_address: Address) -> Result<Vec<SafeMessageRecord>, ClientError> {
        let path = format!("/api/v1/safes/{}/messages/", checksum_address(&safe_address));
        let page: Page<SafeMessageRecord> = self.get_json(&path).await?;
        for record in &page.results {
            self.verify_message(record, &record.message_hash)?;
        }
        Ok(page.results)
    }

    /// Adds an owner confirmation to a message.
    pub async fn post_message_signature(&self, message_hash: &B256, signature: &[u8]) -> Result<(), ClientError> {
        let path = format!("/api/v1/messages/{}/signatures/", prefixed_hex(message_hash.as_slice()));
        let payload = json!({ "signature": prefixed_hex(signature) });
        self.send(Method::POST, &path, Some(&payload))
            .await
            .map(drop)
    }

    fn verify_message(&self, record: &SafeMessageRecord, message_hash: &B256) -> Result<(), ClientError> {
        let computed = self.safe_message_hash(record.safe, &record.message)?;
        if computed != *message_hash {
            return Err(ClientError::SafeMessageHashMismatch {
                expected: *message_hash,
                computed,
            });
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.send(Method::GET, path, None).await?;
        let endpoint = resp.url().to_string();
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::invalid_response(&endpoint, e.to_string()))
    }

    /// Sends one request, retrying transient failures. Non-2xx replies
    /// become [`ClientError::Status`].
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let endpoint = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        tracing::debug!(%method, %endpoint, "sending transaction service request");

        retry(&self.retry, &endpoint, || async {
            let mut request = self.client.request(method.clone(), &endpoint);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let resp = request.send().await.map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ClientError::Status {
                    endpoint: endpoint.clone(),
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(resp)
        })
        .await
    }
}

/// Signatures for an executed transaction come from the record itself; for
/// a queued one they are assembled from EOA confirmations sorted by owner.
fn collect_signatures(endpoint: &str, record: &TransactionRecord) -> Result<Vec<u8>, ClientError> {
    if let Some(raw) = record.signatures.as_deref().filter(|s| !s.is_empty()) {
        return decode_hex(endpoint, raw);
    }

    let mut confirmations: Vec<&Confirmation> = record
        .confirmations
        .iter()
        .filter(|c| c.signature_type == "EOA")
        .collect();
    confirmations.sort_by_key(|c| c.owner);

    let mut signatures = Vec::with_capacity(confirmations.len() * 65);
    for confirmation in confirmations {
        if let Some(raw) = &confirmation.signature {
            signatures.extend(decode_hex(endpoint, raw)?);
        }
    }
    Ok(signatures)
}

fn decode_hex(endpoint: &str, raw: &str) -> Result<Vec<u8>, ClientError> {
    hex::decode(raw.strip_prefix("0x").unwrap_or(raw))
        .map_err(|e| ClientError::invalid_response(endpoint, format!("bad hex {raw:?}: {e}")))
}

fn prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// The service reports amounts as JSON numbers or decimal strings.
fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a decimal amount, got {other}"
            )))
        }
    };
    U256::from_str_radix(&raw, 10).map_err(serde::de::Error::custom)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn api() -> TransactionServiceApi {
        let config = ServiceConfig::new("http://127.0.0.1:1").unwrap();
        TransactionServiceApi::new(config, 1).unwrap()
    }

    fn record(nonce: u64) -> TransactionRecord {
        serde_json::from_value(record_json(nonce)).unwrap()
    }

    fn record_json(nonce: u64) -> Value {
        json!({
            "safe": "0x2B0b9cBDA3D7b0F760187c52A8FFB18C48E5d96A",
            "to": "0x79613FD49472C3C7a32188e45ff00e7bdC8a897d",
            "value": "2",
            "data": "0x1212",
            "operation": 0,
            "gasToken": "0xFA995c7a0d32A4e7497508a5C380369BE8dB49Db",
            "safeTxGas": 0,
            "baseGas": 0,
            "gasPrice": "0",
            "refundReceiver": "0x6b92f5E5360bfCa8F5d3FcE65D87382967847983",
            "nonce": nonce,
            "safeTxHash": "0x01d42a801ac44d3ebd43592be980dea0756d7f7b27d718d3016a42ea7ce85587",
            "proposer": null,
            "transactionHash": null,
            "signatures": null,
            "confirmations": []
        })
    }

    #[test]
    fn anonymous_sender_is_address_two() {
        assert_eq!(
            ANONYMOUS_SENDER,
            address!("0000000000000000000000000000000000000002")
        );
    }

    #[test]
    fn delegate_hash_matches_known_vector() {
        let hash = api()
            .delegate_message_hash_at(address!("5AC255889882aaB35A2aa939679E3F3d4Cea221E"), 480_000)
            .unwrap();
        assert_eq!(
            format!("0x{}", hex::encode(hash)),
            "0x8b48de99cf4bdd0b31180988f0cca5a08a2cc8ca34a90a2aea119f9de34c3f18"
        );
    }

    #[test]
    fn record_accepts_numbers_and_strings() {
        let r = record(17);
        assert_eq!(r.nonce, U256::from(17u64));
        assert_eq!(r.value, U256::from(2u64));
        assert!(r.confirmations.is_empty());
    }

    #[test]
    fn verify_record_rebuilds_matching_hash() {
        let config = ServiceConfig::new("http://127.0.0.1:1").unwrap();
        let api = TransactionServiceApi::new(config, 4).unwrap();
        let r = record(17);
        let hash = r.safe_tx_hash;

        let tx = api.verify_record(r, &hash, SafeVersion::V1_3_0).unwrap();
        assert_eq!(tx.safe_tx.nonce, U256::from(17u64));
        assert_eq!(tx.safe_tx.data, vec![0x12, 0x12]);
    }

    #[test]
    fn verify_record_detects_tampering() {
        let config = ServiceConfig::new("http://127.0.0.1:1").unwrap();
        let api = TransactionServiceApi::new(config, 4).unwrap();
        let r = record(18);
        let hash = r.safe_tx_hash;

        let err = api.verify_record(r, &hash, SafeVersion::V1_3_0).unwrap_err();
        assert!(matches!(err, ClientError::SafeTxHashMismatch { expected, .. } if expected == hash));
    }

    #[test]
    fn confirmations_are_sorted_and_filtered() {
        let mut r = record(17);
        let high = address!("ffffffffffffffffffffffffffffffffffffffff");
        let low = address!("0000000000000000000000000000000000000001");
        r.confirmations = vec![
            Confirmation {
                owner: high,
                signature: Some(format!("0x{}", "bb".repeat(65))),
                signature_type: "EOA".into(),
            },
            Confirmation {
                owner: low,
                signature: Some(format!("0x{}", "aa".repeat(65))),
                signature_type: "EOA".into(),
            },
            Confirmation {
                owner: low,
                signature: Some("0x01".into()),
                signature_type: "CONTRACT_SIGNATURE".into(),
            },
        ];

        let signatures = collect_signatures("service", &r).unwrap();
        assert_eq!(signatures.len(), 130);
        assert_eq!(signatures[0], 0xaa);
        assert_eq!(signatures[65], 0xbb);
    }

    #[test]
    fn wei_amount_as_bare_number_is_exact() {
        let raw: Value = serde_json::from_str(r#"{"value": 100000000000000000000}"#).unwrap();
        assert_eq!(
            decimal(raw["value"].clone()).unwrap(),
            U256::from(100_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn non_decimal_amounts_are_rejected() {
        assert!(decimal(json!(1.5)).is_err());
        assert!(decimal(json!(-1)).is_err());
        assert!(decimal(json!(true)).is_err());
        assert!(decimal(json!("0x10")).is_err());
    }

    #[test]
    fn null_confirmations_are_empty() {
        let mut raw = record_json(17);
        raw["confirmations"] = Value::Null;
        let r: TransactionRecord = serde_json::from_value(raw).unwrap();
        assert!(r.confirmations.is_empty());
    }

    #[test]
    fn query_string_encodes_set_filters_only() {
        assert_eq!(TransactionQuery::default().query_string(), "");

        let query = TransactionQuery {
            safe_tx_hash: Some(B256::repeat_byte(0x01)),
            executed: Some(true),
            offset: Some(20),
            ..TransactionQuery::default()
        };
        assert_eq!(
            query.query_string(),
            format!("safe_tx_hash=0x{}&executed=true&offset=20", "01".repeat(32))
        );
    }

    #[test]
    fn message_body_text_or_typed_data() {
        let text: MessageBody = serde_json::from_value(json!("gm")).unwrap();
        assert_eq!(text, MessageBody::Text("gm".into()));

        let typed: MessageBody = serde_json::from_value(json!({
            "types": {"EIP712Domain": []},
            "primaryType": "EIP712Domain",
            "domain": {},
            "message": {}
        }))
        .unwrap();
        assert!(matches!(typed, MessageBody::TypedData(_)));

        assert!(serde_json::from_value::<MessageBody>(json!(42)).is_err());
    }

    #[test]
    fn text_message_hash_is_personal_sign_hash() {
        let hash = MessageBody::Text("Hello World".into()).hash().unwrap();
        assert_eq!(
            hex::encode(hash),
            "a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2"
        );
    }

    #[test]
    fn executed_signatures_take_precedence() {
        let mut r = record(17);
        r.signatures = Some("0xabcd".into());
        assert_eq!(collect_signatures("service", &r).unwrap(), vec![0xab, 0xcd]);
    }
}
