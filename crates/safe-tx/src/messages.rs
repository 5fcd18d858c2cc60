//! EIP-712 messages the Safe transaction service asks owners to sign.
//!
//! Delegate management and transaction deletion are authenticated with a
//! signature over a message that carries a TOTP: the number of whole hours
//! since the Unix epoch. The service accepts the current and previous value.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256};
use serde_json::json;
use typed_data::address::checksum_address;
use typed_data::{encode_hash, FieldDecl, TypedData, DOMAIN_TYPE};

use crate::error::SafeTxError;

const SERVICE_NAME: &str = "Safe Transaction Service";
const SERVICE_VERSION: &str = "1.0";
const TOTP_PERIOD_SECS: u64 = 3600;

/// TOTP for a point in time. Times before the epoch map to 0.
pub fn totp_at(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / TOTP_PERIOD_SECS)
        .unwrap_or(0)
}

pub fn totp() -> u64 {
    totp_at(SystemTime::now())
}

/// `Delegate(address delegateAddress,uint256 totp)` signed by a Safe owner
/// to add or remove a delegate.
pub fn delegate_message(delegate: Address, chain_id: u64, totp: u64) -> TypedData {
    TypedData {
        types: [
            (
                DOMAIN_TYPE.to_string(),
                vec![
                    FieldDecl::new("name", "string"),
                    FieldDecl::new("version", "string"),
                    FieldDecl::new("chainId", "uint256"),
                ],
            ),
            (
                "Delegate".to_string(),
                vec![
                    FieldDecl::new("delegateAddress", "address"),
                    FieldDecl::new("totp", "uint256"),
                ],
            ),
        ]
        .into_iter()
        .collect(),
        primary_type: "Delegate".into(),
        domain: json!({
            "name": SERVICE_NAME,
            "version": SERVICE_VERSION,
            "chainId": chain_id,
        }),
        message: json!({
            "delegateAddress": checksum_address(&delegate),
            "totp": totp,
        }),
    }
}

/// `DeleteRequest(bytes32 safeTxHash,uint256 totp)` signed by the proposer
/// to delete a queued transaction.
pub fn remove_transaction_message(
    safe_address: Address,
    safe_tx_hash: &B256,
    chain_id: u64,
    totp: u64,
) -> TypedData {
    TypedData {
        types: [
            (
                DOMAIN_TYPE.to_string(),
                vec![
                    FieldDecl::new("name", "string"),
                    FieldDecl::new("version", "string"),
                    FieldDecl::new("chainId", "uint256"),
                    FieldDecl::new("verifyingContract", "address"),
                ],
            ),
            (
                "DeleteRequest".to_string(),
                vec![
                    FieldDecl::new("safeTxHash", "bytes32"),
                    FieldDecl::new("totp", "uint256"),
                ],
            ),
        ]
        .into_iter()
        .collect(),
        primary_type: "DeleteRequest".into(),
        domain: json!({
            "name": SERVICE_NAME,
            "version": SERVICE_VERSION,
            "chainId": chain_id,
            "verifyingContract": checksum_address(&safe_address),
        }),
        message: json!({
            "safeTxHash": format!("0x{}", hex::encode(safe_tx_hash)),
            "totp": totp,
        }),
    }
}

/// Off-chain `SafeMessage(bytes message)` for Safes from 1.3.0.
pub fn safe_message(safe_address: Address, chain_id: u64, message: &[u8]) -> TypedData {
    TypedData {
        types: [
            (
                DOMAIN_TYPE.to_string(),
                vec![
                    FieldDecl::new("chainId", "uint256"),
                    FieldDecl::new("verifyingContract", "address"),
                ],
            ),
            (
                "SafeMessage".to_string(),
                vec![FieldDecl::new("message", "bytes")],
            ),
        ]
        .into_iter()
        .collect(),
        primary_type: "SafeMessage".into(),
        domain: json!({
            "chainId": chain_id,
            "verifyingContract": checksum_address(&safe_address),
        }),
        message: json!({
            "message": format!("0x{}", hex::encode(message)),
        }),
    }
}

pub fn safe_message_hash(
    safe_address: Address,
    chain_id: u64,
    message: &[u8],
) -> Result<B256, SafeTxError> {
    Ok(encode_hash(&safe_message(safe_address, chain_id, message))?)
}
