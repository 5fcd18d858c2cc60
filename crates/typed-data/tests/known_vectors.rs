//! End-to-end digests through the public API, pinned against values
//! produced by an independent EIP-712 implementation.

use proptest::prelude::*;
use serde_json::{json, Value};
use typed_data::{encode_hash, encode_hash_json, TypedData, TypedDataEncoder, TypedDataError};

const OWNER: &str = "0x8e12f01DAE5FE7f1122Dc42f2cB084F2f9E8aA03";

fn mailbox_payload() -> Value {
    json!({
        "types": {
            "EIP712Domain": [
                {"name": "name", "type": "string"},
                {"name": "version", "type": "string"},
                {"name": "chainId", "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Mailbox": [
                {"name": "owner", "type": "address"},
                {"name": "messages", "type": "Message[]"}
            ],
            "Message": [
                {"name": "sender", "type": "address"},
                {"name": "subject", "type": "string"},
                {"name": "isSpam", "type": "bool"},
                {"name": "body", "type": "string"}
            ]
        },
        "primaryType": "Mailbox",
        "domain": {
            "name": "MyDApp",
            "version": "3.0",
            "chainId": 41,
            "verifyingContract": OWNER
        },
        "message": {
            "owner": OWNER,
            "messages": [
                {
                    "sender": OWNER,
                    "subject": "Hello World",
                    "body": "The sparrow flies at midnight.",
                    "isSpam": false
                },
                {
                    "sender": OWNER,
                    "subject": "You may have already Won! :dumb-emoji:",
                    "body": "Click here for sweepstakes!",
                    "isSpam": true
                }
            ]
        }
    })
}

#[test]
fn mailbox_digest_is_pinned() {
    let data = TypedData::from_value(mailbox_payload()).unwrap();
    let digest = encode_hash(&data).unwrap();
    assert_eq!(
        format!("0x{}", hex::encode(digest)),
        "0x7c02fe79823722257b42ea95720e7dd31d51c3f6769dc0f56a271800dd030ef1"
    );
}

#[test]
fn mailbox_domain_separator_is_pinned() {
    let data = TypedData::from_value(mailbox_payload()).unwrap();
    let separator = typed_data::domain_separator(&data).unwrap();
    assert_eq!(
        hex::encode(separator),
        "7c8804e57ee8894515909903413a08c5761c4b4a9683830f320ac51e7c009443"
    );
}

#[test]
fn mailbox_encode_type_lists_message_dependency() {
    let data = TypedData::from_value(mailbox_payload()).unwrap();
    let encoder = TypedDataEncoder::new(&data.types).unwrap();
    assert_eq!(
        encoder.encode_type("Mailbox").unwrap(),
        "Mailbox(address owner,Message[] messages)Message(address sender,string subject,bool isSpam,string body)"
    );
}

#[test]
fn json_entry_point_matches_struct_entry_point() {
    let json = mailbox_payload().to_string();
    let from_json = encode_hash_json(&json).unwrap();
    let from_struct = encode_hash(&TypedData::from_value(mailbox_payload()).unwrap()).unwrap();
    assert_eq!(from_json, from_struct);
}

#[test]
fn field_order_in_message_object_does_not_matter() {
    let mut reordered = mailbox_payload();
    reordered["message"]["messages"][0] = json!({
        "isSpam": false,
        "body": "The sparrow flies at midnight.",
        "subject": "Hello World",
        "sender": OWNER
    });

    let a = encode_hash(&TypedData::from_value(mailbox_payload()).unwrap()).unwrap();
    let b = encode_hash(&TypedData::from_value(reordered).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn changing_one_flag_changes_digest() {
    let mut flipped = mailbox_payload();
    flipped["message"]["messages"][1]["isSpam"] = json!(false);

    let a = encode_hash(&TypedData::from_value(mailbox_payload()).unwrap()).unwrap();
    let b = encode_hash(&TypedData::from_value(flipped).unwrap()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn malformed_chain_id_yields_schema_mismatch() {
    let mut bad = mailbox_payload();
    bad["domain"]["chainId"] = json!("forty-one");

    let err = encode_hash(&TypedData::from_value(bad).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        TypedDataError::SchemaMismatch { ref path, .. } if path == "domain.chainId"
    ));
}

#[test]
fn invalid_json_is_reported() {
    assert!(matches!(
        encode_hash_json("{not json"),
        Err(TypedDataError::InvalidJson(_))
    ));
}

#[test]
fn repeated_type_definition_is_rejected() {
    let json = r#"{
        "types": {
            "EIP712Domain": [{"name": "chainId", "type": "uint256"}],
            "T": [{"name": "a", "type": "uint8"}],
            "T": [{"name": "b", "type": "bool"}]
        },
        "primaryType": "T",
        "domain": {"chainId": 1},
        "message": {"b": true}
    }"#;
    assert!(matches!(
        encode_hash_json(json),
        Err(TypedDataError::InvalidJson(_))
    ));
}

fn amount_json(amount: &str) -> String {
    format!(
        r#"{{
            "types": {{
                "EIP712Domain": [{{"name": "chainId", "type": "uint256"}}],
                "Transfer": [{{"name": "amount", "type": "uint256"}}]
            }},
            "primaryType": "Transfer",
            "domain": {{"chainId": 1}},
            "message": {{"amount": {amount}}}
        }}"#
    )
}

#[test]
fn wei_amount_as_bare_number_matches_string_form() {
    for amount in ["18446744073709551616", "100000000000000000000"] {
        let as_number = encode_hash_json(&amount_json(amount)).unwrap();
        let as_string = encode_hash_json(&amount_json(&format!("\"{amount}\""))).unwrap();
        assert_eq!(as_number, as_string, "{amount}");
    }
}

#[test]
fn exponent_number_is_not_an_integer() {
    assert!(matches!(
        encode_hash_json(&amount_json("1e20")),
        Err(TypedDataError::SchemaMismatch { ref path, .. }) if path == "message.amount"
    ));
}

fn ping_payload(nonce: u64, note: &str) -> TypedData {
    TypedData::from_value(json!({
        "types": {
            "EIP712Domain": [{"name": "chainId", "type": "uint256"}],
            "Ping": [
                {"name": "nonce", "type": "uint64"},
                {"name": "note", "type": "string"}
            ]
        },
        "primaryType": "Ping",
        "domain": {"chainId": 1},
        "message": {"nonce": nonce, "note": note}
    }))
    .unwrap()
}

proptest! {
    #[test]
    fn digest_is_deterministic(nonce in any::<u64>(), note in ".*") {
        let first = encode_hash(&ping_payload(nonce, &note)).unwrap();
        let second = encode_hash(&ping_payload(nonce, &note)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn decimal_and_number_forms_agree(nonce in any::<u64>()) {
        let as_number = ping_payload(nonce, "x");
        let mut as_string = as_number.clone();
        as_string.message["nonce"] = json!(nonce.to_string());
        prop_assert_eq!(encode_hash(&as_number).unwrap(), encode_hash(&as_string).unwrap());
    }

    #[test]
    fn uint8_accepts_exactly_its_range(n in 0u64..1024) {
        let encoder = TypedDataEncoder::new(&Default::default()).unwrap();
        let result = encoder.encode_value("uint8", &json!(n));
        if n <= u8::MAX as u64 {
            prop_assert!(result.is_ok());
        } else {
            let is_overflow = matches!(result, Err(TypedDataError::EncodingOverflow { .. }));
            prop_assert!(is_overflow);
        }
    }
}
