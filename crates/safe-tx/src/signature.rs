//! Safe owner signatures.
//!
//! A Safe signature blob is a run of 65-byte `r || s || v` entries, one per
//! owner, optionally followed by dynamic data referenced by contract
//! signatures. `v` selects how the owner is derived:
//!
//! | v      | kind          | owner                                         |
//! |--------|---------------|-----------------------------------------------|
//! | 0      | contract      | address in `r`, checked on-chain via EIP-1271 |
//! | 1      | approved hash | address in `r`, approved on-chain             |
//! | > 30   | eth_sign      | recovered from the EIP-191 hash, `v - 4`      |
//! | 27, 28 | EOA           | recovered from the hash                       |

use alloy_primitives::{Address, B256, U256};

use crate::error::SafeTxError;
use crate::signing::{eth_sign_hash, recover_address};

const SIGNATURE_LEN: usize = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureKind {
    Contract,
    ApprovedHash,
    EthSign,
    Eoa,
}

/// One parsed entry of a Safe signature blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSignature {
    pub kind: SignatureKind,
    pub owner: Address,
    pub signature: [u8; SIGNATURE_LEN],
}

impl SafeSignature {
    /// Classifies one 65-byte entry and derives its owner.
    pub fn parse(signature: [u8; SIGNATURE_LEN], safe_tx_hash: &B256) -> Result<Self, SafeTxError> {
        let v = signature[64];
        let (kind, owner) = match v {
            0 => (SignatureKind::Contract, address_in_word(&signature[..32])),
            1 => (SignatureKind::ApprovedHash, address_in_word(&signature[..32])),
            v if v > 30 => {
                let mut adjusted = signature;
                adjusted[64] = v - 4;
                let owner = recover_address(&eth_sign_hash(safe_tx_hash), &adjusted)?;
                (SignatureKind::EthSign, owner)
            }
            _ => (SignatureKind::Eoa, recover_address(safe_tx_hash, &signature)?),
        };

        Ok(SafeSignature {
            kind,
            owner,
            signature,
        })
    }
}

/// Splits a signature blob into its static entries and derives each owner.
///
/// Parsing stops where the dynamic part of the first contract signature
/// begins (its offset is stored in `s`).
pub fn parse_signatures(data: &[u8], safe_tx_hash: &B256) -> Result<Vec<SafeSignature>, SafeTxError> {
    let mut dynamic_start = data.len();
    let mut parsed = Vec::new();
    let mut offset = 0;

    while offset + SIGNATURE_LEN <= dynamic_start {
        let mut entry = [0u8; SIGNATURE_LEN];
        entry.copy_from_slice(&data[offset..offset + SIGNATURE_LEN]);

        let signature = SafeSignature::parse(entry, safe_tx_hash)?;
        if signature.kind == SignatureKind::Contract {
            let dynamic_offset = U256::from_be_slice(&entry[32..64]);
            let dynamic_offset = usize::try_from(dynamic_offset).map_err(|_| {
                SafeTxError::InvalidSignature("contract signature offset out of range".into())
            })?;
            if dynamic_offset < offset + SIGNATURE_LEN || dynamic_offset > data.len() {
                return Err(SafeTxError::InvalidSignature(format!(
                    "contract signature offset {dynamic_offset} points inside the static part"
                )));
            }
            dynamic_start = dynamic_start.min(dynamic_offset);
        }

        parsed.push(signature);
        offset += SIGNATURE_LEN;
    }

    if offset != dynamic_start {
        return Err(SafeTxError::InvalidSignature(format!(
            "{} trailing bytes after static signatures",
            dynamic_start - offset
        )));
    }

    Ok(parsed)
}

/// Rebuilds a signature blob from EOA-style entries, sorted by owner.
pub(crate) fn join_sorted(mut signatures: Vec<SafeSignature>) -> Vec<u8> {
    signatures.sort_by(|a, b| a.owner.cmp(&b.owner));
    signatures
        .iter()
        .flat_map(|s| s.signature)
        .collect()
}

fn address_in_word(word: &[u8]) -> Address {
    Address::from_slice(&word[12..32])
}
