use alloy_primitives::{Address, B256};
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use crate::error::SafeTxError;

/// Signs a 32-byte hash (an EIP-712 digest or Safe tx hash) with a
/// secp256k1 private key.
///
/// Returns the 65-byte signature `r || s || v` with `v` = 27 or 28, the
/// layout Safe contracts expect for owner signatures.
pub fn sign_hash(hash: &B256, private_key: &[u8; 32]) -> Result<[u8; 65], SafeTxError> {
    let signing_key = signing_key(private_key)?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(hash.as_slice())
        .map_err(|e| SafeTxError::SigningError(e.to_string()))?;

    let mut sig = [0u8; 65];
    sig[..32].copy_from_slice(&signature.r().to_bytes());
    sig[32..64].copy_from_slice(&signature.s().to_bytes());
    sig[64] = recovery_id.is_y_odd() as u8 + 27;
    Ok(sig)
}

/// Recovers the signer of a `r || s || v` signature over `hash`.
///
/// `v` may be 27/28 or the raw recovery id 0/1.
pub fn recover_address(hash: &B256, signature: &[u8; 65]) -> Result<Address, SafeTxError> {
    let v = signature[64];
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id = RecoveryId::from_byte(recovery_byte)
        .ok_or_else(|| SafeTxError::InvalidSignature(format!("unsupported v value {v}")))?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| SafeTxError::InvalidSignature(e.to_string()))?;

    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
        .map_err(|e| SafeTxError::InvalidSignature(e.to_string()))?;

    Ok(verifying_key_to_address(&verifying_key))
}

/// Ethereum address controlled by a private key.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<Address, SafeTxError> {
    let signing_key = signing_key(private_key)?;
    Ok(verifying_key_to_address(signing_key.verifying_key()))
}

/// The EIP-191 `personal_sign` hash of a 32-byte hash, as produced by
/// `eth_sign`.
pub fn eth_sign_hash(hash: &B256) -> B256 {
    personal_message_hash(hash.as_slice())
}

/// The EIP-191 `personal_sign` hash of an arbitrary message.
pub fn personal_message_hash(message: &[u8]) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    B256::from_slice(&hasher.finalize())
}

fn signing_key(private_key: &[u8; 32]) -> Result<SigningKey, SafeTxError> {
    // Zeroize the stack copy once the key is parsed.
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| SafeTxError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    signing_key
}

fn verifying_key_to_address(verifying_key: &VerifyingKey) -> Address {
    let public_key = PublicKey::from(verifying_key);
    let uncompressed = public_key.to_encoded_point(false);

    // Keccak-256 of the 64-byte key (skip the 0x04 prefix); last 20 bytes.
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
