//! Safe multisig support built on EIP-712 hashing.
//!
//! This crate provides:
//! - `SafeTx` typed-data payloads, hashes and preimages for every Safe contract version
//! - Owner signatures over Safe hashes (sign, parse, recover, remove)
//! - The EIP-712 messages the Safe transaction service expects for delegates,
//!   transaction deletion and off-chain Safe messages

pub mod error;
pub mod messages;
pub mod safe_tx;
pub mod signature;
pub mod signing;
pub mod version;

pub use error::SafeTxError;
pub use safe_tx::SafeTx;
pub use signature::{parse_signatures, SafeSignature, SignatureKind};
pub use version::SafeVersion;
