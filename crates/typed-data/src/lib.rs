//! EIP-712 typed structured data hashing.
//!
//! This crate provides:
//! - Parsing of EIP-712 schemas into resolved field types
//! - Canonical `encodeType` strings and type hashes, dependencies sorted per the standard
//! - ABI word encoding of atomic, dynamic, struct and array values
//! - Domain separators, signing preimages and final digests

pub mod address;
pub mod encoder;
pub mod error;
pub mod payload;
pub mod schema;
pub mod types;
pub mod word;

mod value;

pub use encoder::{domain_separator, encode, encode_hash, encode_hash_json, TypedDataEncoder};
pub use error::TypedDataError;
pub use payload::{TypedData, DOMAIN_TYPE};
pub use schema::FieldDecl;
