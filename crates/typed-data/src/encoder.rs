use std::collections::BTreeMap;

use alloy_primitives::B256;
use serde_json::Value;
use sha3::{Digest, Keccak256};

use crate::address::parse_address;
use crate::error::TypedDataError;
use crate::payload::{TypedData, DOMAIN_TYPE};
use crate::schema::{FieldDecl, TypeRegistry};
use crate::types::FieldType;
use crate::value::{expect_bool, expect_str, parse_hex_bytes, parse_int, parse_uint, shape};
use crate::word::{address_word, bool_word, fixed_bytes_word, int_word, uint_word, Word};

/// EIP-712 struct hashing over one schema.
///
/// The encoder holds only the parsed schema and never mutates it, so a
/// single instance can be shared across threads and reused for any number
/// of messages of that schema.
#[derive(Debug, Clone)]
pub struct TypedDataEncoder {
    registry: TypeRegistry,
}

impl TypedDataEncoder {
    /// Parses and validates a `types` section.
    pub fn new(types: &BTreeMap<String, Vec<FieldDecl>>) -> Result<Self, TypedDataError> {
        Ok(TypedDataEncoder {
            registry: TypeRegistry::new(types)?,
        })
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Canonical type signature: `Name(type1 name1,...)` followed by every
    /// referenced struct in lexicographic order.
    pub fn encode_type(&self, type_name: &str) -> Result<&str, TypedDataError> {
        Ok(self.registry.get(type_name)?.encoded_type())
    }

    /// `keccak256(encode_type(type_name))`.
    pub fn type_hash(&self, type_name: &str) -> Result<B256, TypedDataError> {
        Ok(self.registry.get(type_name)?.type_hash())
    }

    /// Encodes one value of the given field type as a 32-byte word.
    ///
    /// `field_type` may be any type string valid in this schema: an atomic
    /// type, `string`/`bytes`, a struct name, or an array of any of these.
    pub fn encode_value(&self, field_type: &str, value: &Value) -> Result<Word, TypedDataError> {
        let ty = self.registry.resolve(field_type)?;
        self.encode_field(&ty, value, "value")
    }

    /// `keccak256(type_hash || encode_value(field_1) || ... )` with fields
    /// in declaration order.
    pub fn hash_struct(&self, type_name: &str, value: &Value) -> Result<B256, TypedDataError> {
        self.hash_struct_at(type_name, value, type_name)
    }

    fn hash_struct_at(
        &self,
        type_name: &str,
        value: &Value,
        path: &str,
    ) -> Result<B256, TypedDataError> {
        let def = self.registry.get(type_name)?;
        let object = value.as_object().ok_or_else(|| {
            TypedDataError::mismatch(
                path,
                format!("expected an object for {type_name}, got {}", shape(value)),
            )
        })?;

        if let Some(extra) = object
            .keys()
            .find(|key| !def.fields.iter().any(|f| &f.name == *key))
        {
            return Err(TypedDataError::mismatch(
                join(path, extra),
                format!("field `{extra}` is not declared on {type_name}"),
            ));
        }

        let mut hasher = Keccak256::new();
        hasher.update(def.type_hash());
        for field in &def.fields {
            let child = join(path, &field.name);
            let field_value = object.get(&field.name).ok_or_else(|| {
                TypedDataError::mismatch(&child, format!("missing value for {} {}", field.ty, field.name))
            })?;
            hasher.update(self.encode_field(&field.ty, field_value, &child)?);
        }

        Ok(B256::from_slice(&hasher.finalize()))
    }

    fn encode_field(&self, ty: &FieldType, value: &Value, path: &str) -> Result<Word, TypedDataError> {
        match ty {
            FieldType::Address => {
                let raw = expect_str(value, path, "address")?;
                let address =
                    parse_address(raw).map_err(|reason| TypedDataError::mismatch(path, reason))?;
                Ok(address_word(&address))
            }
            FieldType::Bool => Ok(bool_word(expect_bool(value, path)?)),
            FieldType::String => {
                let s = expect_str(value, path, "string")?;
                Ok(keccak_word(s.as_bytes()))
            }
            FieldType::Bytes => {
                let bytes = parse_hex_bytes(value, path, "bytes")?;
                Ok(keccak_word(&bytes))
            }
            FieldType::FixedBytes(size) => {
                let bytes = parse_hex_bytes(value, path, &ty.to_string())?;
                if bytes.len() > *size {
                    return Err(TypedDataError::overflow(path, ty.to_string()));
                }
                Ok(fixed_bytes_word(&bytes))
            }
            FieldType::Uint(bits) => Ok(uint_word(&parse_uint(value, *bits, path)?)),
            FieldType::Int(bits) => {
                let (magnitude, negative) = parse_int(value, *bits, path)?;
                Ok(int_word(&magnitude, negative))
            }
            FieldType::Array { element, len } => {
                let items = value.as_array().ok_or_else(|| {
                    TypedDataError::mismatch(
                        path,
                        format!("expected an array for {ty}, got {}", shape(value)),
                    )
                })?;
                if let Some(expected) = len {
                    if items.len() != *expected {
                        return Err(TypedDataError::mismatch(
                            path,
                            format!("{ty} needs {expected} elements, got {}", items.len()),
                        ));
                    }
                }

                // An empty array hashes the empty byte string.
                let mut hasher = Keccak256::new();
                for (i, item) in items.iter().enumerate() {
                    hasher.update(self.encode_field(element, item, &format!("{path}[{i}]"))?);
                }
                let mut word = [0u8; 32];
                word.copy_from_slice(&hasher.finalize());
                Ok(word)
            }
            FieldType::Struct(name) => Ok(self.hash_struct_at(name, value, path)?.0),
        }
    }
}

/// Hash of the domain struct, binding a signature to one application,
/// chain and contract.
pub fn domain_separator(payload: &TypedData) -> Result<B256, TypedDataError> {
    let encoder = TypedDataEncoder::new(&payload.types)?;
    domain_separator_with(&encoder, payload)
}

fn domain_separator_with(
    encoder: &TypedDataEncoder,
    payload: &TypedData,
) -> Result<B256, TypedDataError> {
    if !encoder.registry.contains(DOMAIN_TYPE) {
        return Err(TypedDataError::mismatch(
            format!("types.{DOMAIN_TYPE}"),
            "schema has no domain type",
        ));
    }
    encoder.hash_struct_at(DOMAIN_TYPE, &payload.domain, "domain")
}

/// The signing preimage `0x19 0x01 || domainSeparator || hashStruct(message)`.
///
/// When the primary type is the domain type itself the message hash is
/// omitted and the preimage is 34 bytes.
pub fn encode(payload: &TypedData) -> Result<Vec<u8>, TypedDataError> {
    let encoder = TypedDataEncoder::new(&payload.types)?;
    let domain_separator = domain_separator_with(&encoder, payload)?;

    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(domain_separator.as_slice());

    if payload.primary_type != DOMAIN_TYPE {
        let message_hash =
            encoder.hash_struct_at(&payload.primary_type, &payload.message, "message")?;
        preimage.extend_from_slice(message_hash.as_slice());
    }

    Ok(preimage)
}

/// The EIP-712 digest `keccak256(encode(payload))`.
pub fn encode_hash(payload: &TypedData) -> Result<B256, TypedDataError> {
    let preimage = encode(payload)?;
    let digest = B256::from_slice(&Keccak256::digest(&preimage));
    tracing::debug!(primary_type = %payload.primary_type, %digest, "computed typed data digest");
    Ok(digest)
}

/// Parses EIP-712 JSON and hashes it.
pub fn encode_hash_json(json: &str) -> Result<B256, TypedDataError> {
    encode_hash(&TypedData::from_json(json)?)
}

fn keccak_word(data: &[u8]) -> Word {
    let mut word = [0u8; 32];
    word.copy_from_slice(&Keccak256::digest(data));
    word
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}
