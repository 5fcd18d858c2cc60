//! Parsed EIP-712 schemas.
//!
//! A [`TypeRegistry`] is built once from the `types` section of a payload.
//! Building it resolves every field type, rejects schemas that cannot be
//! encoded, and precomputes each struct's canonical `encodeType` string and
//! type hash.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::TypedDataError;
use crate::types::FieldType;

/// One `{ "name": ..., "type": ... }` entry of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        FieldDecl {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A struct field with its resolved type.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// A resolved struct definition.
#[derive(Debug, Clone)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Field>,
    encoded_type: String,
    type_hash: B256,
}

impl StructType {
    pub fn encoded_type(&self) -> &str {
        &self.encoded_type
    }

    pub fn type_hash(&self) -> B256 {
        self.type_hash
    }
}

/// All struct types of one schema, keyed by name.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    structs: HashMap<String, StructType>,
}

impl TypeRegistry {
    pub fn new(types: &BTreeMap<String, Vec<FieldDecl>>) -> Result<Self, TypedDataError> {
        for name in types.keys() {
            check_struct_name(name)?;
        }

        let is_struct = |name: &str| types.contains_key(name);

        let mut resolved: BTreeMap<&str, Vec<Field>> = BTreeMap::new();
        for (name, decls) in types {
            let mut seen = HashSet::new();
            let mut fields = Vec::with_capacity(decls.len());
            for decl in decls {
                let location = format!("types.{name}.{}", decl.name);
                if decl.name.is_empty() {
                    return Err(TypedDataError::mismatch(
                        format!("types.{name}"),
                        "field with an empty name",
                    ));
                }
                if !seen.insert(decl.name.as_str()) {
                    return Err(TypedDataError::mismatch(location, "duplicate field name"));
                }
                let ty = FieldType::parse(&decl.ty, &is_struct)
                    .map_err(|reason| TypedDataError::mismatch(location, reason))?;
                fields.push(Field {
                    name: decl.name.clone(),
                    ty,
                });
            }
            resolved.insert(name.as_str(), fields);
        }

        // Field signatures are rendered from the declared type strings so the
        // canonical form is exactly what the schema author wrote.
        let signatures: HashMap<&str, String> = types
            .iter()
            .map(|(name, decls)| {
                let params: Vec<String> = decls
                    .iter()
                    .map(|d| format!("{} {}", d.ty, d.name))
                    .collect();
                (name.as_str(), format!("{name}({})", params.join(",")))
            })
            .collect();

        let mut structs = HashMap::with_capacity(resolved.len());
        for (name, fields) in &resolved {
            let mut deps = BTreeSet::new();
            collect_dependencies(name, &resolved, &mut deps);
            deps.remove(name);

            let mut encoded_type = signatures[name].clone();
            for dep in &deps {
                encoded_type.push_str(&signatures[dep]);
            }
            let type_hash = B256::from_slice(&Keccak256::digest(encoded_type.as_bytes()));

            structs.insert(
                name.to_string(),
                StructType {
                    name: name.to_string(),
                    fields: fields.clone(),
                    encoded_type,
                    type_hash,
                },
            );
        }

        Ok(TypeRegistry { structs })
    }

    pub fn get(&self, name: &str) -> Result<&StructType, TypedDataError> {
        self.structs.get(name).ok_or_else(|| {
            TypedDataError::mismatch(format!("types.{name}"), format!("unknown struct type `{name}`"))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// Parses a field type string against this registry's struct names.
    pub fn resolve(&self, raw: &str) -> Result<FieldType, TypedDataError> {
        FieldType::parse(raw, &|name: &str| self.contains(name))
            .map_err(|reason| TypedDataError::mismatch(raw, reason))
    }
}

/// Depth-first walk of struct references. `found` doubles as the visited
/// set, so self-references and cycles terminate, and its ordering gives the
/// lexicographic dependency order `encodeType` requires.
fn collect_dependencies<'a>(
    name: &'a str,
    resolved: &'a BTreeMap<&'a str, Vec<Field>>,
    found: &mut BTreeSet<&'a str>,
) {
    let Some(fields) = resolved.get(name) else {
        return;
    };
    for field in fields {
        if let Some(dep) = field.ty.struct_name() {
            if found.insert(dep) {
                collect_dependencies(dep, resolved, found);
            }
        }
    }
}

/// Solidity names that are not encodable types themselves but may not be
/// shadowed by a struct.
const RESERVED_NAMES: &[&str] = &["uint", "int", "byte", "fixed", "ufixed", "function"];

fn check_struct_name(name: &str) -> Result<(), TypedDataError> {
    let location = format!("types.{name}");
    if name.is_empty() {
        return Err(TypedDataError::mismatch(location, "empty type name"));
    }
    if FieldType::parse_elementary(name).is_some() || RESERVED_NAMES.contains(&name) {
        return Err(TypedDataError::mismatch(
            location,
            format!("struct name `{name}` collides with a built-in type"),
        ));
    }
    let valid_ident = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !valid_ident {
        return Err(TypedDataError::mismatch(
            location,
            format!("`{name}` is not a valid struct name"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> BTreeMap<String, Vec<FieldDecl>> {
        serde_json::from_value(value).unwrap()
    }

    fn mail_schema() -> BTreeMap<String, Vec<FieldDecl>> {
        schema(json!({
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"}
            ]
        }))
    }

    #[test]
    fn encode_type_mail() {
        let registry = TypeRegistry::new(&mail_schema()).unwrap();
        assert_eq!(
            registry.get("Mail").unwrap().encoded_type(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn type_hash_mail_known_vector() {
        let registry = TypeRegistry::new(&mail_schema()).unwrap();
        assert_eq!(
            hex::encode(registry.get("Mail").unwrap().type_hash()),
            "a0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2"
        );
        assert_eq!(
            hex::encode(registry.get("Person").unwrap().type_hash()),
            "b9d8c78acf9b987311de6c7b45bb6a9c8e1bf361fa7fd3467a2163f994c79500"
        );
    }

    #[test]
    fn dependencies_are_sorted_by_name_not_declaration() {
        let types = schema(json!({
            "Root": [{"name": "b", "type": "B"}, {"name": "a", "type": "A"}],
            "B": [{"name": "x", "type": "uint256"}],
            "A": [{"name": "y", "type": "string"}]
        }));
        let registry = TypeRegistry::new(&types).unwrap();
        assert_eq!(
            registry.get("Root").unwrap().encoded_type(),
            "Root(B b,A a)A(string y)B(uint256 x)"
        );
    }

    #[test]
    fn transitive_dependencies_through_arrays() {
        let types = schema(json!({
            "Mailbox": [
                {"name": "owner", "type": "address"},
                {"name": "messages", "type": "Message[]"}
            ],
            "Message": [
                {"name": "sender", "type": "Person"},
                {"name": "body", "type": "string"}
            ],
            "Person": [{"name": "wallet", "type": "address"}]
        }));
        let registry = TypeRegistry::new(&types).unwrap();
        assert_eq!(
            registry.get("Mailbox").unwrap().encoded_type(),
            "Mailbox(address owner,Message[] messages)Message(Person sender,string body)Person(address wallet)"
        );
    }

    #[test]
    fn self_reference_does_not_list_root_twice() {
        let types = schema(json!({
            "Node": [
                {"name": "value", "type": "uint256"},
                {"name": "children", "type": "Node[]"}
            ]
        }));
        let registry = TypeRegistry::new(&types).unwrap();
        assert_eq!(
            registry.get("Node").unwrap().encoded_type(),
            "Node(uint256 value,Node[] children)"
        );
    }

    #[test]
    fn mutual_recursion_terminates() {
        let types = schema(json!({
            "A": [{"name": "b", "type": "B[]"}],
            "B": [{"name": "a", "type": "A[]"}]
        }));
        let registry = TypeRegistry::new(&types).unwrap();
        assert_eq!(registry.get("A").unwrap().encoded_type(), "A(B[] b)B(A[] a)");
        assert_eq!(registry.get("B").unwrap().encoded_type(), "B(A[] a)A(B[] b)");
    }

    #[test]
    fn unknown_field_type_is_rejected() {
        let types = schema(json!({"Mail": [{"name": "from", "type": "Person"}]}));
        let err = TypeRegistry::new(&types).unwrap_err();
        assert_eq!(
            err,
            TypedDataError::SchemaMismatch {
                path: "types.Mail.from".into(),
                reason: "unknown type `Person`".into()
            }
        );
    }

    #[test]
    fn struct_named_like_atomic_type_is_rejected() {
        let types = schema(json!({"address": [{"name": "x", "type": "uint256"}]}));
        let err = TypeRegistry::new(&types).unwrap_err();
        assert!(err.to_string().contains("collides with a built-in type"));

        let types = schema(json!({"uint256": [{"name": "x", "type": "bool"}]}));
        assert!(TypeRegistry::new(&types).is_err());
    }

    #[test]
    fn struct_named_like_reserved_alias_is_rejected() {
        for name in ["uint", "int", "byte", "fixed", "ufixed", "function"] {
            let types = schema(json!({name: [{"name": "x", "type": "bool"}]}));
            match TypeRegistry::new(&types).unwrap_err() {
                TypedDataError::SchemaMismatch { path, .. } => {
                    assert_eq!(path, format!("types.{name}"))
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn struct_named_like_array_is_rejected() {
        let types = schema(json!({"Foo[]": [{"name": "x", "type": "bool"}]}));
        assert!(TypeRegistry::new(&types).is_err());
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let types = schema(json!({
            "Foo": [{"name": "x", "type": "bool"}, {"name": "x", "type": "uint8"}]
        }));
        let err = TypeRegistry::new(&types).unwrap_err();
        assert!(err.to_string().contains("duplicate field name"));
    }

    #[test]
    fn empty_struct_is_allowed() {
        let types = schema(json!({"Empty": []}));
        let registry = TypeRegistry::new(&types).unwrap();
        assert_eq!(registry.get("Empty").unwrap().encoded_type(), "Empty()");
    }
}
