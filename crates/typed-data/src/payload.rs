use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TypedDataError;
use crate::schema::FieldDecl;

/// Name of the struct that describes the signing domain.
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// An EIP-712 request in its standard JSON shape.
///
/// ```json
/// {
///   "types": { "EIP712Domain": [...], "Mail": [...] },
///   "primaryType": "Mail",
///   "domain": { "name": "Ether Mail", ... },
///   "message": { "from": { ... }, ... }
/// }
/// ```
///
/// Repeated object keys are rejected rather than letting the last one win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    #[serde(deserialize_with = "unique_types")]
    pub types: BTreeMap<String, Vec<FieldDecl>>,
    pub primary_type: String,
    pub domain: Value,
    pub message: Value,
}

impl TypedData {
    /// Parses the standard JSON form.
    pub fn from_json(json: &str) -> Result<Self, TypedDataError> {
        let invalid = |e: serde_json::Error| TypedDataError::InvalidJson(e.to_string());
        UniqueKeys::root()
            .deserialize(&mut serde_json::Deserializer::from_str(json))
            .map_err(invalid)?;
        serde_json::from_str(json).map_err(invalid)
    }

    /// Converts an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, TypedDataError> {
        serde_json::from_value(value).map_err(|e| TypedDataError::InvalidJson(e.to_string()))
    }
}

fn unique_types<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<FieldDecl>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TypesVisitor;

    impl<'de> Visitor<'de> for TypesVisitor {
        type Value = BTreeMap<String, Vec<FieldDecl>>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of struct names to field lists")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut types = BTreeMap::new();
            while let Some(name) = map.next_key::<String>()? {
                let fields = map.next_value::<Vec<FieldDecl>>()?;
                if types.contains_key(&name) {
                    return Err(de::Error::custom(format!("duplicate type `{name}` in types")));
                }
                types.insert(name, fields);
            }
            Ok(types)
        }
    }

    deserializer.deserialize_map(TypesVisitor)
}

/// Walks a JSON document and fails on the first object with a repeated
/// key. `serde_json::Value` keeps only the last occurrence, so this runs
/// over the raw text before it is parsed into values.
struct UniqueKeys {
    path: String,
}

impl UniqueKeys {
    fn root() -> Self {
        UniqueKeys {
            path: String::new(),
        }
    }

    fn child(&self, segment: &str) -> Self {
        let path = if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{segment}", self.path)
        };
        UniqueKeys { path }
    }
}

impl<'de> DeserializeSeed<'de> for UniqueKeys {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for UniqueKeys {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<(), E> {
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<(), E> {
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<(), E> {
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<(), E> {
        Ok(())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<(), E> {
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> Result<(), E> {
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        let mut index = 0usize;
        while seq
            .next_element_seed(UniqueKeys {
                path: format!("{}[{index}]", self.path),
            })?
            .is_some()
        {
            index += 1;
        }
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut seen = BTreeSet::new();
        while let Some(key) = map.next_key::<String>()? {
            let child = self.child(&key);
            if !seen.insert(key) {
                return Err(de::Error::custom(format!("duplicate key at {}", child.path)));
            }
            map.next_value_seed(child)?;
        }
        Ok(())
    }
}
