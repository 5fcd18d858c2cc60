use std::fmt;

/// A resolved EIP-712 field type.
///
/// Field type strings are parsed once when a schema is loaded; encoding then
/// dispatches on this enum instead of re-reading the type string for every
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Address,
    Bool,
    String,
    /// Dynamic `bytes`.
    Bytes,
    /// `bytes1` through `bytes32`.
    FixedBytes(usize),
    /// `uint8` through `uint256`, width in bits.
    Uint(usize),
    /// `int8` through `int256`, width in bits.
    Int(usize),
    /// `T[]` (len `None`) or `T[n]`.
    Array {
        element: Box<FieldType>,
        len: Option<usize>,
    },
    /// Reference to a struct declared in the same schema.
    Struct(String),
}

impl FieldType {
    /// Parses an atomic or dynamic type name (`address`, `uint64`, `bytes7`,
    /// `string`, ...). Returns `None` for anything else, including arrays and
    /// struct names.
    pub fn parse_elementary(raw: &str) -> Option<FieldType> {
        match raw {
            "address" => return Some(FieldType::Address),
            "bool" => return Some(FieldType::Bool),
            "string" => return Some(FieldType::String),
            "bytes" => return Some(FieldType::Bytes),
            _ => {}
        }

        if let Some(width) = raw.strip_prefix("bytes") {
            return parse_width(width)
                .filter(|n| (1..=32).contains(n))
                .map(FieldType::FixedBytes);
        }
        if let Some(bits) = raw.strip_prefix("uint") {
            return parse_width(bits)
                .filter(|n| is_int_width(*n))
                .map(FieldType::Uint);
        }
        if let Some(bits) = raw.strip_prefix("int") {
            return parse_width(bits)
                .filter(|n| is_int_width(*n))
                .map(FieldType::Int);
        }

        None
    }

    /// Parses a field type string, resolving bare identifiers against the
    /// schema's struct names via `is_struct`.
    ///
    /// Returns the reason as a plain message on failure; the caller attaches
    /// the schema location.
    pub fn parse<F>(raw: &str, is_struct: &F) -> Result<FieldType, String>
    where
        F: Fn(&str) -> bool,
    {
        if let Some(open) = raw.strip_suffix(']').and_then(|s| s.rfind('[')) {
            let element = &raw[..open];
            let len_str = &raw[open + 1..raw.len() - 1];
            let len = if len_str.is_empty() {
                None
            } else {
                Some(
                    parse_width(len_str)
                        .ok_or_else(|| format!("invalid array length in `{raw}`"))?,
                )
            };
            let element = FieldType::parse(element, is_struct)?;
            return Ok(FieldType::Array {
                element: Box::new(element),
                len,
            });
        }

        if let Some(ty) = FieldType::parse_elementary(raw) {
            return Ok(ty);
        }

        if is_struct(raw) {
            return Ok(FieldType::Struct(raw.to_string()));
        }

        Err(format!("unknown type `{raw}`"))
    }

    /// The struct this type ultimately refers to, looking through arrays.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            FieldType::Array { element, .. } => element.struct_name(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Address => f.write_str("address"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::String => f.write_str("string"),
            FieldType::Bytes => f.write_str("bytes"),
            FieldType::FixedBytes(n) => write!(f, "bytes{n}"),
            FieldType::Uint(bits) => write!(f, "uint{bits}"),
            FieldType::Int(bits) => write!(f, "int{bits}"),
            FieldType::Array { element, len: None } => write!(f, "{element}[]"),
            FieldType::Array {
                element,
                len: Some(n),
            } => write!(f, "{element}[{n}]"),
            FieldType::Struct(name) => f.write_str(name),
        }
    }
}

/// Decimal width suffix without sign or leading zeros.
fn parse_width(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn is_int_width(bits: usize) -> bool {
    bits % 8 == 0 && (8..=256).contains(&bits)
}
