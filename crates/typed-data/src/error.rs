use thiserror::Error;

/// Typed-data encoding errors.
///
/// Every variant is a local validation failure: nothing here is worth
/// retrying, and no partial digest is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypedDataError {
    /// The schema or the value tree does not line up with the declared types.
    ///
    /// `path` names the offending location, either a JSON path into the
    /// payload (`message.messages[1].isSpam`) or a schema location
    /// (`types.Mail.from`).
    #[error("schema mismatch at {path}: {reason}")]
    SchemaMismatch { path: String, reason: String },

    /// A numeric or fixed-size value does not fit in its declared width.
    #[error("value at {path} overflows {ty}")]
    EncodingOverflow { path: String, ty: String },

    /// The payload could not be parsed as EIP-712 JSON.
    #[error("invalid typed data json: {0}")]
    InvalidJson(String),
}

impl TypedDataError {
    pub(crate) fn mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        TypedDataError::SchemaMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(path: impl Into<String>, ty: impl Into<String>) -> Self {
        TypedDataError::EncodingOverflow {
            path: path.into(),
            ty: ty.into(),
        }
    }
}
