// src/error.rs
use thiserror::Error;

/// Every failure the core surfaces to its caller.
///
/// A missing key is not an error; reads return `Ok(None)` for that case.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An envelope exists at `key` but could not be decoded.
    #[error("stored value at `{key}` is corrupt: {source}")]
    StorageCorruption {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An import or restore payload does not have the expected shape.
    #[error("invalid {what}: {reason}")]
    InvalidFormat { what: &'static str, reason: String },

    /// The backend refused a write because it would exceed its capacity.
    #[error("storage quota exceeded writing `{key}`: needs {needed} bytes, capacity is {capacity}")]
    QuotaExceeded {
        key: String,
        needed: u64,
        capacity: u64,
    },

    #[error("key `{key}` cannot be stored by this backend")]
    InvalidKey { key: String },

    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn invalid_format(what: &'static str, reason: impl ToString) -> Self {
        StoreError::InvalidFormat {
            what,
            reason: reason.to_string(),
        }
    }
}
