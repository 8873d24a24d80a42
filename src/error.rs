// Store error taxonomy

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{collection}' could not be read: {source}")]
    NotFound {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("collection '{collection}' is corrupt: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write collection '{collection}': {source}")]
    WriteFailed {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock collection '{collection}': {source}")]
    Lock {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub(crate) fn not_found(collection: &str, source: std::io::Error) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(collection: &str, source: serde_json::Error) -> Self {
        StoreError::Corrupt {
            collection: collection.to_string(),
            source,
        }
    }

    pub(crate) fn write_failed(collection: &str, source: impl Into<std::io::Error>) -> Self {
        StoreError::WriteFailed {
            collection: collection.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn lock(collection: &str, source: std::io::Error) -> Self {
        StoreError::Lock {
            collection: collection.to_string(),
            source,
        }
    }
}
