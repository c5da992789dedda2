//! Store error types

use thiserror::Error;

use bingo_core::BingoError;

use crate::collection::Collection;

/// Errors reported by a document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {collection}/{key}")]
    NotFound { collection: Collection, key: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Cannot encode record: {0}")]
    Encode(String),

    #[error("Malformed document {collection}/{key}: {reason}")]
    Malformed {
        collection: Collection,
        key: String,
        reason: String,
    },
}

impl StoreError {
    pub fn not_found(collection: Collection, key: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for BingoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { collection, key } => BingoError::NotFound {
                collection: collection.as_str().to_string(),
                key,
            },
            StoreError::Unavailable(reason) => BingoError::StoreUnavailable(reason),
            other @ (StoreError::Encode(_) | StoreError::Malformed { .. }) => {
                BingoError::Serialization(other.to_string())
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_never_maps_to_not_found() {
        let err: BingoError = StoreError::Unavailable("network down".into()).into();
        assert_eq!(err, BingoError::StoreUnavailable("network down".into()));

        let err: BingoError = StoreError::not_found(Collection::Players, "u1").into();
        assert_eq!(
            err,
            BingoError::NotFound {
                collection: "players".into(),
                key: "u1".into()
            }
        );
    }
}
