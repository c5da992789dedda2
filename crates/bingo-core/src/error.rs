//! Error types for the bingo game

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BingoError {
    #[error("Outcome pool too small: {available} distinct outcomes, {required} required")]
    InsufficientPool { available: usize, required: usize },

    #[error("Outcome already validated: {0}")]
    AlreadyValidated(String),

    #[error("Outcome not validated: {0}")]
    NotValidated(String),

    #[error("Outcome '{outcome}' is not on the card of player {player}")]
    NotOnCard { player: String, outcome: String },

    #[error("Not found: {collection}/{key}")]
    NotFound { collection: String, key: String },

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BingoError {
    /// True for errors caused by the backing store rather than a domain rule
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<serde_json::Error> for BingoError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias
pub type BingoResult<T> = Result<T, BingoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = BingoError::InsufficientPool {
            available: 12,
            required: 25,
        };
        assert_eq!(
            err.to_string(),
            "Outcome pool too small: 12 distinct outcomes, 25 required"
        );

        let err = BingoError::NotFound {
            collection: "players".into(),
            key: "u1".into(),
        };
        assert_eq!(err.to_string(), "Not found: players/u1");
    }

    #[test]
    fn test_store_failure_is_distinct_from_not_found() {
        assert!(BingoError::StoreUnavailable("offline".into()).is_store_failure());
        let not_found = BingoError::NotFound {
            collection: "players".into(),
            key: "u1".into(),
        };
        assert!(!not_found.is_store_failure());
    }
}
