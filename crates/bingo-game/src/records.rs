//! Persisted document shapes
//!
//! Field names match the documents already stored by the web client, so both
//! can share one backend.

use serde::{Deserialize, Serialize};

use bingo_card::Card;
use bingo_core::{BingoResult, Outcome, OutcomeSet};
use bingo_store::{Collection, Document, from_document, to_document};

/// `players/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub card: Card,
    #[serde(default)]
    pub confirmed_events: Vec<Outcome>,
}

/// `events/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    #[serde(rename = "value", default)]
    pub outcomes: Vec<Outcome>,
}

/// `validated/events`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRecord {
    #[serde(default)]
    pub values: Vec<Outcome>,
}

impl ValidatedRecord {
    pub fn from_set(set: &OutcomeSet) -> Self {
        Self {
            values: set.iter().cloned().collect(),
        }
    }

    pub fn into_set(self) -> OutcomeSet {
        self.values.into_iter().collect()
    }
}

/// `eventRequests/{outcome}`: an unvalidated outcome a player asked to confirm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(rename = "value")]
    pub outcome: Outcome,
    #[serde(rename = "count")]
    pub request_count: u32,
    pub requested_by: String,
}

impl PendingRequest {
    pub fn new(outcome: impl Into<Outcome>, requested_by: impl Into<String>) -> Self {
        Self {
            outcome: outcome.into(),
            request_count: 1,
            requested_by: requested_by.into(),
        }
    }
}

pub(crate) fn encode<T: Serialize>(record: &T) -> BingoResult<Document> {
    Ok(to_document(record)?)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    collection: Collection,
    key: &str,
    doc: Document,
) -> BingoResult<T> {
    Ok(from_document(collection, key, doc)?)
}
