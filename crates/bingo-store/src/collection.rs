//! Collections and documents

use std::fmt;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Key of the single document in `validated`
pub const VALIDATED_KEY: &str = "events";

/// A JSON object stored under a key
pub type Document = Map<String, Value>;

/// Collections used by the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    /// key = player id
    Players,
    /// key = event id
    Events,
    /// single key [`VALIDATED_KEY`]
    Validated,
    /// key = outcome value
    EventRequests,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Events => "events",
            Collection::Validated => "validated",
            Collection::EventRequests => "eventRequests",
        }
    }

    pub fn all() -> [Collection; 4] {
        [
            Collection::Players,
            Collection::Events,
            Collection::Validated,
            Collection::EventRequests,
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field update inside a patch
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPatch {
    /// Overwrite the field
    Set(Value),
    /// Add to an integer field (missing field counts as 0)
    Increment(i64),
}

/// Ordered list of field updates applied as one unit
pub type Patch = Vec<(String, FieldPatch)>;

/// Encode a typed record as a document
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Encode(format!("not an object: {}", other))),
        Err(e) => Err(StoreError::Encode(e.to_string())),
    }
}

/// Decode a document into a typed record
pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    key: &str,
    doc: Document,
) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Malformed {
        collection,
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Apply a patch to a document in place
pub(crate) fn apply_patch(doc: &mut Document, patch: &Patch) -> Result<(), String> {
    // Check every increment first so a bad field leaves the document untouched
    for (field, op) in patch {
        if let FieldPatch::Increment(by) = op {
            let current = match doc.get(field) {
                None | Some(Value::Null) => 0,
                Some(v) => v
                    .as_i64()
                    .ok_or_else(|| format!("field '{}' is not an integer: {}", field, v))?,
            };
            if current.checked_add(*by).is_none() {
                return Err(format!("field '{}' overflows: {} + {}", field, current, by));
            }
        }
    }

    for (field, op) in patch {
        match op {
            FieldPatch::Set(value) => {
                doc.insert(field.clone(), value.clone());
            }
            FieldPatch::Increment(by) => {
                let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
                let next = current
                    .checked_add(*by)
                    .ok_or_else(|| format!("field '{}' overflows: {} + {}", field, current, by))?;
                doc.insert(field.clone(), Value::from(next));
            }
        }
    }
    Ok(())
}
