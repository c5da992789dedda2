//! Event catalog
//!
//! Administrators group outcomes into named events. For card generation all
//! outcomes are pooled into one flat list; which event an outcome came from
//! does not matter after that.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bingo_core::{AdminPolicy, BingoError, BingoResult, Identity, Outcome};
use bingo_store::{Collection, DocumentStore, StoreError};

use crate::identity::require_admin;
use crate::records::{EventRecord, decode, encode};

/// A named group of outcomes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub outcomes: Vec<Outcome>,
}

/// Split comma separated outcomes, trimming and dropping empty entries
pub fn parse_outcomes(input: &str) -> Vec<Outcome> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// CRUD over `events`
pub struct EventCatalog {
    store: Arc<dyn DocumentStore>,
    policy: AdminPolicy,
}

impl EventCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, policy: AdminPolicy) -> Self {
        Self { store, policy }
    }

    /// Create an event and return its id
    ///
    /// Outcomes are trimmed; blanks and repeats within the event are dropped.
    pub fn create_event(&self, actor: &Identity, name: &str, outcomes: &[String]) -> BingoResult<String> {
        require_admin(&self.policy, actor, "create event")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(BingoError::InvalidParam("event name is empty".into()));
        }

        let mut cleaned: Vec<Outcome> = Vec::with_capacity(outcomes.len());
        for outcome in outcomes.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            if !cleaned.iter().any(|c| c == outcome) {
                cleaned.push(outcome.to_string());
            }
        }
        if cleaned.is_empty() {
            return Err(BingoError::InvalidParam(format!("event '{}' has no outcomes", name)));
        }

        let id = Uuid::new_v4().to_string();
        let record = EventRecord {
            name: name.to_string(),
            outcomes: cleaned,
        };
        self.store.put(Collection::Events, &id, encode(&record)?)?;

        log::info!("Created event '{}' ({}) with {} outcomes", name, id, record.outcomes.len());
        Ok(id)
    }

    /// Create an event from a comma separated outcome string
    pub fn create_event_from_str(&self, actor: &Identity, name: &str, outcomes: &str) -> BingoResult<String> {
        self.create_event(actor, name, &parse_outcomes(outcomes))
    }

    /// Delete an event
    ///
    /// Existing cards, the validated set and confirmations keep their copies
    /// of the event's outcomes.
    pub fn delete_event(&self, actor: &Identity, id: &str) -> BingoResult<()> {
        require_admin(&self.policy, actor, "delete event")?;

        if !self.store.delete(Collection::Events, id)? {
            return Err(StoreError::not_found(Collection::Events, id).into());
        }
        log::info!("Deleted event {}", id);
        Ok(())
    }

    /// Get one event
    pub fn event(&self, id: &str) -> BingoResult<Event> {
        let doc = self.store.get(Collection::Events, id)?;
        let record: EventRecord = decode(Collection::Events, id, doc)?;
        Ok(Event {
            id: id.to_string(),
            name: record.name,
            outcomes: record.outcomes,
        })
    }

    /// All well-formed events with at least one outcome, ordered by id
    pub fn list_events(&self) -> BingoResult<Vec<Event>> {
        let docs = self.store.list(Collection::Events)?;
        let mut events = Vec::with_capacity(docs.len());

        for (id, doc) in docs {
            match decode::<EventRecord>(Collection::Events, &id, doc) {
                Ok(record) if !record.outcomes.is_empty() => events.push(Event {
                    id,
                    name: record.name,
                    outcomes: record.outcomes,
                }),
                Ok(_) => log::debug!("Skipping event {} without outcomes", id),
                Err(e) => log::warn!("Skipping malformed event: {}", e),
            }
        }
        Ok(events)
    }

    /// Every outcome of every event, flattened in catalog order
    ///
    /// Not de-duplicated; the card generator collapses repeats.
    pub fn list_outcome_pool(&self) -> BingoResult<Vec<Outcome>> {
        Ok(self
            .list_events()?
            .into_iter()
            .flat_map(|e| e.outcomes)
            .collect())
    }
}
