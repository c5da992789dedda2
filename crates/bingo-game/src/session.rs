//! Player sessions
//!
//! Each identity owns exactly one card, generated lazily on first session and
//! never regenerated. Only the owner mutates its confirmed outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bingo_card::{Card, CardGenerator, Evaluation, evaluate};
use bingo_core::{BingoError, BingoResult, Identity, Outcome, OutcomeSet};
use bingo_store::{Collection, DocumentStore, FieldPatch};

use crate::catalog::EventCatalog;
use crate::identity::require_owner;
use crate::records::{PendingRequest, PlayerRecord, decode, encode};
use crate::validation::{RequestStatus, ValidationWorkflow, load_validated};

/// A player's card and confirmed outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub player_id: String,
    pub card: Card,
    pub confirmed_events: OutcomeSet,
}

impl PlayerSession {
    fn from_record(player_id: &str, record: PlayerRecord) -> Self {
        Self {
            player_id: player_id.to_string(),
            card: record.card,
            confirmed_events: record.confirmed_events.into_iter().collect(),
        }
    }

    /// Current bingo state
    pub fn evaluation(&self) -> Evaluation {
        evaluate(&self.card, &self.confirmed_events)
    }

    pub fn is_confirmed(&self, outcome: &str) -> bool {
        self.confirmed_events.contains(outcome)
    }
}

/// Result of toggling a confirmed outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Outcome is confirmed after the toggle
    pub confirmed: bool,
    /// Bingo state after the toggle
    pub evaluation: Evaluation,
}

/// What happened when a player clicked a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Outcome was validated and the toggle was applied
    Confirmed(Confirmation),
    /// Outcome is not validated yet; a request is waiting for an administrator
    PendingApproval(PendingRequest),
}

impl ToggleOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, ToggleOutcome::PendingApproval(_))
    }
}

/// Opens sessions and applies player toggles
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<EventCatalog>,
    validation: Arc<ValidationWorkflow>,
    generator: Mutex<CardGenerator>,
    anonymous_name: String,
    // One lock per player so re-entrant calls for the same player serialize
    player_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<EventCatalog>,
        validation: Arc<ValidationWorkflow>,
        generator: CardGenerator,
        anonymous_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            catalog,
            validation,
            generator: Mutex::new(generator),
            anonymous_name: anonymous_name.into(),
            player_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` holding the player's lock; the entry is dropped once unused
    fn with_player_lock<T>(&self, player_id: &str, f: impl FnOnce() -> BingoResult<T>) -> BingoResult<T> {
        let lock = Arc::clone(
            self.player_locks
                .lock()
                .entry(player_id.to_string())
                .or_default(),
        );
        let result = {
            let _guard = lock.lock();
            f()
        };

        // Handles are only cloned under the table lock, so a count of 2
        // (table + ours) means nobody else holds or waits for this lock
        let mut locks = self.player_locks.lock();
        if Arc::strong_count(&lock) == 2 {
            locks.remove(player_id);
        }
        result
    }

    #[cfg(test)]
    fn held_lock_count(&self) -> usize {
        self.player_locks.lock().len()
    }

    fn load_record(&self, player_id: &str) -> BingoResult<PlayerRecord> {
        let doc = self.store.get(Collection::Players, player_id)?;
        decode(Collection::Players, player_id, doc)
    }

    /// Load the identity's session, generating and storing a card on first use
    ///
    /// Fails with `InsufficientPool` (and writes nothing) when the catalog
    /// cannot fill a card.
    pub fn open_session(&self, identity: &Identity) -> BingoResult<PlayerSession> {
        self.with_player_lock(&identity.id, || self.open_session_locked(identity))
    }

    fn open_session_locked(&self, identity: &Identity) -> BingoResult<PlayerSession> {
        match self.load_record(&identity.id) {
            Ok(record) => {
                log::debug!("Loaded session for {}", identity.id);
                return Ok(PlayerSession::from_record(&identity.id, record));
            }
            Err(BingoError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let pool = self.catalog.list_outcome_pool()?;
        let card = self.generator.lock().generate(&pool)?;
        let record = PlayerRecord {
            card,
            confirmed_events: Vec::new(),
        };
        self.store
            .put(Collection::Players, &identity.id, encode(&record)?)?;

        log::info!("Generated card for {} from {} outcomes", identity.id, pool.len());
        Ok(PlayerSession::from_record(&identity.id, record))
    }

    /// Load an existing session
    pub fn session(&self, player_id: &str) -> BingoResult<PlayerSession> {
        Ok(PlayerSession::from_record(player_id, self.load_record(player_id)?))
    }

    /// Toggle a validated outcome in the player's confirmed set
    ///
    /// Checks ownership, card membership and validation before writing.
    pub fn confirm_for_player(&self, actor: &Identity, player_id: &str, outcome: &str) -> BingoResult<Confirmation> {
        require_owner(actor, player_id)?;
        self.with_player_lock(player_id, || self.confirm_locked(player_id, outcome))
    }

    fn confirm_locked(&self, player_id: &str, outcome: &str) -> BingoResult<Confirmation> {
        let record = self.load_record(player_id)?;
        if !record.card.contains(outcome) {
            return Err(BingoError::NotOnCard {
                player: player_id.to_string(),
                outcome: outcome.to_string(),
            });
        }
        if !load_validated(self.store.as_ref())?.contains(outcome) {
            return Err(BingoError::NotValidated(outcome.to_string()));
        }

        let mut confirmed: OutcomeSet = record.confirmed_events.into_iter().collect();
        let now_confirmed = if confirmed.remove(outcome) {
            false
        } else {
            confirmed.insert(outcome.to_string());
            true
        };

        let values: Vec<Value> = confirmed.iter().map(|o| Value::from(o.as_str())).collect();
        self.store.patch(
            Collection::Players,
            player_id,
            vec![("confirmedEvents".to_string(), FieldPatch::Set(Value::Array(values)))],
        )?;

        let evaluation = evaluate(&record.card, &confirmed);
        log::info!(
            "{} {} '{}' ({} lines)",
            player_id,
            if now_confirmed { "confirmed" } else { "unconfirmed" },
            outcome,
            evaluation.line_count
        );
        Ok(Confirmation {
            confirmed: now_confirmed,
            evaluation,
        })
    }

    /// Player clicked a cell: confirm it if validated, otherwise file a request
    pub fn toggle_outcome(&self, identity: &Identity, outcome: &str) -> BingoResult<ToggleOutcome> {
        let record = self.load_record(&identity.id)?;
        if !record.card.contains(outcome) {
            return Err(BingoError::NotOnCard {
                player: identity.id.clone(),
                outcome: outcome.to_string(),
            });
        }

        if !self.validation.is_validated(outcome)? {
            let requester = identity.name_or(&self.anonymous_name);
            match self.validation.request_confirmation(outcome, requester)? {
                RequestStatus::Pending(request) => return Ok(ToggleOutcome::PendingApproval(request)),
                // Validated between the two reads
                RequestStatus::AlreadyValidated => {}
            }
        }

        let confirmation = self.confirm_for_player(identity, &identity.id, outcome)?;
        Ok(ToggleOutcome::Confirmed(confirmation))
    }

    /// Confirmed outcomes that are no longer validated
    pub fn stale_confirmations(&self, player_id: &str) -> BingoResult<Vec<Outcome>> {
        let session = self.session(player_id)?;
        let validated = load_validated(self.store.as_ref())?;
        Ok(session
            .confirmed_events
            .into_iter()
            .filter(|o| !validated.contains(o))
            .collect())
    }
}
