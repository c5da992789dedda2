//! Live board
//!
//! Keeps a player's card, confirmed outcomes and the validated set in sync
//! with pushed store snapshots. The evaluation is recomputed synchronously on
//! every player snapshot, whether the change came from this process or not.
//! Each snapshot replaces the previous state wholesale.

use std::sync::Arc;

use parking_lot::Mutex;

use bingo_card::{Card, Evaluation, evaluate};
use bingo_core::{BingoResult, Outcome, OutcomeSet};
use bingo_store::{Collection, DocumentStore, Scope, Snapshot, Subscription, VALIDATED_KEY};

use crate::records::{PlayerRecord, ValidatedRecord, decode};
use crate::validation::unvalidated;

/// Point-in-time view of a board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    /// None until the player document exists
    pub card: Option<Card>,
    pub confirmed: OutcomeSet,
    pub validated: OutcomeSet,
    pub evaluation: Evaluation,
    /// Bumped on every applied snapshot
    pub revision: u64,
}

impl BoardState {
    pub fn is_confirmed(&self, outcome: &str) -> bool {
        self.confirmed.contains(outcome)
    }

    pub fn is_validated(&self, outcome: &str) -> bool {
        self.validated.contains(outcome)
    }

    /// Cells on the card still waiting for validation
    pub fn unvalidated_cells(&self) -> Vec<Outcome> {
        match &self.card {
            Some(card) => unvalidated(card.cells(), &self.validated)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    fn apply_player(&mut self, snapshot: &Snapshot, player_id: &str) {
        let doc = match snapshot {
            Snapshot::Document(doc) => doc.clone(),
            Snapshot::Collection(_) => return,
        };

        match doc {
            Some(doc) => match decode::<PlayerRecord>(Collection::Players, player_id, doc) {
                Ok(record) => {
                    self.card = Some(record.card);
                    self.confirmed = record.confirmed_events.into_iter().collect();
                }
                Err(e) => {
                    log::warn!("Ignoring player snapshot: {}", e);
                    return;
                }
            },
            None => {
                self.card = None;
                self.confirmed.clear();
            }
        }

        self.evaluation = match &self.card {
            Some(card) => evaluate(card, &self.confirmed),
            None => Evaluation::default(),
        };
        self.revision += 1;
    }

    fn apply_validated(&mut self, snapshot: &Snapshot) {
        let doc = match snapshot {
            Snapshot::Document(doc) => doc.clone(),
            Snapshot::Collection(_) => return,
        };

        self.validated = match doc {
            Some(doc) => match decode::<ValidatedRecord>(Collection::Validated, VALIDATED_KEY, doc) {
                Ok(record) => record.into_set(),
                Err(e) => {
                    log::warn!("Ignoring validated snapshot: {}", e);
                    return;
                }
            },
            None => OutcomeSet::new(),
        };
        self.revision += 1;
    }
}

/// Listener called with the new state after every applied snapshot
pub type BoardListener = Arc<dyn Fn(&BoardState) + Send + Sync>;

/// Subscribed view of one player's board; dropping it unsubscribes
pub struct LiveBoard {
    player_id: String,
    state: Arc<Mutex<BoardState>>,
    _player_sub: Subscription,
    _validated_sub: Subscription,
}

impl LiveBoard {
    /// Subscribe to a player's document and the validated set
    pub fn attach(store: &dyn DocumentStore, player_id: &str) -> BingoResult<Self> {
        Self::attach_with_listener(store, player_id, None)
    }

    /// Like [`LiveBoard::attach`], also calling `listener` on every update
    pub fn attach_with_listener(
        store: &dyn DocumentStore,
        player_id: &str,
        listener: Option<BoardListener>,
    ) -> BingoResult<Self> {
        let state = Arc::new(Mutex::new(BoardState::default()));

        let player_sub = {
            let state = Arc::clone(&state);
            let listener = listener.clone();
            let id = player_id.to_string();
            store.subscribe(
                Scope::document(Collection::Players, player_id),
                Box::new(move |snapshot| {
                    let view = {
                        let mut state = state.lock();
                        state.apply_player(snapshot, &id);
                        state.clone()
                    };
                    log::debug!("Board {} at revision {}: {} lines", id, view.revision, view.evaluation.line_count);
                    if let Some(listener) = &listener {
                        listener(&view);
                    }
                }),
            )?
        };

        let validated_sub = {
            let state = Arc::clone(&state);
            store.subscribe(
                Scope::document(Collection::Validated, VALIDATED_KEY),
                Box::new(move |snapshot| {
                    let view = {
                        let mut state = state.lock();
                        state.apply_validated(snapshot);
                        state.clone()
                    };
                    if let Some(listener) = &listener {
                        listener(&view);
                    }
                }),
            )?
        };

        Ok(Self {
            player_id: player_id.to_string(),
            state,
            _player_sub: player_sub,
            _validated_sub: validated_sub,
        })
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Latest state
    pub fn state(&self) -> BoardState {
        self.state.lock().clone()
    }

    /// Latest evaluation
    pub fn evaluation(&self) -> Evaluation {
        self.state.lock().evaluation.clone()
    }
}
