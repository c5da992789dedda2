//! Game facade
//!
//! Wires catalog, validation and sessions to one store and one config.

use std::sync::Arc;

use bingo_card::CardGenerator;
use bingo_core::{AdminPolicy, BingoResult, GameConfig, Identity};
use bingo_store::DocumentStore;

use crate::catalog::EventCatalog;
use crate::identity::IdentityProvider;
use crate::live::{BoardListener, LiveBoard};
use crate::session::{PlayerSession, SessionManager};
use crate::validation::ValidationWorkflow;

/// Everything a client needs to play or administer a game
pub struct BingoGame {
    store: Arc<dyn DocumentStore>,
    config: GameConfig,
    policy: AdminPolicy,
    catalog: Arc<EventCatalog>,
    validation: Arc<ValidationWorkflow>,
    sessions: SessionManager,
}

impl BingoGame {
    pub fn new(store: Arc<dyn DocumentStore>, config: GameConfig) -> Self {
        let policy = config.admin_policy();
        let catalog = Arc::new(EventCatalog::new(Arc::clone(&store), policy.clone()));
        let validation = Arc::new(
            ValidationWorkflow::new(Arc::clone(&store), policy.clone())
                .with_strict_requests(config.strict_requests),
        );
        let sessions = SessionManager::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::clone(&validation),
            CardGenerator::new(config.card_seed),
            config.anonymous_name.clone(),
        );

        log::info!(
            "Bingo game ready ({} administrators, seeded: {})",
            policy.len(),
            config.card_seed.is_some()
        );

        Self {
            store,
            config,
            policy,
            catalog,
            validation,
            sessions,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn validation(&self) -> &ValidationWorkflow {
        &self.validation
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.policy.is_admin_identity(identity)
    }

    /// Session of whoever is signed in, None when signed out
    pub fn current_session(&self, provider: &dyn IdentityProvider) -> BingoResult<Option<PlayerSession>> {
        match provider.current_identity() {
            Some(identity) => self.sessions.open_session(&identity).map(Some),
            None => Ok(None),
        }
    }

    /// Live view of a player's board
    pub fn live_board(&self, player_id: &str, listener: Option<BoardListener>) -> BingoResult<LiveBoard> {
        LiveBoard::attach_with_listener(self.store.as_ref(), player_id, listener)
    }
}
