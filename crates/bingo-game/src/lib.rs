//! # bingo-game — Catalog, validation and player sessions
//!
//! ## Flow
//!
//! ```text
//! EventCatalog ──pool──> SessionManager::open_session ──> PlayerSession
//!                                 │
//!            toggle_outcome ──────┤
//!                                 ├── validated?   confirm_for_player ──> Evaluation
//!                                 └── unvalidated  ValidationWorkflow::request_confirmation
//!                                                        │
//!                                          administrator approve / cancel
//! ```
//!
//! All state lives in a [`bingo_store::DocumentStore`]. Administrators are
//! decided by the allow-list in [`bingo_core::GameConfig`].

pub mod catalog;
pub mod game;
pub mod identity;
pub mod live;
pub mod records;
pub mod session;
pub mod validation;

pub use catalog::*;
pub use game::*;
pub use identity::*;
pub use live::*;
pub use records::*;
pub use session::*;
pub use validation::*;
