//! bingo-core: Shared types, errors and configuration for the bingo game
//!
//! An outcome is a plain string that can appear as a cell on a card. The
//! crate also holds the administrator policy and the config loader used by
//! the other crates.

use std::collections::BTreeSet;

mod config;
mod error;
mod identity;

pub use config::*;
pub use error::*;
pub use identity::*;

/// A single checkable cell value
pub type Outcome = String;

/// An ordered set of outcomes
pub type OutcomeSet = BTreeSet<Outcome>;
