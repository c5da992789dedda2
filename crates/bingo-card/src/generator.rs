//! Card generation from the pooled catalog outcomes

use std::collections::HashSet;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use bingo_core::{BingoError, BingoResult, Outcome};

use crate::card::{CARD_CELLS, Card};

/// Draws 25 distinct outcomes uniformly at random and lays them out row-major
pub struct CardGenerator {
    rng: ChaCha8Rng,
}

impl CardGenerator {
    /// Create a generator with optional seed
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self { rng }
    }

    /// Deterministic generator for reproducible cards
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Reseed in place
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Generate a card from a pool of candidate outcomes
    ///
    /// Duplicates in the pool collapse to one candidate. Fails with
    /// `InsufficientPool` when fewer than 25 distinct values remain.
    pub fn generate(&mut self, pool: &[Outcome]) -> BingoResult<Card> {
        let mut candidates = distinct(pool);
        if candidates.len() < CARD_CELLS {
            return Err(BingoError::InsufficientPool {
                available: candidates.len(),
                required: CARD_CELLS,
            });
        }

        // Fisher-Yates, then keep the first 25
        candidates.shuffle(&mut self.rng);
        candidates.truncate(CARD_CELLS);

        log::debug!("Generated card from pool of {} outcomes", pool.len());
        Card::from_flat(candidates)
    }
}

impl Default for CardGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Distinct values in first-seen order
fn distinct(pool: &[Outcome]) -> Vec<Outcome> {
    let mut seen = HashSet::with_capacity(pool.len());
    pool.iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}
