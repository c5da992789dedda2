//! Bingo line evaluation

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use bingo_core::Outcome;

use crate::card::{CARD_SIZE, Card};

/// Upper bound on completed lines: 5 rows, 5 columns, 2 diagonals
pub const MAX_LINES: usize = 2 * CARD_SIZE + 2;

/// A line on the card that can be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BingoLine {
    Row(u8),
    Column(u8),
    /// r == c
    MainDiagonal,
    /// r + c == 4
    AntiDiagonal,
}

impl BingoLine {
    /// All lines in evaluation order
    pub fn all() -> impl Iterator<Item = BingoLine> {
        let rows = (0..CARD_SIZE as u8).map(BingoLine::Row);
        let cols = (0..CARD_SIZE as u8).map(BingoLine::Column);
        rows.chain(cols)
            .chain([BingoLine::MainDiagonal, BingoLine::AntiDiagonal])
    }

    /// (row, column) positions covered by this line
    pub fn positions(&self) -> [(usize, usize); CARD_SIZE] {
        std::array::from_fn(|i| match *self {
            BingoLine::Row(r) => (r as usize, i),
            BingoLine::Column(c) => (i, c as usize),
            BingoLine::MainDiagonal => (i, i),
            BingoLine::AntiDiagonal => (i, CARD_SIZE - 1 - i),
        })
    }
}

/// Result of evaluating a card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Number of completed lines (0..=12)
    pub line_count: usize,
    /// At least one line completed
    pub is_bingo: bool,
    /// Completed lines, in evaluation order
    pub lines: Vec<BingoLine>,
}

/// Membership grid: `grid[r][c]` is true when that cell is confirmed
pub fn membership_grid(card: &Card, confirmed: &BTreeSet<Outcome>) -> [[bool; CARD_SIZE]; CARD_SIZE] {
    std::array::from_fn(|r| {
        std::array::from_fn(|c| card.cell(r, c).is_some_and(|v| confirmed.contains(v)))
    })
}

/// Evaluate a card against a set of confirmed outcomes
pub fn evaluate(card: &Card, confirmed: &BTreeSet<Outcome>) -> Evaluation {
    let grid = membership_grid(card, confirmed);

    let lines: Vec<BingoLine> = BingoLine::all()
        .filter(|line| line.positions().iter().all(|&(r, c)| grid[r][c]))
        .collect();

    Evaluation {
        line_count: lines.len(),
        is_bingo: !lines.is_empty(),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::letter_card;

    fn set(values: &[&str]) -> BTreeSet<Outcome> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_line_order() {
        let all: Vec<_> = BingoLine::all().collect();
        assert_eq!(all.len(), MAX_LINES);
        assert_eq!(all[0], BingoLine::Row(0));
        assert_eq!(all[5], BingoLine::Column(0));
        assert_eq!(all[10], BingoLine::MainDiagonal);
        assert_eq!(all[11], BingoLine::AntiDiagonal);
    }

    #[test]
    fn test_empty_confirmed() {
        let result = evaluate(&letter_card(), &BTreeSet::new());
        assert_eq!(result, Evaluation::default());
    }

    #[test]
    fn test_first_row() {
        let result = evaluate(&letter_card(), &set(&["A", "B", "C", "D", "E"]));
        assert_eq!(result.line_count, 1);
        assert!(result.is_bingo);
        assert_eq!(result.lines, vec![BingoLine::Row(0)]);
    }

    #[test]
    fn test_row_and_column() {
        let confirmed = set(&["A", "B", "C", "D", "E", "F", "K", "P", "U"]);
        let result = evaluate(&letter_card(), &confirmed);
        assert_eq!(result.line_count, 2);
        assert_eq!(result.lines, vec![BingoLine::Row(0), BingoLine::Column(0)]);
    }

    #[test]
    fn test_diagonals() {
        let main = evaluate(&letter_card(), &set(&["A", "G", "M", "S", "Y"]));
        assert_eq!(main.lines, vec![BingoLine::MainDiagonal]);

        let anti = evaluate(&letter_card(), &set(&["E", "I", "M", "Q", "U"]));
        assert_eq!(anti.lines, vec![BingoLine::AntiDiagonal]);
    }

    #[test]
    fn test_four_of_five_is_not_a_line() {
        let result = evaluate(&letter_card(), &set(&["A", "B", "C", "D"]));
        assert_eq!(result.line_count, 0);
        assert!(!result.is_bingo);
    }

    #[test]
    fn test_full_card_hits_every_line() {
        let card = letter_card();
        let confirmed: BTreeSet<_> = card.cells().iter().cloned().collect();
        let result = evaluate(&card, &confirmed);
        assert_eq!(result.line_count, MAX_LINES);
    }

    #[test]
    fn test_outcomes_off_card_are_ignored() {
        let result = evaluate(&letter_card(), &set(&["Z", "ZZ"]));
        assert_eq!(result.line_count, 0);
    }

    #[test]
    fn test_idempotent_and_monotonic() {
        let card = letter_card();
        let mut confirmed = BTreeSet::new();
        let mut previous = evaluate(&card, &confirmed);

        // Add cells in a scrambled but fixed order
        for i in [12usize, 0, 24, 6, 18, 4, 20, 8, 16, 1, 2, 3, 5, 10, 15, 7, 9, 11, 13, 14, 17, 19, 21, 22, 23] {
            confirmed.insert(card.cells()[i].clone());
            let current = evaluate(&card, &confirmed);
            assert_eq!(current, evaluate(&card, &confirmed));
            assert!(current.line_count >= previous.line_count);
            assert!(current.line_count <= MAX_LINES);
            previous = current;
        }
        assert_eq!(previous.line_count, MAX_LINES);
    }

    #[test]
    fn test_membership_grid() {
        let grid = membership_grid(&letter_card(), &set(&["A", "Y"]));
        assert!(grid[0][0]);
        assert!(grid[4][4]);
        assert_eq!(grid.iter().flatten().filter(|&&b| b).count(), 2);
    }
}
