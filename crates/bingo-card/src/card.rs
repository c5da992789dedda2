//! The 5×5 bingo card

use serde::{Deserialize, Serialize};

use bingo_core::{BingoError, Outcome};

/// Cells per row and per column
pub const CARD_SIZE: usize = 5;

/// Total cells on a card
pub const CARD_CELLS: usize = CARD_SIZE * CARD_SIZE;

/// A player's fixed grid of outcomes, stored row-major
///
/// Serializes as the flat list of 25 cells, which is how cards are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Outcome>", into = "Vec<Outcome>")]
pub struct Card {
    cells: Vec<Outcome>,
}

impl Card {
    /// Build from a flat row-major list of exactly 25 distinct cells
    pub fn from_flat(cells: Vec<Outcome>) -> Result<Self, BingoError> {
        if cells.len() != CARD_CELLS {
            return Err(BingoError::InvalidCard(format!(
                "expected {} cells, got {}",
                CARD_CELLS,
                cells.len()
            )));
        }
        for (i, cell) in cells.iter().enumerate() {
            if cells[..i].contains(cell) {
                return Err(BingoError::InvalidCard(format!("duplicate cell '{}'", cell)));
            }
        }
        Ok(Self { cells })
    }

    /// Build from five rows of five cells
    pub fn from_rows(rows: [[&str; CARD_SIZE]; CARD_SIZE]) -> Result<Self, BingoError> {
        let cells = rows
            .iter()
            .flat_map(|row| row.iter().map(|s| s.to_string()))
            .collect();
        Self::from_flat(cells)
    }

    /// Cell at (row, column), None when out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<&Outcome> {
        if row >= CARD_SIZE || col >= CARD_SIZE {
            return None;
        }
        self.cells.get(row * CARD_SIZE + col)
    }

    /// One row as a slice; indices past the last row are clamped
    pub fn row(&self, row: usize) -> &[Outcome] {
        let start = row.min(CARD_SIZE - 1) * CARD_SIZE;
        &self.cells[start..start + CARD_SIZE]
    }

    /// Rows as owned vectors (the 2-D view)
    pub fn rows(&self) -> Vec<Vec<Outcome>> {
        self.cells.chunks(CARD_SIZE).map(|r| r.to_vec()).collect()
    }

    /// Flat row-major cells
    pub fn cells(&self) -> &[Outcome] {
        &self.cells
    }

    /// Check if an outcome appears on this card
    pub fn contains(&self, outcome: &str) -> bool {
        self.cells.iter().any(|c| c == outcome)
    }

    /// Position of an outcome as (row, column)
    pub fn position_of(&self, outcome: &str) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|c| c == outcome)
            .map(|i| (i / CARD_SIZE, i % CARD_SIZE))
    }
}

impl TryFrom<Vec<Outcome>> for Card {
    type Error = BingoError;

    fn try_from(cells: Vec<Outcome>) -> Result<Self, Self::Error> {
        Self::from_flat(cells)
    }
}

impl From<Card> for Vec<Outcome> {
    fn from(card: Card) -> Self {
        card.cells
    }
}

#[cfg(test)]
pub(crate) fn letter_card() -> Card {
    Card::from_rows([
        ["A", "B", "C", "D", "E"],
        ["F", "G", "H", "I", "J"],
        ["K", "L", "M", "N", "O"],
        ["P", "Q", "R", "S", "T"],
        ["U", "V", "W", "X", "Y"],
    ])
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_row_major() {
        let card = letter_card();
        assert_eq!(card.row(0), ["A", "B", "C", "D", "E"]);
        assert_eq!(card.rows()[4], vec!["U", "V", "W", "X", "Y"]);
        assert_eq!(card.cell(2, 3).map(String::as_str), Some("N"));
        assert_eq!(card.cell(5, 0), None);
        assert_eq!(card.position_of("S"), Some((3, 3)));
    }

    #[test]
    fn test_wrong_size_rejected() {
        let err = Card::from_flat(vec!["A".to_string(); 3]).unwrap_err();
        assert!(matches!(err, BingoError::InvalidCard(_)));
    }

    #[test]
    fn test_duplicate_cell_rejected() {
        let mut cells: Vec<String> = (0..CARD_CELLS).map(|i| format!("o{}", i)).collect();
        cells[24] = "o0".into();
        assert!(Card::from_flat(cells).is_err());
    }

    #[test]
    fn test_serializes_flat() {
        let card = letter_card();
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json.as_array().map(|a| a.len()), Some(CARD_CELLS));
        assert_eq!(json[6], "G");

        let short: Result<Card, _> = serde_json::from_str(r#"["A","B"]"#);
        assert!(short.is_err());
    }
}
