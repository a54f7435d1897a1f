//! In-memory board: a mapping from square to occupant.
//!
//! A board may list every square (blank entries included) or only the
//! occupied ones. The two forms are equivalent: an absent square reads as
//! [`Piece::BLANK`]. Use [`Board::agrees_with`] to compare boards across forms.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Piece, Square, SQUARE_COUNT};

/// A piece together with the square it was recorded on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PlacedPiece {
    pub square: Square,
    pub piece: Piece,
}

impl PlacedPiece {
    pub fn new(square: Square, piece: Piece) -> Self {
        Self { square, piece }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
    squares: BTreeMap<Square, Piece>,
}

impl Board {
    /// An empty board with no entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chess starting layout, occupied squares only.
    pub fn standard() -> Self {
        let position = cozy_chess::Board::default();
        let mut board = Self::new();
        for sq in cozy_chess::Square::ALL {
            if let (Some(piece), Some(color)) = (position.piece_on(sq), position.color_on(sq)) {
                board.place(sq.into(), Piece::from((piece, color)));
            }
        }
        board
    }

    /// Set the occupant of a square, returning the previous entry if any.
    pub fn place(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        self.squares.insert(square, piece)
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        self.squares.remove(&square)
    }

    /// The stored entry for a square, without blank-filling.
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.squares.get(&square).copied()
    }

    /// The occupant of a square; absent squares read as blank.
    pub fn occupant(&self, square: Square) -> Piece {
        self.get(square).unwrap_or(Piece::BLANK)
    }

    /// Number of entries, blank entries included.
    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// True when every square on the board has an entry.
    pub fn is_complete(&self) -> bool {
        self.squares.len() == SQUARE_COUNT
    }

    /// Entries in square order.
    pub fn iter(&self) -> impl Iterator<Item = PlacedPiece> + '_ {
        self.squares
            .iter()
            .map(|(square, piece)| PlacedPiece::new(*square, *piece))
    }

    /// Non-blank entries in square order.
    pub fn occupied(&self) -> impl Iterator<Item = PlacedPiece> + '_ {
        self.iter().filter(|placed| !placed.piece.is_blank())
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// Same position with an explicit entry for every square.
    pub fn filled(&self) -> Self {
        Self {
            squares: Square::all().map(|sq| (sq, self.occupant(sq))).collect(),
        }
    }

    /// Same position with blank entries dropped.
    pub fn without_blanks(&self) -> Self {
        Self {
            squares: self.occupied().map(|p| (p.square, p.piece)).collect(),
        }
    }

    /// True when both boards have the same occupant on every square.
    pub fn agrees_with(&self, other: &Board) -> bool {
        Square::all().all(|sq| self.occupant(sq) == other.occupant(sq))
    }
}

impl FromIterator<PlacedPiece> for Board {
    fn from_iter<I: IntoIterator<Item = PlacedPiece>>(iter: I) -> Self {
        Self {
            squares: iter.into_iter().map(|p| (p.square, p.piece)).collect(),
        }
    }
}
