//! Board serializers for the two storage schemes.
//!
//! - **Compact**: two parallel comma-delimited lists, occupied squares only.
//!   A whole-board rewrite is needed for every change.
//! - **Normalized**: one row per square (blank squares included), which
//!   allows point updates of a single square.
//!
//! Both decode to [`Board`]; an absent square in the compact form is
//! equivalent to a `(BLANK, NONE)` row in the normalized form.

use std::collections::HashSet;

use crate::board::{Board, PlacedPiece};
use crate::codec::{self, CodecError};
use crate::types::{Square, SQUARE_COUNT};

/// Delimiter between entries of a compact list.
pub const DELIMITER: char = ',';

/// The compact encoding of a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactBoard {
    /// Square labels, e.g. `"a1,b1,c1"`.
    pub squares: String,
    /// Piece codes in the same order, e.g. `"WR,WN,WB"`.
    pub pieces: String,
}

/// One normalized storage row, with every column as its stored label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceRow {
    pub square_file: String,
    pub square_rank: String,
    pub team: String,
    pub piece_type: String,
}

impl From<PlacedPiece> for PieceRow {
    fn from(placed: PlacedPiece) -> Self {
        let (square_file, square_rank) = codec::encode_square(placed.square);
        Self {
            square_file,
            square_rank,
            team: codec::encode_side(placed.piece.side()).to_string(),
            piece_type: codec::encode_piece_kind(placed.piece.kind()).to_string(),
        }
    }
}

impl PieceRow {
    pub fn decode(&self) -> Result<PlacedPiece, CodecError> {
        let square = codec::decode_square(&self.square_file, &self.square_rank)?;
        let piece = codec::decode_piece(&self.piece_type, &self.team)?;
        Ok(PlacedPiece::new(square, piece))
    }
}

// ── Compact ────────────────────────────────────────────────────────────

/// Encode the occupied squares of `board` in square order.
pub fn encode_compact(board: &Board) -> CompactBoard {
    let (squares, pieces): (Vec<String>, Vec<String>) = board
        .occupied()
        .map(|p| (p.square.to_string(), codec::encode_piece_label(p.piece)))
        .unzip();
    let delimiter = DELIMITER.to_string();
    CompactBoard {
        squares: squares.join(&delimiter),
        pieces: pieces.join(&delimiter),
    }
}

/// Zip the two lists positionally back into a board.
pub fn decode_compact(squares: &str, pieces: &str) -> Result<Board, CodecError> {
    let squares = split_list(squares);
    let pieces = split_list(pieces);
    if squares.len() != pieces.len() {
        return Err(CodecError::ArityMismatch {
            squares: squares.len(),
            pieces: pieces.len(),
        });
    }

    let mut board = Board::new();
    for (label, code) in squares.into_iter().zip(pieces) {
        let square = codec::decode_square_label(label)?;
        let piece = codec::decode_piece_label(code)?;
        if board.place(square, piece).is_some() {
            return Err(CodecError::InvalidBoardState(format!(
                "square {square} listed twice"
            )));
        }
    }
    Ok(board)
}

fn split_list(list: &str) -> Vec<&str> {
    if list.is_empty() {
        Vec::new()
    } else {
        list.split(DELIMITER).collect()
    }
}

// ── Normalized ─────────────────────────────────────────────────────────

/// Encode one row per square on the board, blank-filling absent squares.
pub fn encode_normalized(board: &Board) -> Vec<PieceRow> {
    Square::all()
        .map(|sq| PieceRow::from(PlacedPiece::new(sq, board.occupant(sq))))
        .collect()
}

/// Decode a full set of rows. Every square must appear exactly once.
pub fn decode_normalized(rows: &[PieceRow]) -> Result<Board, CodecError> {
    let mut board = Board::new();
    for row in rows {
        let placed = row.decode()?;
        if board.place(placed.square, placed.piece).is_some() {
            return Err(CodecError::InvalidBoardState(format!(
                "duplicate row for square {}",
                placed.square
            )));
        }
    }

    if !board.is_complete() {
        let present: HashSet<Square> = board.iter().map(|p| p.square).collect();
        let missing: Vec<String> = Square::all()
            .filter(|sq| !present.contains(sq))
            .map(|sq| sq.to_string())
            .collect();
        return Err(CodecError::InvalidBoardState(format!(
            "expected {} rows, got {}; missing {}",
            SQUARE_COUNT,
            rows.len(),
            missing.join(" ")
        )));
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Piece, PieceKind, Side};
    use proptest::prelude::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn compact_standard_board() {
        let compact = encode_compact(&Board::standard());
        assert_eq!(compact.squares.split(DELIMITER).count(), 32);
        assert!(compact.squares.starts_with("a1,b1,c1"));
        assert!(compact.pieces.starts_with("WR,WN,WB,WQ,WK"));
        let decoded = decode_compact(&compact.squares, &compact.pieces).unwrap();
        assert_eq!(decoded, Board::standard());
    }

    #[test]
    fn compact_arity_mismatch() {
        let err = decode_compact("a1,b1,c1", "WR,WN").unwrap_err();
        assert_eq!(err, CodecError::ArityMismatch { squares: 3, pieces: 2 });
    }

    #[test]
    fn compact_empty_board() {
        let compact = encode_compact(&Board::new());
        assert_eq!(compact.squares, "");
        assert_eq!(compact.pieces, "");
        assert!(decode_compact("", "").unwrap().is_empty());
    }

    #[test]
    fn compact_rejects_duplicates_and_bad_codes() {
        assert!(matches!(
            decode_compact("a1,a1", "WR,WN"),
            Err(CodecError::InvalidBoardState(_))
        ));
        assert!(matches!(
            decode_compact("a1", "XX"),
            Err(CodecError::MalformedRecord { .. })
        ));
        assert!(matches!(
            decode_compact("z9", "WR"),
            Err(CodecError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn normalized_has_row_per_square() {
        let rows = encode_normalized(&Board::standard());
        assert_eq!(rows.len(), SQUARE_COUNT);
        let blank_rows = rows.iter().filter(|r| r.piece_type == "BLANK").count();
        assert_eq!(blank_rows, 32);
        assert!(rows
            .iter()
            .filter(|r| r.piece_type == "BLANK")
            .all(|r| r.team == "NONE"));
    }

    #[test]
    fn normalized_rejects_missing_square() {
        let mut rows = encode_normalized(&Board::standard());
        rows.pop();
        let err = decode_normalized(&rows).unwrap_err();
        assert!(matches!(err, CodecError::InvalidBoardState(ref msg) if msg.contains("h8")));
    }

    #[test]
    fn normalized_rejects_duplicate_square() {
        let mut rows = encode_normalized(&Board::standard());
        let dup = rows[0].clone();
        rows[1] = dup;
        assert!(matches!(
            decode_normalized(&rows),
            Err(CodecError::InvalidBoardState(_))
        ));
    }

    #[test]
    fn normalized_rejects_bad_label() {
        let mut rows = encode_normalized(&Board::standard());
        rows[0].piece_type = "Rook".to_string();
        assert!(matches!(
            decode_normalized(&rows),
            Err(CodecError::MalformedRecord { field: "piece_type", .. })
        ));
    }

    #[test]
    fn blank_entry_in_compact_list_is_equivalent_to_absence() {
        let board = decode_compact("a1,a2", "WR,.").unwrap();
        assert_eq!(board.occupant(sq("a2")), Piece::BLANK);
        assert!(board.agrees_with(&decode_compact("a1", "WR").unwrap()));
    }

    fn square_strategy() -> impl Strategy<Value = Square> {
        (0u8..8, 0u8..8).prop_map(|(file, rank)| Square::new(file, rank).unwrap())
    }

    fn piece_strategy() -> impl Strategy<Value = Piece> {
        let kinds = prop::sample::select(
            PieceKind::ALL
                .into_iter()
                .filter(|k| !k.is_blank())
                .collect::<Vec<_>>(),
        );
        let sides = prop::sample::select(vec![Side::White, Side::Black]);
        prop_oneof![
            1 => Just(Piece::BLANK),
            3 => (kinds, sides).prop_map(|(k, s)| Piece::new(k, s).unwrap()),
        ]
    }

    fn board_strategy() -> impl Strategy<Value = Board> {
        prop::collection::vec((square_strategy(), piece_strategy()), 0..64).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(square, piece)| PlacedPiece::new(square, piece))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn normalized_roundtrip(board in board_strategy()) {
            let decoded = decode_normalized(&encode_normalized(&board)).unwrap();
            prop_assert_eq!(&decoded, &board.filled());
            prop_assert_eq!(decode_normalized(&encode_normalized(&decoded)).unwrap(), decoded);
        }

        #[test]
        fn compact_roundtrip_on_occupied_squares(board in board_strategy()) {
            let compact = encode_compact(&board);
            let decoded = decode_compact(&compact.squares, &compact.pieces).unwrap();
            prop_assert_eq!(decoded, board.without_blanks());
        }

        #[test]
        fn schemes_are_equivalent(board in board_strategy()) {
            let compact = encode_compact(&board);
            let from_compact = decode_compact(&compact.squares, &compact.pieces).unwrap();
            let from_rows = decode_normalized(&encode_normalized(&board)).unwrap();
            prop_assert!(from_compact.agrees_with(&from_rows));
            prop_assert!(from_rows.agrees_with(&board));
        }
    }
}
