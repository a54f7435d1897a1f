//! Square/piece codec: mapping between domain values and storage labels.
//!
//! Labels come from explicit matches and tables rather than enum names, so
//! a renamed variant cannot silently change what is stored. Encoding is an
//! exhaustive `match`; decoding looks labels up in the tables below, and a
//! test keeps the two directions in step. Bump [`LABEL_TABLE_VERSION`]
//! whenever a label changes.
//!
//! Decoding never falls back to a default: an unknown label is a
//! [`CodecError::MalformedRecord`].

use crate::types::{Piece, PieceKind, Side, Square};

/// Version of the label tables below. Stored alongside compact boards.
pub const LABEL_TABLE_VERSION: u32 = 1;

const PIECE_KIND_LABELS: [(PieceKind, &str); 7] = [
    (PieceKind::Pawn, "PAWN"),
    (PieceKind::Knight, "KNIGHT"),
    (PieceKind::Bishop, "BISHOP"),
    (PieceKind::Rook, "ROOK"),
    (PieceKind::Queen, "QUEEN"),
    (PieceKind::King, "KING"),
    (PieceKind::Blank, "BLANK"),
];

const SIDE_LABELS: [(Side, &str); 3] = [
    (Side::White, "WHITE"),
    (Side::Black, "BLACK"),
    (Side::None, "NONE"),
];

/// Side prefix used by compact piece codes (decoding).
const SIDE_INITIALS: [(Side, char); 2] = [(Side::White, 'W'), (Side::Black, 'B')];

/// Compact code for an empty square.
pub const BLANK_CODE: &str = ".";

/// Errors raised while decoding stored board data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("malformed {field} in stored record: {value:?}")]
    MalformedRecord { field: &'static str, value: String },
    #[error("compact board lists {squares} squares but {pieces} piece codes")]
    ArityMismatch { squares: usize, pieces: usize },
    #[error("invalid board state: {0}")]
    InvalidBoardState(String),
}

impl CodecError {
    pub(crate) fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedRecord {
            field,
            value: value.into(),
        }
    }
}

// ── Square ─────────────────────────────────────────────────────────────

/// Encode a square as its `(square_file, square_rank)` storage key.
pub fn encode_square(square: Square) -> (String, String) {
    (square.file_char().to_string(), square.rank_char().to_string())
}

/// Decode a `(square_file, square_rank)` storage key.
pub fn decode_square(file: &str, rank: &str) -> Result<Square, CodecError> {
    let mut files = file.chars();
    let mut ranks = rank.chars();
    let square = match (files.next(), files.next(), ranks.next(), ranks.next()) {
        (Some(f), None, Some(r), None) => Square::from_chars(f, r),
        _ => None,
    };
    square.ok_or_else(|| CodecError::malformed("square", format!("{file}{rank}")))
}

/// Decode a square label such as `"e4"`.
pub fn decode_square_label(label: &str) -> Result<Square, CodecError> {
    label
        .parse()
        .map_err(|_| CodecError::malformed("square", label))
}

// ── PieceKind / Side ───────────────────────────────────────────────────

pub fn encode_piece_kind(kind: PieceKind) -> &'static str {
    match kind {
        PieceKind::Pawn => "PAWN",
        PieceKind::Knight => "KNIGHT",
        PieceKind::Bishop => "BISHOP",
        PieceKind::Rook => "ROOK",
        PieceKind::Queen => "QUEEN",
        PieceKind::King => "KING",
        PieceKind::Blank => "BLANK",
    }
}

pub fn decode_piece_kind(label: &str) -> Result<PieceKind, CodecError> {
    PIECE_KIND_LABELS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(kind, _)| *kind)
        .ok_or_else(|| CodecError::malformed("piece_type", label))
}

pub fn encode_side(side: Side) -> &'static str {
    match side {
        Side::White => "WHITE",
        Side::Black => "BLACK",
        Side::None => "NONE",
    }
}

pub fn decode_side(label: &str) -> Result<Side, CodecError> {
    SIDE_LABELS
        .iter()
        .find(|(_, l)| *l == label)
        .map(|(side, _)| *side)
        .ok_or_else(|| CodecError::malformed("team", label))
}

/// Decode the `(piece_type, team)` column pair, rejecting invalid pairings.
pub fn decode_piece(piece_type: &str, team: &str) -> Result<Piece, CodecError> {
    let kind = decode_piece_kind(piece_type)?;
    let side = decode_side(team)?;
    Piece::new(kind, side).ok_or_else(|| CodecError::malformed("piece", format!("{piece_type}/{team}")))
}

// ── Compact piece codes ────────────────────────────────────────────────

/// Encode a piece as a compact code: side initial plus piece letter (`"WR"`),
/// or [`BLANK_CODE`] for an empty square.
pub fn encode_piece_label(piece: Piece) -> String {
    if piece.is_blank() {
        return BLANK_CODE.to_string();
    }
    let initial = match piece.side() {
        Side::White => 'W',
        Side::Black => 'B',
        // Only blank pieces have no side.
        Side::None => return BLANK_CODE.to_string(),
    };
    format!("{}{}", initial, piece.kind().to_char_upper())
}

/// Decode a compact piece code produced by [`encode_piece_label`].
pub fn decode_piece_label(code: &str) -> Result<Piece, CodecError> {
    if code == BLANK_CODE {
        return Ok(Piece::BLANK);
    }
    let malformed = || CodecError::malformed("piece_code", code);
    let mut chars = code.chars();
    let (Some(initial), Some(letter), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(malformed());
    };
    let side = SIDE_INITIALS
        .iter()
        .find(|(_, c)| *c == initial)
        .map(|(s, _)| *s)
        .ok_or_else(malformed)?;
    let kind = PieceKind::ALL
        .into_iter()
        .filter(|k| !k.is_blank())
        .find(|k| k.to_char_upper() == letter)
        .ok_or_else(malformed)?;
    Piece::new(kind, side).ok_or_else(malformed)
}
