//! Canonical square, piece and side types for the project.
//! cozy-chess types are only used to derive the standard layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of files (columns) on the board.
pub const FILES: u8 = 8;
/// Number of ranks (rows) on the board.
pub const RANKS: u8 = 8;
/// Total number of squares on the board.
pub const SQUARE_COUNT: usize = (FILES as usize) * (RANKS as usize);

/// Kind of occupant on a square. `Blank` means "no piece".
///
/// Serialized with the canonical storage names (`"ROOK"`, `"BLANK"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
    Blank,
}

/// Side owning a piece, or the side to move.
///
/// `None` pairs only with [`PieceKind::Blank`], or marks a finished game's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    White,
    Black,
    None,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
        Self::Blank,
    ];

    pub fn is_blank(self) -> bool {
        self == Self::Blank
    }

    pub fn to_char_upper(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
            Self::Blank => '.',
        }
    }
}

impl Side {
    /// The side that moves after this one. `None` stays `None`.
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
            Self::None => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::None => "none",
        }
    }
}

impl From<cozy_chess::Piece> for PieceKind {
    fn from(p: cozy_chess::Piece) -> Self {
        match p {
            cozy_chess::Piece::Pawn => Self::Pawn,
            cozy_chess::Piece::Knight => Self::Knight,
            cozy_chess::Piece::Bishop => Self::Bishop,
            cozy_chess::Piece::Rook => Self::Rook,
            cozy_chess::Piece::Queen => Self::Queen,
            cozy_chess::Piece::King => Self::King,
        }
    }
}

impl From<cozy_chess::Color> for Side {
    fn from(c: cozy_chess::Color) -> Self {
        match c {
            cozy_chess::Color::White => Self::White,
            cozy_chess::Color::Black => Self::Black,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char_upper())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single grid coordinate. Ordered rank-major (a1, b1, ..., h1, a2, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    /// Build a square from zero-based file and rank indices.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < FILES && rank < RANKS).then_some(Self { rank, file })
    }

    /// Build a square from its file letter (`a`..`h`) and rank digit (`1`..`8`).
    pub fn from_chars(file: char, rank: char) -> Option<Self> {
        if !file.is_ascii_lowercase() || !rank.is_ascii_digit() {
            return None;
        }
        let file = (file as u8).checked_sub(b'a')?;
        let rank = (rank as u8).checked_sub(b'1')?;
        Self::new(file, rank)
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }

    /// Every square on the board in rank-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..RANKS).flat_map(|rank| (0..FILES).map(move |file| Square { rank, file }))
    }
}

impl From<cozy_chess::Square> for Square {
    fn from(sq: cozy_chess::Square) -> Self {
        let index = sq as u8;
        Self {
            rank: index / FILES,
            file: index % FILES,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a square on the board: {0:?}")]
pub struct ParseSquareError(pub String);

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => {
                Self::from_chars(file, rank).ok_or_else(|| ParseSquareError(s.to_string()))
            }
            _ => Err(ParseSquareError(s.to_string())),
        }
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> Self {
        sq.to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = ParseSquareError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Occupant of a square: a piece kind together with its side.
///
/// Only two shapes are valid: `(Blank, None)` and a real piece owned by
/// white or black. Serialize-only: a `Piece` is built through [`Piece::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Piece {
    kind: PieceKind,
    side: Side,
}

impl Piece {
    pub const BLANK: Piece = Piece {
        kind: PieceKind::Blank,
        side: Side::None,
    };

    /// Returns `None` for mismatched pairs such as `(Rook, None)` or `(Blank, White)`.
    pub fn new(kind: PieceKind, side: Side) -> Option<Self> {
        match (kind.is_blank(), side) {
            (true, Side::None) => Some(Self::BLANK),
            (false, Side::White | Side::Black) => Some(Self { kind, side }),
            _ => None,
        }
    }

    pub fn kind(self) -> PieceKind {
        self.kind
    }

    pub fn side(self) -> Side {
        self.side
    }

    pub fn is_blank(self) -> bool {
        self.kind.is_blank()
    }
}

impl From<(cozy_chess::Piece, cozy_chess::Color)> for Piece {
    fn from((piece, color): (cozy_chess::Piece, cozy_chess::Color)) -> Self {
        Self {
            kind: piece.into(),
            side: color.into(),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_blank() {
            write!(f, "blank")
        } else {
            write!(f, "{} {:?}", self.side, self.kind)
        }
    }
}
