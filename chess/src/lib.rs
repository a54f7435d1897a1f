//! Board-state domain types and their storage encodings.
//!
//! Pure code only: this crate never touches storage. The persistence layer
//! lives in `chess-store`.

pub mod board;
pub mod codec;
pub mod serializer;
pub mod types;

pub use board::{Board, PlacedPiece};
pub use codec::{CodecError, LABEL_TABLE_VERSION};
pub use serializer::{CompactBoard, PieceRow};
pub use types::{ParseSquareError, Piece, PieceKind, Side, Square};
