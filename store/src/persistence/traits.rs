//! Async repository trait definitions for the persistence layer.
//!
//! Each trait abstracts over one storage concern so that callers such as
//! [`crate::assembly::GameAssembler`] stay generic over the backend (static
//! dispatch). [`BoardStore`] in particular has two interchangeable
//! implementations: the normalized per-square rows and the compact lists.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` and can be driven from `tokio::spawn`.

use super::{GameId, GameRecord, Member, MemberId, NewGame, StoreError};
use chess::{Board, Piece, PlacedPiece, Square};
use std::future::Future;

/// Whole-board persistence for a game, independent of the storage scheme.
pub trait BoardStore: Send + Sync {
    /// Replace whatever board is stored for the game.
    fn save_board(
        &self,
        game_id: GameId,
        board: &Board,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Fails with [`StoreError::BoardNotFound`] when nothing is stored.
    fn load_board(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<Board, StoreError>> + Send;
    fn delete_board(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Per-square piece rows for a game (normalized scheme).
pub trait PieceRepository: Send + Sync {
    /// Write one row. A row already present at the same square is overwritten.
    fn save(
        &self,
        game_id: GameId,
        piece: PlacedPiece,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Remove every row of the game, returning how many were removed.
    fn delete_all(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
    fn find_board(
        &self,
        game_id: GameId,
    ) -> impl Future<Output = Result<Board, StoreError>> + Send;
    /// Look up a square by its label (`"e4"`). Labels off the board are
    /// [`StoreError::SquareNotFound`], same as a missing row.
    fn find_piece(
        &self,
        game_id: GameId,
        square: &str,
    ) -> impl Future<Output = Result<PlacedPiece, StoreError>> + Send;
    /// Overwrite the occupant of exactly one row.
    fn update_square(
        &self,
        game_id: GameId,
        square: Square,
        piece: Piece,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Game metadata rows.
pub trait GameRepository: Send + Sync {
    /// Insert a game with `turn = WHITE`; the board is seeded separately.
    fn create(&self, game: &NewGame) -> impl Future<Output = Result<GameId, StoreError>> + Send;
    fn find_by_id(&self, id: GameId)
        -> impl Future<Output = Result<GameRecord, StoreError>> + Send;
    fn find_all(&self) -> impl Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;
    /// Finished games (`turn == NONE`) in which the member played either side.
    fn find_completed_by_participant(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = Result<Vec<GameRecord>, StoreError>> + Send;
    fn update_turn(
        &self,
        id: GameId,
        turn: chess::Side,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Set `turn = NONE`. Calling it again is a no-op.
    fn terminate(&self, id: GameId) -> impl Future<Output = Result<(), StoreError>> + Send;
    /// Remove the game row together with all of its board state (piece rows
    /// and any compact board row).
    fn delete(&self, id: GameId) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Lookup of participant identities, owned outside this crate.
pub trait MemberResolver: Send + Sync {
    fn find_by_id(
        &self,
        id: MemberId,
    ) -> impl Future<Output = Result<Option<Member>, StoreError>> + Send;
}
