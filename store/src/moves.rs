//! Move application: rewrite two squares and flip the turn, atomically.
//!
//! Legality is checked upstream. This layer only guarantees that a move is
//! all-or-nothing and that two racing moves for the same game cannot both
//! commit: the mover must be the side whose turn is stored, and the turn is
//! flipped with a compare-and-swap inside the same transaction as the piece
//! writes.

use chess::{Piece, PlacedPiece, Side, Square};
use sqlx::SqlitePool;
use tracing::Instrument;

use crate::persistence::sqlite::{game_repo, piece_repo};
use crate::persistence::{GameId, StoreError};

/// What a committed move changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The moved piece at its destination.
    pub moved: PlacedPiece,
    /// Previous occupant of the destination; blank when nothing was captured.
    pub replaced: Piece,
    /// Side to move after this one.
    pub next_turn: Side,
}

/// Applies moves against the normalized piece rows.
#[derive(Clone)]
pub struct MoveApplier {
    pool: SqlitePool,
}

impl MoveApplier {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Move whatever occupies `from` onto `to` and hand the turn over.
    ///
    /// Fails with [`StoreError::SquareNotFound`] if `from` is off the board,
    /// has no row, or is empty, and with [`StoreError::TurnConflict`] if the
    /// piece does not belong to the side to move (including a concurrent move
    /// that committed first). On any error the stored game is left unchanged.
    pub async fn apply(&self, game_id: GameId, from: &str, to: &str) -> Result<MoveOutcome, StoreError> {
        let span = tracing::info_span!("move", game_id, from, to);
        self.apply_inner(game_id, from, to).instrument(span).await
    }

    async fn apply_inner(&self, game_id: GameId, from: &str, to: &str) -> Result<MoveOutcome, StoreError> {
        let from_sq = parse_square(game_id, from)?;
        let to_sq = parse_square(game_id, to)?;
        if from_sq == to_sq {
            return Err(StoreError::SameSquare(from.to_string()));
        }

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let game = game_repo::fetch_game(&mut tx, game_id)
            .await?
            .ok_or(StoreError::GameNotFound(game_id))?;
        if game.is_finished() {
            return Err(StoreError::GameFinished(game_id));
        }

        // 1. Locate
        let source = piece_repo::fetch_piece(&mut tx, game_id, from_sq)
            .await?
            .filter(|placed| !placed.piece.is_blank())
            .ok_or_else(|| StoreError::SquareNotFound {
                game_id,
                square: from.to_string(),
            })?;
        let mover = source.piece.side();
        if mover != game.turn {
            tracing::warn!(expected = %game.turn, found = %mover, "move out of turn");
            return Err(StoreError::TurnConflict {
                game_id,
                expected: game.turn,
                found: mover,
            });
        }
        let target = piece_repo::fetch_piece(&mut tx, game_id, to_sq)
            .await?
            .ok_or_else(|| StoreError::SquareNotFound {
                game_id,
                square: to.to_string(),
            })?;

        // 2. Write destination, 3. clear source
        piece_repo::set_occupant(&mut tx, game_id, to_sq, source.piece).await?;
        piece_repo::set_occupant(&mut tx, game_id, from_sq, Piece::BLANK).await?;

        // 4. Flip turn, only if nobody else did in the meantime
        let next_turn = mover.opposite();
        if game_repo::swap_turn(&mut tx, game_id, mover, next_turn).await? != 1 {
            let current = game_repo::fetch_game(&mut tx, game_id)
                .await?
                .map(|g| g.turn)
                .unwrap_or(Side::None);
            tracing::warn!(expected = %mover, found = %current, "turn changed during move");
            return Err(StoreError::TurnConflict {
                game_id,
                expected: current,
                found: mover,
            });
        }

        tx.commit().await?;

        tracing::info!(piece = %source.piece, next = %next_turn, "move applied");
        Ok(MoveOutcome {
            moved: PlacedPiece::new(to_sq, source.piece),
            replaced: target.piece,
            next_turn,
        })
    }
}

fn parse_square(game_id: GameId, label: &str) -> Result<Square, StoreError> {
    label.parse().map_err(|_| StoreError::SquareNotFound {
        game_id,
        square: label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::{Database, SqliteGameRepository, SqlitePieceRepository};
    use crate::persistence::traits::{BoardStore, GameRepository, PieceRepository};
    use crate::persistence::NewGame;
    use chess::{Board, PieceKind};

    struct Fixture {
        _db: Database,
        games: SqliteGameRepository,
        pieces: SqlitePieceRepository,
        applier: MoveApplier,
        game_id: GameId,
    }

    async fn fixture() -> Fixture {
        let db = Database::new_in_memory().await.unwrap();
        let pool = db.pool().clone();
        let games = SqliteGameRepository::new(pool.clone());
        let pieces = SqlitePieceRepository::new(pool.clone());
        let game_id = games
            .create(&NewGame {
                title: "moves".to_string(),
                password: String::new(),
                white_id: 1,
                black_id: 2,
            })
            .await
            .unwrap();
        pieces.save_board(game_id, &Board::standard()).await.unwrap();
        Fixture {
            _db: db,
            games,
            pieces,
            applier: MoveApplier::new(pool),
            game_id,
        }
    }

    fn piece(kind: PieceKind, side: Side) -> Piece {
        Piece::new(kind, side).unwrap()
    }

    #[tokio::test]
    async fn test_move_rewrites_both_squares_and_flips_turn() {
        let f = fixture().await;
        let outcome = f.applier.apply(f.game_id, "a1", "a3").await.unwrap();

        assert_eq!(outcome.moved.piece, piece(PieceKind::Rook, Side::White));
        assert_eq!(outcome.replaced, Piece::BLANK);
        assert_eq!(outcome.next_turn, Side::Black);

        let from = f.pieces.find_piece(f.game_id, "a1").await.unwrap();
        let to = f.pieces.find_piece(f.game_id, "a3").await.unwrap();
        assert_eq!(from.piece, Piece::BLANK);
        assert_eq!(to.piece, piece(PieceKind::Rook, Side::White));
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::Black);
    }

    #[tokio::test]
    async fn test_capture_overwrites_destination() {
        let f = fixture().await;
        f.applier.apply(f.game_id, "e2", "e4").await.unwrap();
        f.applier.apply(f.game_id, "d7", "d5").await.unwrap();
        let outcome = f.applier.apply(f.game_id, "e4", "d5").await.unwrap();

        assert_eq!(outcome.replaced, piece(PieceKind::Pawn, Side::Black));
        let board = f.pieces.find_board(f.game_id).await.unwrap();
        assert_eq!(board.occupied_count(), 31);
        assert_eq!(
            board.occupant("d5".parse().unwrap()),
            piece(PieceKind::Pawn, Side::White)
        );
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::Black);
    }

    #[tokio::test]
    async fn test_empty_source_is_square_not_found() {
        let f = fixture().await;
        let result = f.applier.apply(f.game_id, "e4", "e5").await;
        assert!(matches!(result, Err(StoreError::SquareNotFound { ref square, .. }) if square == "e4"));
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::White);
    }

    #[tokio::test]
    async fn test_off_board_squares() {
        let f = fixture().await;
        assert!(matches!(
            f.applier.apply(f.game_id, "z9", "a3").await,
            Err(StoreError::SquareNotFound { .. })
        ));
        assert!(matches!(
            f.applier.apply(f.game_id, "a1", "a9").await,
            Err(StoreError::SquareNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_square_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.applier.apply(f.game_id, "a1", "a1").await,
            Err(StoreError::SameSquare(_))
        ));
        let board = f.pieces.find_board(f.game_id).await.unwrap();
        assert!(board.agrees_with(&Board::standard()));
    }

    #[tokio::test]
    async fn test_out_of_turn_leaves_state_unchanged() {
        let f = fixture().await;
        let result = f.applier.apply(f.game_id, "e7", "e5").await;
        assert!(matches!(
            result,
            Err(StoreError::TurnConflict {
                expected: Side::White,
                found: Side::Black,
                ..
            })
        ));
        let board = f.pieces.find_board(f.game_id).await.unwrap();
        assert!(board.agrees_with(&Board::standard()));
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::White);
    }

    #[tokio::test]
    async fn test_replayed_move_is_rejected() {
        let f = fixture().await;
        f.applier.apply(f.game_id, "g1", "f3").await.unwrap();
        // A second request from the same side, e.g. a duplicate submission.
        let result = f.applier.apply(f.game_id, "b1", "c3").await;
        assert!(matches!(result, Err(StoreError::TurnConflict { .. })));
        assert!(result.unwrap_err().is_retryable());
        let board = f.pieces.find_board(f.game_id).await.unwrap();
        assert_eq!(board.occupant("b1".parse().unwrap()), piece(PieceKind::Knight, Side::White));
    }

    #[tokio::test]
    async fn test_finished_game_rejects_moves() {
        let f = fixture().await;
        f.games.terminate(f.game_id).await.unwrap();
        assert!(matches!(
            f.applier.apply(f.game_id, "a2", "a3").await,
            Err(StoreError::GameFinished(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_game() {
        let f = fixture().await;
        assert!(matches!(
            f.applier.apply(f.game_id + 100, "a2", "a3").await,
            Err(StoreError::GameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_destination_row_rolls_back() {
        let f = fixture().await;
        sqlx::query("DELETE FROM piece WHERE game_id = ? AND square_file = 'a' AND square_rank = '3'")
            .bind(f.game_id)
            .execute(&f.applier.pool)
            .await
            .unwrap();

        let result = f.applier.apply(f.game_id, "a2", "a3").await;
        assert!(matches!(result, Err(StoreError::SquareNotFound { ref square, .. }) if square == "a3"));
        let a2 = f.pieces.find_piece(f.game_id, "a2").await.unwrap();
        assert_eq!(a2.piece, piece(PieceKind::Pawn, Side::White));
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::White);
    }

    #[tokio::test]
    async fn test_failure_after_destination_write_rolls_back() {
        let f = fixture().await;
        // Fails the clear-source step, after e4 has already been written.
        sqlx::query(
            r#"
            CREATE TRIGGER fail_clear_e2 BEFORE UPDATE ON piece
            WHEN OLD.square_file = 'e' AND OLD.square_rank = '2'
            BEGIN
                SELECT RAISE(ABORT, 'clear source failed');
            END
            "#,
        )
        .execute(&f.applier.pool)
        .await
        .unwrap();

        let result = f.applier.apply(f.game_id, "e2", "e4").await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        let e4 = f.pieces.find_piece(f.game_id, "e4").await.unwrap();
        let e2 = f.pieces.find_piece(f.game_id, "e2").await.unwrap();
        assert_eq!(e4.piece, Piece::BLANK);
        assert_eq!(e2.piece, piece(PieceKind::Pawn, Side::White));
        assert_eq!(f.games.find_by_id(f.game_id).await.unwrap().turn, Side::White);
    }
}
