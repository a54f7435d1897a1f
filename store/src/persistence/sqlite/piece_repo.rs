//! SQLite-backed Piece Store: one row per square per game.
//!
//! The query functions take a bare `SqliteConnection` so that the move
//! applier and game creation can run them inside their own transaction;
//! [`SqlitePieceRepository`] wraps them with a pooled connection.

use chess::serializer::{self, PieceRow};
use chess::{codec, Board, Piece, PlacedPiece, Square};
use sqlx::{SqliteConnection, SqlitePool};

use crate::persistence::traits::{BoardStore, PieceRepository};
use crate::persistence::{GameId, StoreError};

/// Row type for piece queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct PieceRecord {
    square_file: String,
    square_rank: String,
    team: String,
    piece_type: String,
}

impl From<PieceRecord> for PieceRow {
    fn from(r: PieceRecord) -> Self {
        Self {
            square_file: r.square_file,
            square_rank: r.square_rank,
            team: r.team,
            piece_type: r.piece_type,
        }
    }
}

/// SQLite implementation of [`PieceRepository`] and [`BoardStore`].
#[derive(Clone)]
pub struct SqlitePieceRepository {
    pool: SqlitePool,
}

impl SqlitePieceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PieceRepository for SqlitePieceRepository {
    async fn save(&self, game_id: GameId, piece: PlacedPiece) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        upsert_row(&mut conn, game_id, &PieceRow::from(piece)).await
    }

    async fn delete_all(&self, game_id: GameId) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        delete_rows(&mut conn, game_id).await
    }

    async fn find_board(&self, game_id: GameId) -> Result<Board, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_board(&mut conn, game_id).await
    }

    async fn find_piece(&self, game_id: GameId, square: &str) -> Result<PlacedPiece, StoreError> {
        let not_found = || StoreError::SquareNotFound {
            game_id,
            square: square.to_string(),
        };
        let sq: Square = square.parse().map_err(|_| not_found())?;
        let mut conn = self.pool.acquire().await?;
        fetch_piece(&mut conn, game_id, sq)
            .await?
            .ok_or_else(not_found)
    }

    async fn update_square(
        &self,
        game_id: GameId,
        square: Square,
        piece: Piece,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        set_occupant(&mut conn, game_id, square, piece).await
    }
}

impl BoardStore for SqlitePieceRepository {
    async fn save_board(&self, game_id: GameId, board: &Board) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        rewrite_board(&mut tx, game_id, board).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_board(&self, game_id: GameId) -> Result<Board, StoreError> {
        self.find_board(game_id).await
    }

    async fn delete_board(&self, game_id: GameId) -> Result<(), StoreError> {
        self.delete_all(game_id).await?;
        Ok(())
    }
}

// ── Transaction-scoped queries ─────────────────────────────────────────

/// Insert a row, overwriting the occupant if the square already has one.
pub(crate) async fn upsert_row(
    conn: &mut SqliteConnection,
    game_id: GameId,
    row: &PieceRow,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO piece (game_id, square_file, square_rank, team, piece_type)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (game_id, square_file, square_rank)
        DO UPDATE SET team = excluded.team, piece_type = excluded.piece_type
        "#,
    )
    .bind(game_id)
    .bind(&row.square_file)
    .bind(&row.square_rank)
    .bind(&row.team)
    .bind(&row.piece_type)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_rows(
    conn: &mut SqliteConnection,
    game_id: GameId,
) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM piece WHERE game_id = ?")
        .bind(game_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Delete every row of the game and write one row per square of `board`.
pub(crate) async fn rewrite_board(
    conn: &mut SqliteConnection,
    game_id: GameId,
    board: &Board,
) -> Result<(), StoreError> {
    delete_rows(conn, game_id).await?;
    for row in serializer::encode_normalized(board) {
        upsert_row(conn, game_id, &row).await?;
    }
    tracing::debug!(game_id, occupied = board.occupied_count(), "rewrote board");
    Ok(())
}

pub(crate) async fn fetch_board(
    conn: &mut SqliteConnection,
    game_id: GameId,
) -> Result<Board, StoreError> {
    let records: Vec<PieceRecord> = sqlx::query_as(
        r#"
        SELECT square_file, square_rank, team, piece_type
        FROM piece
        WHERE game_id = ?
        "#,
    )
    .bind(game_id)
    .fetch_all(&mut *conn)
    .await?;

    if records.is_empty() {
        return Err(StoreError::BoardNotFound(game_id));
    }

    let rows: Vec<PieceRow> = records.into_iter().map(PieceRow::from).collect();
    tracing::debug!(game_id, rows = rows.len(), "loaded board rows");
    Ok(serializer::decode_normalized(&rows)?)
}

pub(crate) async fn fetch_piece(
    conn: &mut SqliteConnection,
    game_id: GameId,
    square: Square,
) -> Result<Option<PlacedPiece>, StoreError> {
    let (file, rank) = codec::encode_square(square);
    let record: Option<PieceRecord> = sqlx::query_as(
        r#"
        SELECT square_file, square_rank, team, piece_type
        FROM piece
        WHERE game_id = ? AND square_file = ? AND square_rank = ?
        "#,
    )
    .bind(game_id)
    .bind(file)
    .bind(rank)
    .fetch_optional(&mut *conn)
    .await?;

    match record {
        None => Ok(None),
        Some(r) => Ok(Some(PieceRow::from(r).decode()?)),
    }
}

/// Overwrite the occupant of one square. Anything other than exactly one
/// affected row means the seed rows are missing or the key is not unique.
pub(crate) async fn set_occupant(
    conn: &mut SqliteConnection,
    game_id: GameId,
    square: Square,
    piece: Piece,
) -> Result<(), StoreError> {
    let (file, rank) = codec::encode_square(square);
    let result = sqlx::query(
        r#"
        UPDATE piece
        SET piece_type = ?, team = ?
        WHERE game_id = ? AND square_file = ? AND square_rank = ?
        "#,
    )
    .bind(codec::encode_piece_kind(piece.kind()))
    .bind(codec::encode_side(piece.side()))
    .bind(game_id)
    .bind(file)
    .bind(rank)
    .execute(&mut *conn)
    .await?;

    match result.rows_affected() {
        1 => Ok(()),
        rows => {
            tracing::warn!(game_id, %square, rows, "square update did not hit exactly one row");
            Err(StoreError::InvariantViolation {
                target: format!("game {game_id} square {square}"),
                rows,
            })
        }
    }
}
