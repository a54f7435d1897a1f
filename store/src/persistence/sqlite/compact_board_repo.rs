//! SQLite-backed compact board store: one row per room holding two parallel
//! comma-delimited lists (occupied squares and piece codes).
//!
//! Rooms are keyed by name. Every change rewrites the whole row; there is no
//! per-square update. When used as a [`BoardStore`], a game id maps to the
//! room name returned by [`room_for_game`].

use chess::serializer;
use chess::{codec, Board, CodecError, Side, LABEL_TABLE_VERSION};
use sqlx::SqlitePool;

use crate::persistence::traits::BoardStore;
use crate::persistence::{GameId, StoreError};

#[derive(sqlx::FromRow)]
struct CompactRow {
    position: String,
    piece_name: String,
    codec_version: i64,
}

impl CompactRow {
    fn decode(&self) -> Result<Board, CodecError> {
        if self.codec_version != i64::from(LABEL_TABLE_VERSION) {
            return Err(CodecError::MalformedRecord {
                field: "codec_version",
                value: self.codec_version.to_string(),
            });
        }
        serializer::decode_compact(&self.position, &self.piece_name)
    }
}

/// Room name used when a game's board is kept in the compact table.
pub fn room_for_game(game_id: GameId) -> String {
    format!("game-{game_id}")
}

/// SQLite implementation of the compact board scheme.
#[derive(Clone)]
pub struct SqliteCompactBoardRepository {
    pool: SqlitePool,
}

impl SqliteCompactBoardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Return the room's board, creating it with the standard layout and
    /// white to move if the room does not exist yet.
    pub async fn init_board(&self, room: &str) -> Result<Board, StoreError> {
        let board = Board::standard();
        let compact = serializer::encode_compact(&board);
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO board (room_name, position, piece_name, turn, codec_version)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(room)
        .bind(&compact.squares)
        .bind(&compact.pieces)
        .bind(codec::encode_side(Side::White))
        .bind(i64::from(LABEL_TABLE_VERSION))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::info!(room, "created room with standard board");
            return Ok(board);
        }
        self.find_board(room)
            .await?
            .ok_or_else(|| StoreError::RoomNotFound(room.to_string()))
    }

    /// Rewrite the room's board and turn.
    pub async fn update_board(&self, room: &str, board: &Board, turn: Side) -> Result<(), StoreError> {
        let compact = serializer::encode_compact(board);
        let result = sqlx::query(
            r#"
            UPDATE board
            SET position = ?, piece_name = ?, turn = ?, codec_version = ?
            WHERE room_name = ?
            "#,
        )
        .bind(&compact.squares)
        .bind(&compact.pieces)
        .bind(codec::encode_side(turn))
        .bind(i64::from(LABEL_TABLE_VERSION))
        .bind(room)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RoomNotFound(room.to_string()));
        }
        Ok(())
    }

    pub async fn find_board(&self, room: &str) -> Result<Option<Board>, StoreError> {
        let row: Option<CompactRow> = sqlx::query_as(
            "SELECT position, piece_name, codec_version FROM board WHERE room_name = ?",
        )
        .bind(room)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(r) => Ok(Some(r.decode()?)),
        }
    }

    pub async fn find_turn(&self, room: &str) -> Result<Option<Side>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT turn FROM board WHERE room_name = ?")
            .bind(room)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(None),
            Some((turn,)) => Ok(Some(codec::decode_side(&turn)?)),
        }
    }

    pub async fn exists(&self, room: &str) -> Result<bool, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM board WHERE room_name = ?")
            .bind(room)
            .fetch_one(&self.pool)
            .await?;
        Ok(count != 0)
    }

    /// All room names, sorted.
    pub async fn rooms(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT room_name FROM board ORDER BY room_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn delete_room(&self, room: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM board WHERE room_name = ?")
            .bind(room)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl BoardStore for SqliteCompactBoardRepository {
    async fn save_board(&self, game_id: GameId, board: &Board) -> Result<(), StoreError> {
        let compact = serializer::encode_compact(board);
        // New rooms start with white to move; an existing room keeps its turn.
        sqlx::query(
            r#"
            INSERT INTO board (room_name, position, piece_name, turn, codec_version)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (room_name) DO UPDATE SET
                position = excluded.position,
                piece_name = excluded.piece_name,
                codec_version = excluded.codec_version
            "#,
        )
        .bind(room_for_game(game_id))
        .bind(&compact.squares)
        .bind(&compact.pieces)
        .bind(codec::encode_side(Side::White))
        .bind(i64::from(LABEL_TABLE_VERSION))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_board(&self, game_id: GameId) -> Result<Board, StoreError> {
        self.find_board(&room_for_game(game_id))
            .await?
            .ok_or(StoreError::BoardNotFound(game_id))
    }

    async fn delete_board(&self, game_id: GameId) -> Result<(), StoreError> {
        self.delete_room(&room_for_game(game_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;
    use chess::{Piece, PieceKind, Square};

    async fn test_db() -> (Database, SqliteCompactBoardRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteCompactBoardRepository::new(db.pool().clone());
        (db, repo)
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_init_board_creates_once() {
        let (_db, repo) = test_db().await;
        let board = repo.init_board("lobby").await.unwrap();
        assert_eq!(board, Board::standard());
        assert_eq!(repo.find_turn("lobby").await.unwrap(), Some(Side::White));

        let mut moved = board.clone();
        let pawn = moved.remove(sq("e2")).unwrap();
        moved.place(sq("e4"), pawn);
        repo.update_board("lobby", &moved, Side::Black).await.unwrap();

        // A second init returns the stored board, not a fresh one.
        let again = repo.init_board("lobby").await.unwrap();
        assert_eq!(again, moved);
        assert_eq!(repo.find_turn("lobby").await.unwrap(), Some(Side::Black));
    }

    #[tokio::test]
    async fn test_compact_row_holds_occupied_squares_only() {
        let (db, repo) = test_db().await;
        repo.init_board("lobby").await.unwrap();
        let (position, piece_name): (String, String) =
            sqlx::query_as("SELECT position, piece_name FROM board WHERE room_name = 'lobby'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(position.split(',').count(), 32);
        assert_eq!(piece_name.split(',').count(), 32);
        assert!(position.starts_with("a1,b1"));
        assert!(piece_name.starts_with("WR,WN"));
    }

    #[tokio::test]
    async fn test_missing_room() {
        let (_db, repo) = test_db().await;
        assert_eq!(repo.find_board("nowhere").await.unwrap(), None);
        assert_eq!(repo.find_turn("nowhere").await.unwrap(), None);
        assert!(!repo.exists("nowhere").await.unwrap());
        assert!(matches!(
            repo.update_board("nowhere", &Board::standard(), Side::White).await,
            Err(StoreError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rooms_and_delete() {
        let (_db, repo) = test_db().await;
        repo.init_board("beta").await.unwrap();
        repo.init_board("alpha").await.unwrap();
        assert!(repo.exists("alpha").await.unwrap());
        assert_eq!(repo.rooms().await.unwrap(), vec!["alpha", "beta"]);

        repo.delete_room("alpha").await.unwrap();
        assert_eq!(repo.rooms().await.unwrap(), vec!["beta"]);
        assert!(!repo.exists("alpha").await.unwrap());
    }

    #[tokio::test]
    async fn test_arity_mismatch_in_stored_row() {
        let (db, repo) = test_db().await;
        sqlx::query(
            "INSERT INTO board (room_name, position, piece_name, turn, codec_version) \
             VALUES ('broken', 'a1,b1,c1', 'WR,WN', 'WHITE', 1)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = repo.find_board("broken").await;
        assert!(matches!(
            result,
            Err(StoreError::Codec(CodecError::ArityMismatch { squares: 3, pieces: 2 }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_codec_version() {
        let (db, repo) = test_db().await;
        sqlx::query(
            "INSERT INTO board (room_name, position, piece_name, turn, codec_version) \
             VALUES ('future', 'a1', 'WR', 'WHITE', 99)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let result = repo.find_board("future").await;
        assert!(matches!(
            result,
            Err(StoreError::Codec(CodecError::MalformedRecord { field: "codec_version", .. }))
        ));
    }

    #[tokio::test]
    async fn test_board_store_keeps_turn_on_rewrite() {
        let (_db, repo) = test_db().await;
        let room = room_for_game(7);
        repo.init_board(&room).await.unwrap();
        repo.update_board(&room, &Board::standard(), Side::Black)
            .await
            .unwrap();

        let mut board = Board::new();
        board.place(sq("d4"), Piece::new(PieceKind::Queen, Side::Black).unwrap());
        repo.save_board(7, &board).await.unwrap();

        assert_eq!(repo.load_board(7).await.unwrap(), board);
        assert_eq!(repo.find_turn(&room).await.unwrap(), Some(Side::Black));
    }
}
