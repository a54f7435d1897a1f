//! SQLite-backed repository for game metadata rows.

use chess::{codec, Side};
use sqlx::{SqliteConnection, SqlitePool};

use super::{piece_repo, room_for_game};
use crate::persistence::traits::GameRepository;
use crate::persistence::{GameId, GameRecord, MemberId, NewGame, StoreError};

/// Row type for game queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct GameRow {
    id: i64,
    title: String,
    password: String,
    turn: String,
    white_member_id: i64,
    black_member_id: i64,
}

impl TryFrom<GameRow> for GameRecord {
    type Error = StoreError;

    fn try_from(r: GameRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            title: r.title,
            password: r.password,
            turn: codec::decode_side(&r.turn)?,
            white_id: r.white_member_id,
            black_id: r.black_member_id,
        })
    }
}

/// SQLite implementation of [`GameRepository`].
#[derive(Clone)]
pub struct SqliteGameRepository {
    pool: SqlitePool,
}

impl SqliteGameRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl GameRepository for SqliteGameRepository {
    async fn create(&self, game: &NewGame) -> Result<GameId, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_game(&mut conn, game).await
    }

    async fn find_by_id(&self, id: GameId) -> Result<GameRecord, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_game(&mut conn, id)
            .await?
            .ok_or(StoreError::GameNotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<GameRecord>, StoreError> {
        let rows: Vec<GameRow> = sqlx::query_as(
            r#"
            SELECT id, title, password, turn, white_member_id, black_member_id
            FROM game
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(count = rows.len(), "loaded games");
        rows.into_iter().map(GameRecord::try_from).collect()
    }

    async fn find_completed_by_participant(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<GameRecord>, StoreError> {
        let games = self.find_all().await?;
        Ok(games
            .into_iter()
            .filter(GameRecord::is_finished)
            .filter(|game| game.has_participant(member_id))
            .collect())
    }

    async fn update_turn(&self, id: GameId, turn: Side) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        match set_turn(&mut conn, id, turn).await? {
            0 => Err(StoreError::GameNotFound(id)),
            _ => Ok(()),
        }
    }

    async fn terminate(&self, id: GameId) -> Result<(), StoreError> {
        self.update_turn(id, Side::None).await?;
        tracing::info!(game_id = id, "terminated game");
        Ok(())
    }

    async fn delete(&self, id: GameId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let pieces = piece_repo::delete_rows(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM game WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::GameNotFound(id));
        }
        // A compact board may exist for the game as well.
        let rooms = sqlx::query("DELETE FROM board WHERE room_name = ?")
            .bind(room_for_game(id))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        tracing::info!(game_id = id, pieces, rooms, "deleted game");
        Ok(())
    }
}

// ── Transaction-scoped queries ─────────────────────────────────────────

/// Insert a game row with white to move and return its generated id.
pub(crate) async fn insert_game(
    conn: &mut SqliteConnection,
    game: &NewGame,
) -> Result<GameId, StoreError> {
    let result = sqlx::query(
        r#"
        INSERT INTO game (title, password, turn, white_member_id, black_member_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&game.title)
    .bind(&game.password)
    .bind(codec::encode_side(Side::White))
    .bind(game.white_id)
    .bind(game.black_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub(crate) async fn fetch_game(
    conn: &mut SqliteConnection,
    id: GameId,
) -> Result<Option<GameRecord>, StoreError> {
    let row: Option<GameRow> = sqlx::query_as(
        r#"
        SELECT id, title, password, turn, white_member_id, black_member_id
        FROM game
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(GameRecord::try_from).transpose()
}

/// Unconditional turn write; returns the number of rows touched.
pub(crate) async fn set_turn(
    conn: &mut SqliteConnection,
    id: GameId,
    turn: Side,
) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE game SET turn = ? WHERE id = ?")
        .bind(codec::encode_side(turn))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Compare-and-swap on the turn column: only writes `next` while the stored
/// turn is still `expected`. Returns the number of rows touched.
pub(crate) async fn swap_turn(
    conn: &mut SqliteConnection,
    id: GameId,
    expected: Side,
    next: Side,
) -> Result<u64, StoreError> {
    let result = sqlx::query("UPDATE game SET turn = ? WHERE id = ? AND turn = ?")
        .bind(codec::encode_side(next))
        .bind(id)
        .bind(codec::encode_side(expected))
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
