//! Game assembly and creation.
//!
//! [`GameAssembler`] turns a stored game row into a complete [`Game`]: the
//! decoded board plus both resolved participants. It never hands out a
//! partially resolved game. [`GameService`] creates games, seeding the
//! standard board in the same transaction as the game row.

use chess::{Board, Side};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::persistence::sqlite::{game_repo, piece_repo};
use crate::persistence::traits::{BoardStore, GameRepository, MemberResolver};
use crate::persistence::{GameId, GameRecord, Member, MemberId, NewGame, StoreError};

/// The resolved white and black players of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub white: Member,
    pub black: Member,
}

/// A fully loaded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub turn: Side,
    pub participant: Participant,
    pub board: Board,
}

impl Game {
    pub fn is_finished(&self) -> bool {
        self.turn == Side::None
    }

    pub fn white_id(&self) -> MemberId {
        self.participant.white.id
    }

    pub fn black_id(&self) -> MemberId {
        self.participant.black.id
    }
}

/// Composes game rows, boards and participants into [`Game`] values.
pub struct GameAssembler<G, B, M> {
    games: G,
    boards: B,
    members: M,
}

impl<G, B, M> GameAssembler<G, B, M>
where
    G: GameRepository,
    B: BoardStore,
    M: MemberResolver,
{
    pub fn new(games: G, boards: B, members: M) -> Self {
        Self {
            games,
            boards,
            members,
        }
    }

    pub async fn load(&self, game_id: GameId) -> Result<Game, StoreError> {
        let record = self.games.find_by_id(game_id).await?;
        self.assemble(record).await
    }

    pub async fn load_all(&self) -> Result<Vec<Game>, StoreError> {
        let records = self.games.find_all().await?;
        self.assemble_all(records).await
    }

    /// Finished games the member took part in, fully assembled.
    pub async fn history(&self, member_id: MemberId) -> Result<Vec<Game>, StoreError> {
        let records = self.games.find_completed_by_participant(member_id).await?;
        self.assemble_all(records).await
    }

    async fn assemble_all(&self, records: Vec<GameRecord>) -> Result<Vec<Game>, StoreError> {
        let mut games = Vec::with_capacity(records.len());
        for record in records {
            games.push(self.assemble(record).await?);
        }
        Ok(games)
    }

    async fn assemble(&self, record: GameRecord) -> Result<Game, StoreError> {
        let board = self.boards.load_board(record.id).await?;
        let white = self.resolve(record.white_id).await?;
        let black = self.resolve(record.black_id).await?;
        tracing::debug!(game_id = record.id, "assembled game");

        Ok(Game {
            id: record.id,
            title: record.title,
            password: record.password,
            turn: record.turn,
            participant: Participant { white, black },
            board,
        })
    }

    async fn resolve(&self, member_id: MemberId) -> Result<Member, StoreError> {
        self.members
            .find_by_id(member_id)
            .await?
            .ok_or(StoreError::ParticipantNotFound(member_id))
    }
}

/// Creates games together with their initial board.
pub struct GameService<M> {
    pool: SqlitePool,
    members: M,
}

impl<M: MemberResolver> GameService<M> {
    pub fn new(pool: SqlitePool, members: M) -> Self {
        Self { pool, members }
    }

    /// Insert a game with white to move and the standard layout.
    ///
    /// Both participants must resolve first; the game row and its 64 piece
    /// rows are then written in one transaction.
    pub async fn create_game(&self, game: &NewGame) -> Result<GameId, StoreError> {
        for member_id in [game.white_id, game.black_id] {
            if self.members.find_by_id(member_id).await?.is_none() {
                return Err(StoreError::ParticipantNotFound(member_id));
            }
        }

        let mut tx = self.pool.begin().await?;
        let game_id = game_repo::insert_game(&mut tx, game).await?;
        piece_repo::rewrite_board(&mut tx, game_id, &Board::standard()).await?;
        tx.commit().await?;

        tracing::info!(game_id, title = %game.title, white = game.white_id, black = game.black_id, "created game");
        Ok(game_id)
    }
}
