//! Persistence layer: repository traits, record types and the SQLite backend.

pub mod sqlite;
pub mod traits;

mod members;

pub use members::InMemoryMemberResolver;

use chess::{CodecError, Side};
use serde::{Deserialize, Serialize};

/// Generated identifier of a game row.
pub type GameId = i64;

/// Identifier of a participant, owned by account management.
pub type MemberId = i64;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("no square {square:?} in game {game_id}")]
    SquareNotFound { game_id: GameId, square: String },
    #[error("no board stored for game {0}")]
    BoardNotFound(GameId),
    #[error("no board stored for room {0:?}")]
    RoomNotFound(String),
    #[error("participant {0} could not be resolved")]
    ParticipantNotFound(MemberId),
    #[error("update of {target} affected {rows} rows, expected exactly 1")]
    InvariantViolation { target: String, rows: u64 },
    #[error("game {game_id}: {found} cannot move while the turn is {expected}")]
    TurnConflict {
        game_id: GameId,
        expected: Side,
        found: Side,
    },
    #[error("game {0} is finished")]
    GameFinished(GameId),
    #[error("move from {0} to itself")]
    SameSquare(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether the same request could succeed if the caller tried again.
    ///
    /// Only lost turn races and transient lock contention qualify. Nothing in
    /// this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TurnConflict { .. } => true,
            Self::Database(sqlx::Error::PoolTimedOut) => true,
            Self::Database(sqlx::Error::Database(e)) => {
                // SQLITE_BUSY / SQLITE_LOCKED and their extended codes
                matches!(e.code().as_deref(), Some("5" | "6" | "261" | "262" | "517"))
            }
            _ => false,
        }
    }

    /// Whether the error signals corrupt or inconsistent stored state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ParticipantNotFound(_)
                | Self::Codec(_)
                | Self::InvariantViolation { .. }
                | Self::Migration(_)
        )
    }
}

/// A game row as stored, with participants as bare ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    pub id: GameId,
    pub title: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub turn: Side,
    pub white_id: MemberId,
    pub black_id: MemberId,
}

impl GameRecord {
    /// A game is finished once nobody is to move.
    pub fn is_finished(&self) -> bool {
        self.turn == Side::None
    }

    pub fn has_participant(&self, member_id: MemberId) -> bool {
        self.white_id == member_id || self.black_id == member_id
    }
}

/// Fields needed to insert a new game row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGame {
    pub title: String,
    pub password: String,
    pub white_id: MemberId,
    pub black_id: MemberId,
}

/// A resolved player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}
