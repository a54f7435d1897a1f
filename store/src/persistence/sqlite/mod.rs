//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: allows one writer and multiple concurrent readers.
//! - **Foreign keys enabled**: piece rows are removed with their game.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_initial_schema.sql`
//!   automatically when [`Database::open`] is called. The schema is idempotent.
//!
//! ## Repository types
//!
//! Each `Sqlite*Repository` holds a `SqlitePool` and implements the
//! corresponding trait from [`crate::persistence::traits`]:
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqlitePieceRepository`] | `PieceRepository`, `BoardStore` |
//! | [`SqliteCompactBoardRepository`] | `BoardStore` |
//! | [`SqliteGameRepository`] | `GameRepository` |
//! | [`SqliteMemberRepository`] | `MemberResolver` |
//!
//! Enum columns (turn, team, piece type) are stored as `TEXT` and
//! round-tripped through the label tables in `chess::codec`.
//!
//! The piece and game modules also expose connection-level query functions
//! to the rest of the crate, so multi-step operations can share one
//! transaction.

mod compact_board_repo;
mod database;
pub(crate) mod game_repo;
mod member_repo;
pub(crate) mod piece_repo;
#[cfg(test)]
mod board_store_contract;

pub use compact_board_repo::{room_for_game, SqliteCompactBoardRepository};
pub use database::Database;
pub use game_repo::SqliteGameRepository;
pub use member_repo::SqliteMemberRepository;
pub use piece_repo::SqlitePieceRepository;
