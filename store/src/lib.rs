//! Durable board state for two-player games on SQLite.
//!
//! - [`persistence`]: repository traits and their SQLite implementations
//!   (normalized piece rows, compact board lists, game rows, members).
//! - [`moves`]: atomic move application with an optimistic turn check.
//! - [`assembly`]: game creation and loading of fully resolved games.

pub mod assembly;
pub mod config;
pub mod moves;
pub mod persistence;


pub use assembly::{Game, GameAssembler, GameService, Participant};
pub use moves::{MoveApplier, MoveOutcome};
pub use persistence::{GameId, GameRecord, Member, MemberId, NewGame, StoreError};
