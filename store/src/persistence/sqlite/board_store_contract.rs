//! One set of [`BoardStore`] checks, run against both storage schemes.

use chess::{Board, Piece, PieceKind, Side, Square};

use super::{Database, SqliteCompactBoardRepository, SqliteGameRepository, SqlitePieceRepository};
use crate::persistence::traits::{BoardStore, GameRepository};
use crate::persistence::{GameId, NewGame, StoreError};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn sparse_board() -> Board {
    let mut board = Board::new();
    board.place(sq("e1"), Piece::new(PieceKind::King, Side::White).unwrap());
    board.place(sq("e8"), Piece::new(PieceKind::King, Side::Black).unwrap());
    board.place(sq("a7"), Piece::new(PieceKind::Pawn, Side::White).unwrap());
    board
}

async fn seeded_game(db: &Database) -> GameId {
    SqliteGameRepository::new(db.pool().clone())
        .create(&NewGame {
            title: "contract".to_string(),
            password: String::new(),
            white_id: 1,
            black_id: 2,
        })
        .await
        .unwrap()
}

async fn check_contract<S: BoardStore>(store: &S, game_id: GameId) {
    assert!(matches!(
        store.load_board(game_id).await,
        Err(StoreError::BoardNotFound(id)) if id == game_id
    ));

    store.save_board(game_id, &Board::standard()).await.unwrap();
    let loaded = store.load_board(game_id).await.unwrap();
    assert!(loaded.agrees_with(&Board::standard()));
    assert_eq!(loaded.occupied_count(), 32);

    // A rewrite replaces the previous board entirely.
    let sparse = sparse_board();
    store.save_board(game_id, &sparse).await.unwrap();
    let loaded = store.load_board(game_id).await.unwrap();
    assert!(loaded.agrees_with(&sparse));
    assert_eq!(loaded.occupied_count(), 3);
    assert_eq!(loaded.occupant(sq("a1")), Piece::BLANK);

    store.delete_board(game_id).await.unwrap();
    assert!(matches!(
        store.load_board(game_id).await,
        Err(StoreError::BoardNotFound(_))
    ));
}

#[tokio::test]
async fn normalized_store_honours_contract() {
    let db = Database::new_in_memory().await.unwrap();
    let game_id = seeded_game(&db).await;
    check_contract(&SqlitePieceRepository::new(db.pool().clone()), game_id).await;
}

#[tokio::test]
async fn compact_store_honours_contract() {
    let db = Database::new_in_memory().await.unwrap();
    let game_id = seeded_game(&db).await;
    check_contract(&SqliteCompactBoardRepository::new(db.pool().clone()), game_id).await;
}

#[tokio::test]
async fn schemes_agree_on_the_same_board() {
    let db = Database::new_in_memory().await.unwrap();
    let game_id = seeded_game(&db).await;
    let normalized = SqlitePieceRepository::new(db.pool().clone());
    let compact = SqliteCompactBoardRepository::new(db.pool().clone());

    let board = sparse_board();
    normalized.save_board(game_id, &board).await.unwrap();
    compact.save_board(game_id, &board).await.unwrap();

    let from_rows = normalized.load_board(game_id).await.unwrap();
    let from_lists = compact.load_board(game_id).await.unwrap();
    assert_eq!(from_rows.len(), 64);
    assert_eq!(from_lists.len(), 3);
    assert!(from_rows.agrees_with(&from_lists));
}
