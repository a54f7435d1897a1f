//! Configuration for the chess store.
//!
//! Handles database location with the following precedence:
//! 1. CHESS_STORE_DB_PATH environment variable
//! 2. `games.db` inside the data directory, which is
//!    CHESS_STORE_DATA_DIR, else ~/.config/chess-store/data, else ./data

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/chess-store/data";
const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "games.db";

/// Default pool size for file-backed databases.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Get the data directory for persistence.
///
/// Priority:
/// 1. CHESS_STORE_DATA_DIR env variable if set
/// 2. $HOME/.config/chess-store/data if HOME is set
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESS_STORE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database file path.
///
/// Priority:
/// 1. CHESS_STORE_DB_PATH env variable if set
/// 2. `<data dir>/games.db`
pub fn get_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHESS_STORE_DB_PATH") {
        return PathBuf::from(path);
    }

    get_data_dir().join(DATABASE_FILE)
}

/// Get the connection pool size.
///
/// Reads CHESS_STORE_MAX_CONNECTIONS, falling back to 5 if it is unset or
/// cannot be parsed as a `u32`.
pub fn get_max_connections() -> u32 {
    std::env::var("CHESS_STORE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}
