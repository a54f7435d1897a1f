//! Admin CLI for the chess store.
//!
//! Operates directly on the SQLite database: seed members, create games,
//! apply moves, inspect and terminate games. Output of read commands is JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tracing_subscriber::fmt::format::FmtSpan;

use chess_store::config;
use chess_store::persistence::sqlite::{
    Database, SqliteGameRepository, SqliteMemberRepository, SqlitePieceRepository,
};
use chess_store::persistence::traits::GameRepository;
use chess_store::{GameAssembler, GameService, Member, MoveApplier, NewGame, StoreError};

#[derive(Parser)]
#[command(name = "chess-store", about = "Inspect and mutate stored chess games")]
struct Cli {
    /// Database file. Defaults to CHESS_STORE_DB_PATH or the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the member lookup table.
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },
    /// Create a game with the standard layout and white to move.
    New {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long)]
        white: i64,
        #[arg(long)]
        black: i64,
    },
    /// Move the piece on FROM to TO and pass the turn.
    Move { game: i64, from: String, to: String },
    /// Print one game as JSON.
    Show { game: i64 },
    /// Print every game as JSON.
    List,
    /// Print the finished games of a member as JSON.
    History { member: i64 },
    /// Mark a game as finished.
    Terminate { game: i64 },
    /// Delete a game and its board.
    Delete { game: i64 },
}

#[derive(Subcommand)]
enum MemberAction {
    /// Insert or rename a member.
    Add { id: i64, name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(config::get_database_path);
    tracing::info!("Using database: {}", db_path.display());

    let db = Database::open(&db_path, config::get_max_connections())
        .await
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let pool = db.pool().clone();

    if let Err(err) = run(cli.command, pool).await {
        if let Some(store_err) = err.downcast_ref::<StoreError>() {
            report(store_err);
        }
        return Err(err);
    }
    Ok(())
}

async fn run(command: Commands, pool: SqlitePool) -> anyhow::Result<()> {
    let members = SqliteMemberRepository::new(pool.clone());
    let games = SqliteGameRepository::new(pool.clone());
    let assembler = GameAssembler::new(
        games.clone(),
        SqlitePieceRepository::new(pool.clone()),
        members.clone(),
    );

    match command {
        Commands::Member {
            action: MemberAction::Add { id, name },
        } => {
            members.save(&Member { id, name }).await?;
        }
        Commands::New {
            title,
            password,
            white,
            black,
        } => {
            let service = GameService::new(pool.clone(), members.clone());
            let id = service
                .create_game(&NewGame {
                    title,
                    password,
                    white_id: white,
                    black_id: black,
                })
                .await?;
            println!("{id}");
        }
        Commands::Move { game, from, to } => {
            let outcome = MoveApplier::new(pool.clone()).apply(game, &from, &to).await?;
            println!("{} to move", outcome.next_turn);
        }
        Commands::Show { game } => {
            let game = assembler.load(game).await?;
            println!("{}", serde_json::to_string_pretty(&game)?);
        }
        Commands::List => {
            let all = assembler.load_all().await?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        Commands::History { member } => {
            let history = assembler.history(member).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Commands::Terminate { game } => {
            games.terminate(game).await?;
        }
        Commands::Delete { game } => {
            games.delete(game).await?;
        }
    }

    Ok(())
}

/// Log how a failed command should be treated before it is printed.
fn report(err: &StoreError) {
    if err.is_fatal() {
        tracing::error!(error = %err, "stored data is inconsistent; not retrying");
    } else if err.is_retryable() {
        tracing::warn!(error = %err, "command lost a race or hit a busy database; it can be retried");
    }
}
