//! emotag-server - batch sentence emotion tagging service
//!
//! Worker processes share one database: the sentence cache keeps any
//! normalized sentence from being inferred twice across the fleet, and the
//! init lock keeps concurrent cold starts from downloading the lexicon
//! artifact over each other.

use anyhow::Result;
use clap::Parser;
use emotag_common::config::{self, LEXICON_FILENAME};
use emotag_common::db::{init_database, InitLock, SentenceCache};
use emotag_server::init::EngineInitializer;
use emotag_server::{build_router, AppState};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "emotag-server", version, about = "Batch sentence emotion tagging service")]
struct Args {
    /// Root folder holding the shared database and fetched artifacts
    #[arg(long)]
    root_folder: Option<String>,

    /// URL of the emotion lexicon artifact
    #[arg(long, env = "EMOTAG_LEXICON_URL")]
    lexicon_url: String,

    /// Address to bind the HTTP server on
    #[arg(long, env = "EMOTAG_BIND", default_value = "127.0.0.1:5730")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting emotag-server v{}", env!("CARGO_PKG_VERSION"));

    // Resolve root folder and open the shared database
    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), "EMOTAG_ROOT")?;
    let db_path = config::prepare_root_folder(&root_folder)?;
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("Connected to database");

    // The engine is built lazily on the first tagging request; the lock
    // and artifact location are wired up front
    let lock = InitLock::new(pool.clone());
    let engine = EngineInitializer::new(
        lock,
        args.lexicon_url,
        root_folder.join(LEXICON_FILENAME),
    );

    let state = AppState::new(SentenceCache::new(pool), engine);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!("emotag-server listening on http://{}", args.bind);
    info!("Health check: http://{}/health", args.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
